use crate::domain::contract::Contract;
use crate::domain::job::Job;
use crate::domain::money::Balance;
use crate::domain::ports::LedgerStore;
use crate::domain::profile::Profile;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

/// Initial ledger contents, read from JSON.
///
/// ```json
/// { "profiles": [...], "contracts": [...], "jobs": [...] }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct LedgerSeed {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl LedgerSeed {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    /// Inserts every record into `store`. Contracts go in before jobs so each
    /// job is counted against its client's obligations.
    ///
    /// Nothing is inserted if any profile starts with a negative balance.
    pub async fn load_into(self, store: &dyn LedgerStore) -> Result<()> {
        if let Some(profile) = self.profiles.iter().find(|p| p.balance < Balance::ZERO) {
            return Err(LedgerError::ValidationError(format!(
                "profile {} has a negative balance",
                profile.id
            )));
        }

        let profiles = self.profiles.len();
        let contracts = self.contracts.len();
        let jobs = self.jobs.len();
        for profile in self.profiles {
            store.insert_profile(profile).await?;
        }
        for contract in self.contracts {
            store.insert_contract(contract).await?;
        }
        for job in self.jobs {
            store.insert_job(job).await?;
        }
        tracing::info!(profiles, contracts, jobs, "ledger seeded");
        Ok(())
    }
}
