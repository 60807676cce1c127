use super::staging::{
    Obligations, ReadSet, RowKey, StagedTransaction, Versioned, VersionedRows, WriteSet, validate,
};
use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId};
use crate::domain::ports::{LedgerStore, LedgerTransactionBox};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerTables {
    profiles: HashMap<ProfileId, Versioned<Profile>>,
    contracts: HashMap<ContractId, Contract>,
    jobs: HashMap<JobId, Versioned<Job>>,
    obligations: HashMap<ProfileId, u64>,
}

impl LedgerTables {
    fn version_of(&self, key: &RowKey) -> u64 {
        match key {
            RowKey::Profile(id) => self.profiles.get(id).map_or(0, |row| row.version),
            RowKey::Job(id) => self.jobs.get(id).map_or(0, |row| row.version),
            RowKey::Obligations(id) => self.obligations.get(id).copied().unwrap_or(0),
        }
    }

    fn put_profile(&mut self, profile: Profile) {
        match self.profiles.get_mut(&profile.id) {
            Some(row) => row.replace(profile),
            None => {
                self.profiles.insert(profile.id, Versioned::first(profile));
            }
        }
    }

    /// A contract decides which client its jobs count against, so both the
    /// new and any replaced client see their obligations move.
    fn put_contract(&mut self, contract: Contract) {
        if let Some(previous) = self.contracts.insert(contract.id, contract.clone())
            && previous.client_id != contract.client_id
        {
            self.bump_obligations(previous.client_id);
        }
        self.bump_obligations(contract.client_id);
    }

    fn bump_obligations(&mut self, client_id: ProfileId) {
        *self.obligations.entry(client_id).or_default() += 1;
    }

    fn put_job(&mut self, job: Job) {
        if let Some(client_id) = self.contracts.get(&job.contract_id).map(|c| c.client_id) {
            self.bump_obligations(client_id);
        }
        match self.jobs.get_mut(&job.id) {
            Some(row) => row.replace(job),
            None => {
                self.jobs.insert(job.id, Versioned::first(job));
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryRows {
    tables: RwLock<LedgerTables>,
}

#[async_trait]
impl VersionedRows for InMemoryRows {
    async fn profile(&self, id: ProfileId) -> Result<Option<Versioned<Profile>>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&id).cloned())
    }

    async fn job(&self, id: JobId) -> Result<Option<Versioned<Job>>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.get(&id).cloned())
    }

    async fn contract(&self, id: ContractId) -> Result<Option<Contract>> {
        let tables = self.tables.read().await;
        Ok(tables.contracts.get(&id).cloned())
    }

    async fn obligations(&self, client_id: ProfileId) -> Result<Obligations> {
        let tables = self.tables.read().await;
        let jobs = tables
            .jobs
            .values()
            .filter(|row| {
                tables
                    .contracts
                    .get(&row.record.contract_id)
                    .is_some_and(|contract| contract.is_client(client_id))
            })
            .map(|row| row.record.clone())
            .collect();
        Ok(Obligations {
            version: tables.version_of(&RowKey::Obligations(client_id)),
            jobs,
        })
    }

    async fn apply(&self, reads: &ReadSet, writes: WriteSet) -> Result<()> {
        let mut tables = self.tables.write().await;
        validate(reads, |key| Ok(tables.version_of(key)))?;

        for profile in writes.profiles.into_values() {
            tables.put_profile(profile);
        }
        for job in writes.jobs.into_values() {
            tables.put_job(job);
        }
        Ok(())
    }
}

/// A thread-safe in-memory ledger.
///
/// Clones share the same tables. Ideal for tests and one-shot batch runs
/// where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    rows: Arc<InMemoryRows>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<LedgerTransactionBox> {
        Ok(Box::new(StagedTransaction::new(self.rows.clone())))
    }

    async fn insert_profile(&self, profile: Profile) -> Result<()> {
        let mut tables = self.rows.tables.write().await;
        tables.put_profile(profile);
        Ok(())
    }

    async fn insert_contract(&self, contract: Contract) -> Result<()> {
        let mut tables = self.rows.tables.write().await;
        tables.put_contract(contract);
        Ok(())
    }

    async fn insert_job(&self, job: Job) -> Result<()> {
        let mut tables = self.rows.tables.write().await;
        tables.put_job(job);
        Ok(())
    }

    async fn all_profiles(&self) -> Result<Vec<Profile>> {
        let tables = self.rows.tables.read().await;
        let mut profiles: Vec<Profile> = tables
            .profiles
            .values()
            .map(|row| row.record.clone())
            .collect();
        profiles.sort_by_key(|profile| profile.id);
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Amount, Balance};
    use crate::domain::ports::LedgerTransaction;
    use crate::domain::profile::ProfileKind;
    use crate::error::LedgerError;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    async fn seeded() -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::new();
        store
            .insert_profile(Profile::new(
                ProfileId(1),
                ProfileKind::Client,
                Balance::new(dec!(100)),
            ))
            .await
            .unwrap();
        store
            .insert_profile(Profile::new(
                ProfileId(2),
                ProfileKind::Contractor,
                Balance::ZERO,
            ))
            .await
            .unwrap();
        store
            .insert_contract(Contract::new(ContractId(1), ProfileId(1), ProfileId(2)))
            .await
            .unwrap();
        store
            .insert_job(Job::new(
                JobId(1),
                ContractId(1),
                Amount::new(dec!(50)).unwrap(),
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_in_memory_profile_roundtrip() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();

        let profile = tx.find_profile(ProfileId(1)).await.unwrap().unwrap();
        assert_eq!(profile.balance, Balance::new(dec!(100)));
        assert!(tx.find_profile(ProfileId(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reads_see_staged_writes() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();

        let mut profile = tx.find_profile(ProfileId(1)).await.unwrap().unwrap();
        profile.credit(Amount::new(dec!(5)).unwrap()).unwrap();
        tx.update_profile(profile);

        let again = tx.find_profile(ProfileId(1)).await.unwrap().unwrap();
        assert_eq!(again.balance, Balance::new(dec!(105)));
    }

    #[tokio::test]
    async fn test_commit_applies_and_rollback_discards() {
        let store = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let mut profile = tx.find_profile(ProfileId(2)).await.unwrap().unwrap();
        profile.credit(Amount::new(dec!(7)).unwrap()).unwrap();
        tx.update_profile(profile);
        tx.rollback().await;

        let mut tx = store.begin().await.unwrap();
        let mut profile = tx.find_profile(ProfileId(2)).await.unwrap().unwrap();
        assert_eq!(profile.balance, Balance::ZERO);
        profile.credit(Amount::new(dec!(3)).unwrap()).unwrap();
        tx.update_profile(profile);
        tx.commit().await.unwrap();

        let profiles = store.all_profiles().await.unwrap();
        assert_eq!(profiles[1].balance, Balance::new(dec!(3)));
    }

    #[tokio::test]
    async fn test_stale_read_conflicts() {
        let store = seeded().await;

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        let mut a = first.find_profile(ProfileId(1)).await.unwrap().unwrap();
        let mut b = second.find_profile(ProfileId(1)).await.unwrap().unwrap();
        a.credit(Amount::new(dec!(1)).unwrap()).unwrap();
        b.credit(Amount::new(dec!(2)).unwrap()).unwrap();
        first.update_profile(a);
        second.update_profile(b);

        first.commit().await.unwrap();
        assert!(matches!(
            second.commit().await,
            Err(LedgerError::Conflict(_))
        ));

        let profiles = store.all_profiles().await.unwrap();
        assert_eq!(profiles[0].balance, Balance::new(dec!(101)));
    }

    #[tokio::test]
    async fn test_paying_a_job_moves_obligations_version() {
        let store = seeded().await;

        let mut reader = store.begin().await.unwrap();
        let unpaid = reader
            .find_unpaid_jobs_for_client(ProfileId(1))
            .await
            .unwrap();
        assert_eq!(unpaid.len(), 1);
        let mut profile = reader.find_profile(ProfileId(1)).await.unwrap().unwrap();
        profile.credit(Amount::new(dec!(1)).unwrap()).unwrap();
        reader.update_profile(profile);

        let mut payer = store.begin().await.unwrap();
        let mut found = payer
            .find_job_with_contract(JobId(1))
            .await
            .unwrap()
            .unwrap();
        assert!(found.contract.is_some());
        found.job.mark_paid(Utc::now()).unwrap();
        payer.update_job(found.job);
        payer.commit().await.unwrap();

        assert!(matches!(
            reader.commit().await,
            Err(LedgerError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_contract_arriving_after_its_job_moves_obligations_version() {
        let store = InMemoryLedgerStore::new();
        store
            .insert_profile(Profile::new(
                ProfileId(1),
                ProfileKind::Client,
                Balance::new(dec!(100)),
            ))
            .await
            .unwrap();
        store
            .insert_job(Job::new(
                JobId(1),
                ContractId(1),
                Amount::new(dec!(400)).unwrap(),
            ))
            .await
            .unwrap();

        let mut reader = store.begin().await.unwrap();
        let unpaid = reader
            .find_unpaid_jobs_for_client(ProfileId(1))
            .await
            .unwrap();
        assert!(unpaid.is_empty());
        let mut profile = reader.find_profile(ProfileId(1)).await.unwrap().unwrap();
        profile.credit(Amount::new(dec!(1)).unwrap()).unwrap();
        reader.update_profile(profile);

        store
            .insert_contract(Contract::new(ContractId(1), ProfileId(1), ProfileId(2)))
            .await
            .unwrap();

        assert!(matches!(
            reader.commit().await,
            Err(LedgerError::Conflict(_))
        ));
        let mut tx = store.begin().await.unwrap();
        let unpaid = tx.find_unpaid_jobs_for_client(ProfileId(1)).await.unwrap();
        assert_eq!(unpaid.len(), 1);
    }

    #[tokio::test]
    async fn test_orphaned_job_has_no_contract() {
        let store = InMemoryLedgerStore::new();
        store
            .insert_job(Job::new(
                JobId(5),
                ContractId(42),
                Amount::new(dec!(10)).unwrap(),
            ))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.find_job_with_contract(JobId(5)).await.unwrap().unwrap();
        assert!(found.contract.is_none());
    }
}
