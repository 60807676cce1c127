use super::profile::ProfileId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub u32);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    #[default]
    New,
    InProgress,
    Terminated,
}

/// Agreement between one client and one contractor. Read-only to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub client_id: ProfileId,
    pub contractor_id: ProfileId,
    #[serde(default)]
    pub terms: String,
    #[serde(default)]
    pub status: ContractStatus,
}

impl Contract {
    pub fn new(id: ContractId, client_id: ProfileId, contractor_id: ProfileId) -> Self {
        Self {
            id,
            client_id,
            contractor_id,
            terms: String::new(),
            status: ContractStatus::New,
        }
    }

    pub fn is_client(&self, profile: ProfileId) -> bool {
        self.client_id == profile
    }
}
