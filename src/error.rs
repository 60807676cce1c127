use crate::domain::contract::ContractId;
use crate::domain::job::JobId;
use crate::domain::money::Balance;
use crate::domain::profile::ProfileId;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// A ledger row that an operation expected to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Profile(ProfileId),
    Job(JobId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Profile(id) => write!(f, "profile {id}"),
            Missing::Job(id) => write!(f, "job {id}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(Missing),
    #[error("profile {profile} is not the client of contract {contract}")]
    Forbidden {
        profile: ProfileId,
        contract: ContractId,
    },
    #[error("insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: Balance, required: Balance },
    #[error("you cannot deposit more than {max_deposit} at this time")]
    DepositLimitExceeded { max_deposit: Balance },
    #[error("job {0} has already been paid")]
    AlreadyPaid(JobId),
    #[error("job {0} has no contract")]
    InvalidState(JobId),
    #[error("amount out of range: {0}")]
    Overflow(String),
    #[error("concurrent update on {0}")]
    Conflict(String),
    #[error("transaction failed")]
    TransactionFailure,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Collapses infrastructure failures into an opaque `TransactionFailure`.
    ///
    /// Business outcomes pass through untouched. The underlying cause is logged
    /// here and never returned to the caller.
    pub fn at_boundary(self) -> Self {
        match self {
            LedgerError::CsvError(_)
            | LedgerError::IoError(_)
            | LedgerError::SerializationError(_)
            | LedgerError::InternalError(_) => {
                tracing::error!(error = %self, "store failure, transaction rolled back");
                LedgerError::TransactionFailure
            }
            other => other,
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(e: rocksdb::Error) -> Self {
        LedgerError::InternalError(Box::new(e))
    }
}
