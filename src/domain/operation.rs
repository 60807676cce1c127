use super::job::JobId;
use super::money::Amount;
use super::profile::ProfileId;
use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Pay,
    Deposit,
}

/// One row of an operations batch, as read off the wire.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OperationRecord {
    pub r#type: OperationType,
    pub profile: ProfileId,
    pub job: Option<JobId>,
    pub amount: Option<Decimal>,
}

/// A validated ledger operation.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operation {
    /// `payer` settles `job`.
    Pay { job: JobId, payer: ProfileId },
    /// `amount` is credited to `target`.
    Deposit { target: ProfileId, amount: Amount },
}

impl TryFrom<OperationRecord> for Operation {
    type Error = LedgerError;

    fn try_from(record: OperationRecord) -> Result<Self, Self::Error> {
        match record.r#type {
            OperationType::Pay => {
                let job = record.job.ok_or_else(|| {
                    LedgerError::ValidationError("pay is missing a job id".to_string())
                })?;
                Ok(Operation::Pay {
                    job,
                    payer: record.profile,
                })
            }
            OperationType::Deposit => {
                let amount = record.amount.ok_or_else(|| {
                    LedgerError::ValidationError("deposit is missing an amount".to_string())
                })?;
                Ok(Operation::Deposit {
                    target: record.profile,
                    amount: Amount::new(amount)?,
                })
            }
        }
    }
}
