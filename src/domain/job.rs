use super::contract::ContractId;
use super::money::Amount;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of billable work under a contract.
///
/// `paid` only ever moves from `false` to `true`, and `payment_date` is
/// stamped in the same step. Once paid, a job is frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub contract_id: ContractId,
    #[serde(default)]
    pub description: String,
    pub price: Amount,
    #[serde(default, deserialize_with = "null_as_unpaid")]
    pub paid: bool,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
}

fn null_as_unpaid<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl Job {
    pub fn new(id: JobId, contract_id: ContractId, price: Amount) -> Self {
        Self {
            id,
            contract_id,
            description: String::new(),
            price,
            paid: false,
            payment_date: None,
        }
    }

    pub fn is_outstanding(&self) -> bool {
        !self.paid
    }

    /// Flips the job to paid and stamps the payment date.
    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> Result<(), LedgerError> {
        if self.paid {
            return Err(LedgerError::AlreadyPaid(self.id));
        }
        self.paid = true;
        self.payment_date = Some(at);
        Ok(())
    }
}
