use super::deposit::DepositLimiter;
use super::payment::PaymentProcessor;
use crate::domain::job::Job;
use crate::domain::operation::Operation;
use crate::domain::ports::LedgerStoreRef;
use crate::domain::profile::Profile;
use crate::error::Result;

/// What a successfully applied operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Paid(Job),
    Deposited(Profile),
}

/// The main entry point for applying ledger operations.
///
/// `LedgerEngine` routes each operation to the payment or deposit path. Both
/// paths share one store, and every operation runs in its own transaction,
/// so callers may drive the engine from many tasks at once.
pub struct LedgerEngine {
    store: LedgerStoreRef,
    payments: PaymentProcessor,
    deposits: DepositLimiter,
}

impl LedgerEngine {
    /// Creates a new `LedgerEngine` over `store`.
    pub fn new(store: LedgerStoreRef) -> Self {
        Self {
            payments: PaymentProcessor::new(store.clone()),
            deposits: DepositLimiter::new(store.clone()),
            store,
        }
    }

    pub fn payments(&self) -> &PaymentProcessor {
        &self.payments
    }

    pub fn deposits(&self) -> &DepositLimiter {
        &self.deposits
    }

    /// Applies a single operation.
    pub async fn process_operation(&self, op: Operation) -> Result<Outcome> {
        match op {
            Operation::Pay { job, payer } => {
                self.payments.pay_job(job, payer).await.map(Outcome::Paid)
            }
            Operation::Deposit { target, amount } => self
                .deposits
                .deposit(target, amount)
                .await
                .map(Outcome::Deposited),
        }
    }

    /// Consumes the engine and returns the final state of all profiles.
    pub async fn into_results(self) -> Result<Vec<Profile>> {
        self.store.all_profiles().await
    }
}
