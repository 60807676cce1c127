use super::contract::Contract;
use super::job::{Job, JobId};
use super::profile::{Profile, ProfileId};
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A job read together with the contract it belongs to.
///
/// `contract` is `None` only for an orphaned job, which points at a
/// contract the store does not hold.
#[derive(Debug, Clone, PartialEq)]
pub struct JobWithContract {
    pub job: Job,
    pub contract: Option<Contract>,
}

/// Entry point to the persisted ledger.
///
/// Every balance or job mutation goes through a [`LedgerTransaction`]. The
/// `insert_*` methods are the seeding path for records created outside the
/// ledger core.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<LedgerTransactionBox>;

    async fn insert_profile(&self, profile: Profile) -> Result<()>;
    async fn insert_contract(&self, contract: Contract) -> Result<()>;
    async fn insert_job(&self, job: Job) -> Result<()>;

    /// Committed profiles, ordered by id.
    async fn all_profiles(&self) -> Result<Vec<Profile>>;
}

/// A serializable unit of work over the ledger.
///
/// Reads observe this transaction's own staged writes. Nothing becomes visible
/// to other transactions until [`commit`](LedgerTransaction::commit), which
/// fails with `Conflict` if any row read here was changed in the meantime.
/// Dropping a transaction without committing discards it.
#[async_trait]
pub trait LedgerTransaction: Send {
    async fn find_profile(&mut self, id: ProfileId) -> Result<Option<Profile>>;
    async fn find_job_with_contract(&mut self, id: JobId) -> Result<Option<JobWithContract>>;
    async fn find_unpaid_jobs_for_client(&mut self, client_id: ProfileId) -> Result<Vec<Job>>;

    fn update_profile(&mut self, profile: Profile);
    fn update_job(&mut self, job: Job);

    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>);
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type LedgerTransactionBox = Box<dyn LedgerTransaction>;

pub type TransactionFuture<'t, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 't>>;

/// Runs `work` inside a fresh transaction.
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`. The
/// transaction is consumed on both paths.
pub async fn run_in_transaction<T, F>(store: &dyn LedgerStore, work: F) -> Result<T>
where
    F: for<'t> FnOnce(&'t mut LedgerTransactionBox) -> TransactionFuture<'t, T>,
{
    let mut tx = store.begin().await?;
    let outcome = work(&mut tx).await;
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            tx.rollback().await;
            Err(e)
        }
    }
}
