#![allow(dead_code)]

use async_trait::async_trait;
use freelance_ledger::domain::contract::{Contract, ContractId};
use freelance_ledger::domain::job::{Job, JobId};
use freelance_ledger::domain::money::{Amount, Balance};
use freelance_ledger::domain::ports::{
    JobWithContract, LedgerStore, LedgerTransaction, LedgerTransactionBox,
};
use freelance_ledger::domain::profile::{Profile, ProfileId, ProfileKind};
use freelance_ledger::error::{LedgerError, Result};
use freelance_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const CLIENT: ProfileId = ProfileId(1);
pub const CONTRACTOR: ProfileId = ProfileId(2);
pub const STRANGER: ProfileId = ProfileId(3);

/// One client, one contractor, one contract between them and a job per price.
pub async fn marketplace(
    client_balance: Decimal,
    contractor_balance: Decimal,
    prices: &[Decimal],
) -> Arc<InMemoryLedgerStore> {
    let store = Arc::new(InMemoryLedgerStore::new());
    populate(store.as_ref(), client_balance, contractor_balance, prices).await;
    store
}

pub async fn populate(
    store: &dyn LedgerStore,
    client_balance: Decimal,
    contractor_balance: Decimal,
    prices: &[Decimal],
) {
    store
        .insert_profile(Profile::new(
            CLIENT,
            ProfileKind::Client,
            Balance::new(client_balance),
        ))
        .await
        .unwrap();
    store
        .insert_profile(Profile::new(
            CONTRACTOR,
            ProfileKind::Contractor,
            Balance::new(contractor_balance),
        ))
        .await
        .unwrap();
    store
        .insert_profile(Profile::new(STRANGER, ProfileKind::Client, Balance::ZERO))
        .await
        .unwrap();
    store
        .insert_contract(Contract::new(ContractId(1), CLIENT, CONTRACTOR))
        .await
        .unwrap();
    for (i, price) in prices.iter().enumerate() {
        store
            .insert_job(Job::new(
                JobId(i as u32 + 1),
                ContractId(1),
                Amount::new(*price).unwrap(),
            ))
            .await
            .unwrap();
    }
}

pub async fn balance_of(store: &dyn LedgerStore, id: ProfileId) -> Decimal {
    store
        .all_profiles()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.id == id)
        .map(|p| p.balance.0)
        .expect("profile should exist")
}

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

/// Wraps the in-memory store so every commit fails like a lost connection.
#[derive(Default)]
pub struct FailingCommitStore {
    inner: InMemoryLedgerStore,
}

struct FailingCommit(LedgerTransactionBox);

#[async_trait]
impl LedgerStore for FailingCommitStore {
    async fn begin(&self) -> Result<LedgerTransactionBox> {
        Ok(Box::new(FailingCommit(self.inner.begin().await?)))
    }

    async fn insert_profile(&self, profile: Profile) -> Result<()> {
        self.inner.insert_profile(profile).await
    }

    async fn insert_contract(&self, contract: Contract) -> Result<()> {
        self.inner.insert_contract(contract).await
    }

    async fn insert_job(&self, job: Job) -> Result<()> {
        self.inner.insert_job(job).await
    }

    async fn all_profiles(&self) -> Result<Vec<Profile>> {
        self.inner.all_profiles().await
    }
}

#[async_trait]
impl LedgerTransaction for FailingCommit {
    async fn find_profile(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        self.0.find_profile(id).await
    }

    async fn find_job_with_contract(&mut self, id: JobId) -> Result<Option<JobWithContract>> {
        self.0.find_job_with_contract(id).await
    }

    async fn find_unpaid_jobs_for_client(&mut self, client_id: ProfileId) -> Result<Vec<Job>> {
        self.0.find_unpaid_jobs_for_client(client_id).await
    }

    fn update_profile(&mut self, profile: Profile) {
        self.0.update_profile(profile)
    }

    fn update_job(&mut self, job: Job) {
        self.0.update_job(job)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.0.rollback().await;
        Err(LedgerError::InternalError(Box::new(std::io::Error::other(
            "connection reset by peer",
        ))))
    }

    async fn rollback(self: Box<Self>) {
        self.0.rollback().await
    }
}
