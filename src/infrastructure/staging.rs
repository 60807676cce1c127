//! Optimistic transactions shared by every store backend.
//!
//! A backend only has to expose versioned rows and an atomic `apply`. The
//! [`StagedTransaction`] records the version of every row it reads, buffers
//! its writes, and hands both to the backend on commit. The backend rejects
//! the commit with `Conflict` if any recorded version moved.

use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId};
use crate::domain::ports::{JobWithContract, LedgerTransaction};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}

impl<T> Versioned<T> {
    pub fn first(record: T) -> Self {
        Self { version: 1, record }
    }

    pub fn replace(&mut self, record: T) {
        self.version += 1;
        self.record = record;
    }
}

/// Something a transaction can depend on.
///
/// `Obligations` stands for the set of jobs under a client's contracts: its
/// version moves whenever one of those jobs is inserted or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Profile(ProfileId),
    Job(JobId),
    Obligations(ProfileId),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Profile(id) => write!(f, "profile {id}"),
            RowKey::Job(id) => write!(f, "job {id}"),
            RowKey::Obligations(id) => write!(f, "obligations of profile {id}"),
        }
    }
}

pub type ReadSet = HashMap<RowKey, u64>;

#[derive(Debug, Default)]
pub struct WriteSet {
    pub profiles: HashMap<ProfileId, Profile>,
    pub jobs: HashMap<JobId, Job>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty() && self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.profiles.len() + self.jobs.len()
    }
}

/// Committed jobs under one client's contracts, paid or not.
#[derive(Debug, Default)]
pub struct Obligations {
    pub version: u64,
    pub jobs: Vec<Job>,
}

#[async_trait]
pub trait VersionedRows: Send + Sync + 'static {
    async fn profile(&self, id: ProfileId) -> Result<Option<Versioned<Profile>>>;
    async fn job(&self, id: JobId) -> Result<Option<Versioned<Job>>>;
    async fn contract(&self, id: ContractId) -> Result<Option<Contract>>;
    async fn obligations(&self, client_id: ProfileId) -> Result<Obligations>;

    /// Validates `reads` against the committed versions and applies `writes`,
    /// all under one lock. Either everything lands or nothing does.
    async fn apply(&self, reads: &ReadSet, writes: WriteSet) -> Result<()>;
}

/// Checks every recorded read against `current`, failing on the first mismatch.
pub fn validate<F>(reads: &ReadSet, mut current: F) -> Result<()>
where
    F: FnMut(&RowKey) -> Result<u64>,
{
    for (key, expected) in reads {
        if current(key)? != *expected {
            return Err(LedgerError::Conflict(key.to_string()));
        }
    }
    Ok(())
}

pub struct StagedTransaction<R: VersionedRows> {
    rows: Arc<R>,
    reads: ReadSet,
    writes: WriteSet,
}

impl<R: VersionedRows> StagedTransaction<R> {
    pub fn new(rows: Arc<R>) -> Self {
        Self {
            rows,
            reads: ReadSet::new(),
            writes: WriteSet::default(),
        }
    }

    // First observation wins; a later re-read cannot hide a concurrent change.
    fn observe(&mut self, key: RowKey, version: u64) {
        self.reads.entry(key).or_insert(version);
    }
}

#[async_trait]
impl<R: VersionedRows> LedgerTransaction for StagedTransaction<R> {
    async fn find_profile(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        if let Some(staged) = self.writes.profiles.get(&id) {
            return Ok(Some(staged.clone()));
        }
        let Some(row) = self.rows.profile(id).await? else {
            return Ok(None);
        };
        self.observe(RowKey::Profile(id), row.version);
        Ok(Some(row.record))
    }

    async fn find_job_with_contract(&mut self, id: JobId) -> Result<Option<JobWithContract>> {
        let job = match self.writes.jobs.get(&id) {
            Some(staged) => staged.clone(),
            None => {
                let Some(row) = self.rows.job(id).await? else {
                    return Ok(None);
                };
                self.observe(RowKey::Job(id), row.version);
                row.record
            }
        };
        let contract = self.rows.contract(job.contract_id).await?;
        Ok(Some(JobWithContract { job, contract }))
    }

    async fn find_unpaid_jobs_for_client(&mut self, client_id: ProfileId) -> Result<Vec<Job>> {
        let obligations = self.rows.obligations(client_id).await?;
        self.observe(RowKey::Obligations(client_id), obligations.version);

        let staged = &self.writes.jobs;
        Ok(obligations
            .jobs
            .into_iter()
            .map(|job| staged.get(&job.id).cloned().unwrap_or(job))
            .filter(Job::is_outstanding)
            .collect())
    }

    fn update_profile(&mut self, profile: Profile) {
        self.writes.profiles.insert(profile.id, profile);
    }

    fn update_job(&mut self, job: Job) {
        self.writes.jobs.insert(job.id, job);
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        if this.writes.is_empty() {
            return Ok(());
        }
        this.rows.apply(&this.reads, this.writes).await
    }

    async fn rollback(self: Box<Self>) {
        tracing::debug!(
            staged = self.writes.len(),
            "transaction rolled back"
        );
    }
}
