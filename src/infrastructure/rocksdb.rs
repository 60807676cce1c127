use super::staging::{
    Obligations, ReadSet, RowKey, StagedTransaction, Versioned, VersionedRows, WriteSet, validate,
};
use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId};
use crate::domain::ports::{LedgerStore, LedgerTransactionBox};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for profile rows.
pub const CF_PROFILES: &str = "profiles";
/// Column Family for contract rows.
pub const CF_CONTRACTS: &str = "contracts";
/// Column Family for job rows.
pub const CF_JOBS: &str = "jobs";
/// Column Family for per-client obligations versions.
pub const CF_OBLIGATIONS: &str = "obligations";

pub struct RocksDbRows {
    db: DB,
    // Serializes validate-then-write; reads never take it.
    commit_lock: Mutex<()>,
}

impl RocksDbRows {
    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: u32) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    fn obligations_version(&self, client_id: ProfileId) -> Result<u64> {
        Ok(self
            .read::<u64>(CF_OBLIGATIONS, client_id.0)?
            .unwrap_or(0))
    }

    fn version_of(&self, key: &RowKey) -> Result<u64> {
        match key {
            RowKey::Profile(id) => Ok(self
                .read::<Versioned<Profile>>(CF_PROFILES, id.0)?
                .map_or(0, |row| row.version)),
            RowKey::Job(id) => Ok(self
                .read::<Versioned<Job>>(CF_JOBS, id.0)?
                .map_or(0, |row| row.version)),
            RowKey::Obligations(id) => self.obligations_version(*id),
        }
    }

    fn stage<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf_name: &str,
        key: u32,
        value: &T,
    ) -> Result<()> {
        let cf = self.cf(cf_name)?;
        batch.put_cf(cf, key.to_be_bytes(), serde_json::to_vec(value)?);
        Ok(())
    }

    fn stage_profile(&self, batch: &mut WriteBatch, profile: Profile) -> Result<()> {
        let key = profile.id.0;
        let row = match self.read::<Versioned<Profile>>(CF_PROFILES, key)? {
            Some(mut row) => {
                row.replace(profile);
                row
            }
            None => Versioned::first(profile),
        };
        self.stage(batch, CF_PROFILES, key, &row)
    }

    fn bump_obligations(
        &self,
        batch: &mut WriteBatch,
        client_id: ProfileId,
        bumped: &mut HashSet<ProfileId>,
    ) -> Result<()> {
        if bumped.insert(client_id) {
            let next = self.obligations_version(client_id)? + 1;
            self.stage(batch, CF_OBLIGATIONS, client_id.0, &next)?;
        }
        Ok(())
    }

    /// Moves the obligations of both the new and any replaced client.
    fn stage_contract(&self, batch: &mut WriteBatch, contract: &Contract) -> Result<()> {
        let mut bumped = HashSet::new();
        if let Some(previous) = self.read::<Contract>(CF_CONTRACTS, contract.id.0)? {
            self.bump_obligations(batch, previous.client_id, &mut bumped)?;
        }
        self.bump_obligations(batch, contract.client_id, &mut bumped)?;
        self.stage(batch, CF_CONTRACTS, contract.id.0, contract)
    }

    fn stage_job(
        &self,
        batch: &mut WriteBatch,
        job: Job,
        bumped: &mut HashSet<ProfileId>,
    ) -> Result<()> {
        if let Some(contract) = self.read::<Contract>(CF_CONTRACTS, job.contract_id.0)? {
            self.bump_obligations(batch, contract.client_id, bumped)?;
        }

        let key = job.id.0;
        let row = match self.read::<Versioned<Job>>(CF_JOBS, key)? {
            Some(mut row) => {
                row.replace(job);
                row
            }
            None => Versioned::first(job),
        };
        self.stage(batch, CF_JOBS, key, &row)
    }
}

#[async_trait]
impl VersionedRows for RocksDbRows {
    async fn profile(&self, id: ProfileId) -> Result<Option<Versioned<Profile>>> {
        self.read(CF_PROFILES, id.0)
    }

    async fn job(&self, id: JobId) -> Result<Option<Versioned<Job>>> {
        self.read(CF_JOBS, id.0)
    }

    async fn contract(&self, id: ContractId) -> Result<Option<Contract>> {
        self.read(CF_CONTRACTS, id.0)
    }

    async fn obligations(&self, client_id: ProfileId) -> Result<Obligations> {
        // Version first: a job written mid-scan then shows up as a conflict.
        let version = self.obligations_version(client_id)?;

        let contracts: HashSet<ContractId> = self
            .scan::<Contract>(CF_CONTRACTS)?
            .into_iter()
            .filter(|contract| contract.is_client(client_id))
            .map(|contract| contract.id)
            .collect();

        let jobs = self
            .scan::<Versioned<Job>>(CF_JOBS)?
            .into_iter()
            .map(|row| row.record)
            .filter(|job| contracts.contains(&job.contract_id))
            .collect();

        Ok(Obligations { version, jobs })
    }

    async fn apply(&self, reads: &ReadSet, writes: WriteSet) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        validate(reads, |key| self.version_of(key))?;

        let mut batch = WriteBatch::default();
        for profile in writes.profiles.into_values() {
            self.stage_profile(&mut batch, profile)?;
        }
        let mut bumped = HashSet::new();
        for job in writes.jobs.into_values() {
            self.stage_job(&mut batch, job, &mut bumped)?;
        }
        self.db.write(batch)?;
        Ok(())
    }
}

/// A persistent ledger backed by RocksDB.
///
/// Each entity lives in its own Column Family as JSON, keyed by its big-endian
/// id. Commits land as a single `WriteBatch`, so a crash never leaves half a
/// payment on disk.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc`).
#[derive(Clone)]
pub struct RocksDbLedgerStore {
    rows: Arc<RocksDbRows>,
}

impl RocksDbLedgerStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all ledger column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_PROFILES, CF_CONTRACTS, CF_JOBS, CF_OBLIGATIONS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            rows: Arc::new(RocksDbRows {
                db,
                commit_lock: Mutex::new(()),
            }),
        })
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedgerStore {
    async fn begin(&self) -> Result<LedgerTransactionBox> {
        Ok(Box::new(StagedTransaction::new(self.rows.clone())))
    }

    async fn insert_profile(&self, profile: Profile) -> Result<()> {
        let _guard = self.rows.commit_lock.lock().await;
        let mut batch = WriteBatch::default();
        self.rows.stage_profile(&mut batch, profile)?;
        self.rows.db.write(batch)?;
        Ok(())
    }

    async fn insert_contract(&self, contract: Contract) -> Result<()> {
        let _guard = self.rows.commit_lock.lock().await;
        let mut batch = WriteBatch::default();
        self.rows.stage_contract(&mut batch, &contract)?;
        self.rows.db.write(batch)?;
        Ok(())
    }

    async fn insert_job(&self, job: Job) -> Result<()> {
        let _guard = self.rows.commit_lock.lock().await;
        let mut batch = WriteBatch::default();
        self.rows.stage_job(&mut batch, job, &mut HashSet::new())?;
        self.rows.db.write(batch)?;
        Ok(())
    }

    async fn all_profiles(&self) -> Result<Vec<Profile>> {
        // Big-endian keys iterate in id order.
        Ok(self
            .rows
            .scan::<Versioned<Profile>>(CF_PROFILES)?
            .into_iter()
            .map(|row| row.record)
            .collect())
    }
}
