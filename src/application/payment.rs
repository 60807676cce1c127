use crate::domain::job::{Job, JobId};
use crate::domain::ports::{LedgerStoreRef, LedgerTransactionBox, run_in_transaction};
use crate::domain::profile::ProfileId;
use crate::error::{LedgerError, Missing, Result};
use chrono::{DateTime, Utc};
use tracing::info;

/// Settles jobs by moving their price from the client to the contractor.
pub struct PaymentProcessor {
    store: LedgerStoreRef,
}

impl PaymentProcessor {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    /// Pays `job_id` on behalf of `payer`, who must be the contract's client.
    ///
    /// The client debit, contractor credit and the job's flip to paid commit
    /// together or not at all. A job that is already paid is rejected with
    /// `AlreadyPaid`; a payment racing another on the same job fails with
    /// `Conflict`.
    pub async fn pay_job(&self, job_id: JobId, payer: ProfileId) -> Result<Job> {
        let paid_at = Utc::now();
        let job = run_in_transaction(self.store.as_ref(), move |tx| {
            Box::pin(settle(tx, job_id, payer, paid_at))
        })
        .await
        .map_err(LedgerError::at_boundary)?;

        info!(job = %job.id, price = %job.price, payer = %payer, "job paid");
        Ok(job)
    }
}

async fn settle(
    tx: &mut LedgerTransactionBox,
    job_id: JobId,
    payer: ProfileId,
    paid_at: DateTime<Utc>,
) -> Result<Job> {
    let found = tx
        .find_job_with_contract(job_id)
        .await?
        .ok_or(LedgerError::NotFound(Missing::Job(job_id)))?;
    let contract = found.contract.ok_or(LedgerError::InvalidState(job_id))?;
    if !contract.is_client(payer) {
        return Err(LedgerError::Forbidden {
            profile: payer,
            contract: contract.id,
        });
    }

    let mut job = found.job;
    if job.paid {
        return Err(LedgerError::AlreadyPaid(job_id));
    }

    let mut client = tx
        .find_profile(contract.client_id)
        .await?
        .ok_or(LedgerError::NotFound(Missing::Profile(contract.client_id)))?;
    client.debit(job.price)?;
    tx.update_profile(client);

    // Loaded after the client is staged so a self-contract nets to zero.
    let mut contractor = tx
        .find_profile(contract.contractor_id)
        .await?
        .ok_or(LedgerError::NotFound(Missing::Profile(contract.contractor_id)))?;
    contractor.credit(job.price)?;
    tx.update_profile(contractor);

    job.mark_paid(paid_at)?;
    tx.update_job(job.clone());
    Ok(job)
}
