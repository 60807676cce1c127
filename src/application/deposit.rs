use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{LedgerStoreRef, LedgerTransactionBox, run_in_transaction};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{LedgerError, Missing, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

/// Share of a client's outstanding obligations they may deposit at once.
pub const MAX_DEPOSIT_RATIO: Decimal = dec!(0.25);

/// Largest deposit allowed against `outstanding` unpaid job prices.
pub fn deposit_limit(outstanding: Balance) -> Result<Balance> {
    outstanding
        .ceil_fraction(MAX_DEPOSIT_RATIO)
        .ok_or_else(|| LedgerError::Overflow(format!("deposit limit of {outstanding}")))
}

/// Applies deposits bounded by the depositor's unpaid obligations.
pub struct DepositLimiter {
    store: LedgerStoreRef,
}

impl DepositLimiter {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    /// The most `client_id` could deposit right now.
    pub async fn max_deposit(&self, client_id: ProfileId) -> Result<Balance> {
        run_in_transaction(self.store.as_ref(), move |tx| {
            Box::pin(current_limit(tx, client_id))
        })
        .await
        .map_err(LedgerError::at_boundary)
    }

    /// Credits `amount` to `target` if it does not exceed the deposit limit.
    ///
    /// The limit is computed in the same transaction that applies the
    /// deposit. If a job of `target` is paid, or its balance changes, before
    /// this commits, the deposit fails with `Conflict`.
    pub async fn deposit(&self, target: ProfileId, amount: Amount) -> Result<Profile> {
        let profile = run_in_transaction(self.store.as_ref(), move |tx| {
            Box::pin(apply_deposit(tx, target, amount))
        })
        .await
        .map_err(LedgerError::at_boundary)?;

        info!(profile = %profile.id, %amount, balance = %profile.balance, "deposit applied");
        Ok(profile)
    }
}

async fn outstanding(tx: &mut LedgerTransactionBox, client_id: ProfileId) -> Result<Balance> {
    let unpaid = tx.find_unpaid_jobs_for_client(client_id).await?;
    Balance::total(unpaid.into_iter().map(|job| job.price)).ok_or_else(|| {
        LedgerError::Overflow(format!("unpaid job prices of profile {client_id}"))
    })
}

async fn current_limit(tx: &mut LedgerTransactionBox, client_id: ProfileId) -> Result<Balance> {
    if tx.find_profile(client_id).await?.is_none() {
        return Err(LedgerError::NotFound(Missing::Profile(client_id)));
    }
    deposit_limit(outstanding(tx, client_id).await?)
}

async fn apply_deposit(
    tx: &mut LedgerTransactionBox,
    target: ProfileId,
    amount: Amount,
) -> Result<Profile> {
    let mut profile = tx
        .find_profile(target)
        .await?
        .ok_or(LedgerError::NotFound(Missing::Profile(target)))?;

    let max_deposit = deposit_limit(outstanding(tx, target).await?)?;
    if !max_deposit.admits(amount) {
        return Err(LedgerError::DepositLimitExceeded { max_deposit });
    }

    profile.credit(amount)?;
    tx.update_profile(profile.clone());
    Ok(profile)
}
