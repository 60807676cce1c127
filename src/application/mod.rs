//! Application layer containing the ledger's money-moving operations.
//!
//! [`payment::PaymentProcessor`] settles jobs and [`deposit::DepositLimiter`]
//! applies bounded deposits. [`engine::LedgerEngine`] routes parsed operations
//! to either. Each operation is one transaction against an injected
//! [`LedgerStore`](crate::domain::ports::LedgerStore).

pub mod deposit;
pub mod engine;
pub mod payment;
