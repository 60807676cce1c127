//! Ledger core for a freelance marketplace.
//!
//! Clients pay contractors for jobs under contracts, and top up their own
//! balance with deposits bounded by what they still owe. Both operations run
//! as serializable transactions against a pluggable [`LedgerStore`].
//!
//! [`LedgerStore`]: domain::ports::LedgerStore

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod telemetry;
