//! Ledger entities, money types and the storage ports the application layer
//! is written against.

pub mod contract;
pub mod job;
pub mod money;
pub mod operation;
pub mod ports;
pub mod profile;
