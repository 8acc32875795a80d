//! Wallet ledger engine: append-only transaction log per user with a
//! cached balance projection.
//!
//! The log is authoritative; the balance is a derived value kept in step
//! under the same per-user lock that guards every append. `reconcile`
//! replays the log and freezes the account on divergence.

pub mod store;

pub use store::{LedgerStore, TransactionPage};
