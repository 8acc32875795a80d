//! Service layer: business logic orchestration.
//!
//! [`WalletService`] encodes the money rules over the ledger,
//! [`MatchService`] owns the booking lifecycle, and [`DisputeService`]
//! resolves contests and applies trust penalties. All three emit
//! [`crate::domain::MarketEvent`]s through the shared bus; the notifier
//! consumes them for the out-of-scope notification boundary.

pub mod dispute_service;
pub mod match_service;
pub mod notifier;
pub mod wallet_service;

pub use dispute_service::DisputeService;
pub use match_service::{MatchPolicy, MatchService};
pub use wallet_service::WalletService;
