//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{EventBus, ExperienceCatalog, UserRegistry};
use crate::service::{DisputeService, MatchService, WalletService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Booking lifecycle service.
    pub match_service: Arc<MatchService>,
    /// Wallet business rules over the ledger.
    pub wallet_service: Arc<WalletService>,
    /// Dispute resolution and trust penalties.
    pub dispute_service: Arc<DisputeService>,
    /// Trust projection of users (ban checks, internal upserts).
    pub users: Arc<UserRegistry>,
    /// Listing-service catalog boundary.
    pub catalog: Arc<ExperienceCatalog>,
    /// Event bus for consumers spawned at startup.
    pub event_bus: EventBus,
}
