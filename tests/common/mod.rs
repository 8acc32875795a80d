//! Shared test harness: fully wired in-memory core.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;

use verbena_core::app_state::AppState;
use verbena_core::domain::experience::{ExperienceInfo, ExperienceKind};
use verbena_core::domain::ids::UserId;
use verbena_core::domain::{
    DisputeRegistry, EventBus, ExperienceCatalog, MatchRegistry, UserRegistry,
};
use verbena_core::ledger::LedgerStore;
use verbena_core::service::{DisputeService, MatchPolicy, MatchService, WalletService};

/// Euro amount in cents.
pub fn eur(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// A fully wired core with one paid experience (€45/person, capacity 6).
pub struct Harness {
    pub state: AppState,
    pub host: UserId,
    pub requester: UserId,
    pub experience_id: uuid::Uuid,
}

impl Harness {
    /// Builds the core with default config values (€1.50 fee, €5 minimum).
    pub async fn new() -> Self {
        let ledger = Arc::new(LedgerStore::new());
        let matches = Arc::new(MatchRegistry::new());
        let disputes = Arc::new(DisputeRegistry::new());
        let users = Arc::new(UserRegistry::new());
        let catalog = Arc::new(ExperienceCatalog::new());
        let event_bus = EventBus::new(1000);

        let wallet_service =
            WalletService::new(Arc::clone(&ledger), event_bus.clone(), eur(500), eur(150));
        let match_service = Arc::new(MatchService::new(
            Arc::clone(&matches),
            Arc::clone(&users),
            Arc::clone(&catalog),
            wallet_service.clone(),
            event_bus.clone(),
            MatchPolicy::default(),
        ));
        let dispute_service = Arc::new(DisputeService::new(
            Arc::clone(&disputes),
            Arc::clone(&matches),
            Arc::clone(&users),
            wallet_service.clone(),
            event_bus.clone(),
            14,
        ));

        let host = UserId::new();
        let requester = UserId::new();
        let experience_id = uuid::Uuid::new_v4();
        catalog
            .upsert(
                experience_id,
                ExperienceInfo {
                    host_id: host,
                    kind: ExperienceKind::Pago,
                    price_per_person: Some(eur(4500)),
                    capacity: 6,
                },
            )
            .await;

        let state = AppState {
            match_service,
            wallet_service: Arc::new(wallet_service),
            dispute_service,
            users,
            catalog,
            event_bus,
        };
        Self {
            state,
            host,
            requester,
            experience_id,
        }
    }

    /// Credits both parties a working balance.
    pub async fn fund_parties(&self, cents: i64) {
        for user in [self.host, self.requester] {
            let result = self.state.wallet_service.top_up(user, eur(cents)).await;
            assert!(result.is_ok(), "test funding must succeed");
        }
    }

    /// Registers an additional experience of the given kind for `host`.
    pub async fn add_experience(
        &self,
        host: UserId,
        kind: ExperienceKind,
        price_cents: Option<i64>,
        capacity: u32,
    ) -> uuid::Uuid {
        let id = uuid::Uuid::new_v4();
        self.state
            .catalog
            .upsert(
                id,
                ExperienceInfo {
                    host_id: host,
                    kind,
                    price_per_person: price_cents.map(eur),
                    capacity,
                },
            )
            .await;
        id
    }
}
