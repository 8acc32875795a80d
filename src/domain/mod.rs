//! Domain layer: core entities, registries, and the event system.
//!
//! This module contains the booking match aggregate and its registry, the
//! dispute aggregate with its one-active-per-match registry, the per-user
//! trust state, the listing-service catalog boundary, wallet transaction
//! types, and the event bus that broadcasts every state mutation.

pub mod booking;
pub mod dispute;
pub mod dispute_registry;
pub mod event_bus;
pub mod experience;
pub mod ids;
pub mod market_event;
pub mod match_registry;
pub mod transaction;
pub mod user;

pub use booking::{Match, MatchStatus};
pub use dispute::{AdminAction, Dispute, DisputeStatus, Resolution};
pub use dispute_registry::DisputeRegistry;
pub use event_bus::EventBus;
pub use experience::{ExperienceCatalog, ExperienceInfo, ExperienceKind};
pub use ids::{DisputeId, MatchId, TxId, UserId};
pub use market_event::MarketEvent;
pub use match_registry::{MatchFilter, MatchRegistry};
pub use transaction::{TransactionKind, TransactionStatus, WalletTransaction};
pub use user::{UserAccount, UserRegistry, UserRole};
