//! Interface boundary to the external experience-listing service.
//!
//! The listing service owns experience CRUD, search, and calendars. This
//! core only needs the handful of facts that decide whether a platform fee
//! applies and what a booking costs: host, kind, per-person price, and
//! capacity. The listing service pushes those facts into the
//! [`ExperienceCatalog`] over an internal endpoint.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::ids::UserId;
use crate::error::CoreError;

/// Commercial kind of an experience.
///
/// `Pago` and `Ambos` bookings carry the platform fee on acceptance;
/// pure `Intercambio` (exchange) bookings never touch the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceKind {
    /// Paid experience: priced per person.
    Pago,
    /// Exchange experience: no money involved.
    Intercambio,
    /// Mixed: the host accepts payment or exchange.
    Ambos,
}

impl ExperienceKind {
    /// Returns `true` if accepting a match of this kind charges the
    /// platform fee to both parties.
    #[must_use]
    pub const fn fee_applies(&self) -> bool {
        matches!(self, Self::Pago | Self::Ambos)
    }
}

/// The slice of an experience listing this core cares about.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExperienceInfo {
    /// The hosting user.
    pub host_id: UserId,
    /// Commercial kind.
    pub kind: ExperienceKind,
    /// Price per participant. `None` for pure exchange experiences.
    #[schema(value_type = Option<String>)]
    pub price_per_person: Option<Decimal>,
    /// Maximum number of participants per booking.
    pub capacity: u32,
}

impl ExperienceInfo {
    /// Computes the total price for a party of `participants`.
    ///
    /// Returns `None` when the experience has no per-person price
    /// (pure exchange listings).
    #[must_use]
    pub fn total_price(&self, participants: u32) -> Option<Decimal> {
        self.price_per_person
            .map(|p| p * Decimal::from(participants))
    }
}

/// In-memory mirror of the listing service's pricing facts.
///
/// Read-mostly: the listing service upserts entries when a listing changes,
/// and every match creation reads one entry. A single `RwLock` over the
/// map is enough; entries are small value types.
#[derive(Debug, Default)]
pub struct ExperienceCatalog {
    entries: RwLock<HashMap<uuid::Uuid, ExperienceInfo>>,
}

impl ExperienceCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the catalog entry for an experience.
    pub async fn upsert(&self, experience_id: uuid::Uuid, info: ExperienceInfo) {
        self.entries.write().await.insert(experience_id, info);
    }

    /// Looks up an experience.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ExperienceNotFound`] if the listing service has
    /// not pushed this experience.
    pub async fn get(&self, experience_id: uuid::Uuid) -> Result<ExperienceInfo, CoreError> {
        self.entries
            .read()
            .await
            .get(&experience_id)
            .cloned()
            .ok_or(CoreError::ExperienceNotFound(experience_id))
    }

    /// Returns the number of known experiences.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if no experiences are known.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
