//! Database row models for the durable mirrors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored event row from the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Match the event concerns, when it concerns one.
    pub match_id: Option<Uuid>,
    /// Event type discriminator (e.g. `"match_accepted"`).
    pub event_type: String,
    /// JSONB payload with event-specific data.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A match row from the `matches` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRow {
    /// Match identifier.
    pub id: Uuid,
    /// Booked experience.
    pub experience_id: Uuid,
    /// Hosting party.
    pub host_id: Uuid,
    /// Requesting party.
    pub requester_id: Uuid,
    /// Status discriminator string.
    pub status: String,
    /// Party size.
    pub participants: i32,
    /// Total price, if priced.
    pub total_price: Option<Decimal>,
    /// Scheduled start.
    pub start_date: Option<DateTime<Utc>>,
    /// Per-party fee captured at acceptance.
    pub fee_charged: Option<Decimal>,
    /// Refund record as JSONB, when one was issued.
    pub refund: Option<serde_json::Value>,
    /// Dispute that overrode the outcome, if any.
    pub dispute_id: Option<Uuid>,
    /// Rejection reason, if any.
    pub reject_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A ledger entry row from the `wallet_transactions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    /// Entry identifier.
    pub id: Uuid,
    /// Wallet owner.
    pub user_id: Uuid,
    /// Kind discriminator string.
    pub kind: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Related match, when applicable.
    pub related_match: Option<Uuid>,
    /// Status discriminator string.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A dispute row from the `disputes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeRow {
    /// Dispute identifier.
    pub id: Uuid,
    /// Contested match.
    pub match_id: Uuid,
    /// Opening participant.
    pub opener_id: Uuid,
    /// Short reason tag.
    pub reason: String,
    /// Free-form description.
    pub description: String,
    /// Status discriminator string.
    pub status: String,
    /// Resolution as JSONB, once terminal.
    pub resolution: Option<serde_json::Value>,
    /// Admin action as JSONB, once terminal.
    pub admin_action: Option<serde_json::Value>,
    /// Resolving admin.
    pub resolved_by: Option<Uuid>,
    /// Admin notes.
    pub admin_notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}
