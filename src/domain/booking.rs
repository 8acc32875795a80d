//! The match aggregate: one booking negotiation between host and requester.
//!
//! A `Match` row is the single source of truth for booking status. Money
//! never lives here — the wallet ledger owns it — but the match records
//! references to what it caused: the per-party fee charged at acceptance
//! and the refund issued on cancellation, for user-facing display.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{DisputeId, MatchId, TxId, UserId};

/// Lifecycle status of a match.
///
/// ```text
/// pending ──► accepted ──► completed
///    │            │
///    ├──► rejected└──► cancelled
///    └──► cancelled
/// ```
///
/// `rejected`, `cancelled`, and `completed` are terminal for the normal
/// flow; a dispute may still attach to a terminal match within the
/// resolution window and record its outcome as metadata here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Requested by a traveler, awaiting the host's decision.
    Pending,
    /// Host accepted; the platform fee has been captured (fee-bearing
    /// kinds only).
    Accepted,
    /// Host declined, or the request expired unanswered.
    Rejected,
    /// Either party withdrew before completion.
    Cancelled,
    /// The experience took place.
    Completed,
}

impl MatchStatus {
    /// Returns `true` for states with no outgoing normal-flow transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Completed)
    }

    /// Lower-case status name, as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

/// Refund issued against a match, recorded for user-facing display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefundRecord {
    /// Policy percentage that was applied (0–100).
    pub percentage: u8,
    /// Amount credited back.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Ledger entry carrying the credit.
    pub tx_id: TxId,
    /// When the refund was issued.
    pub issued_at: DateTime<Utc>,
}

/// One booking negotiation between a host and a requester.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Match {
    /// Match identifier.
    pub id: MatchId,
    /// The experience being booked.
    pub experience_id: uuid::Uuid,
    /// Hosting party (owner of the experience).
    pub host_id: UserId,
    /// Requesting party. Never equal to `host_id`.
    pub requester_id: UserId,
    /// Current lifecycle status.
    pub status: MatchStatus,
    /// Party size, at least 1.
    pub participants: u32,
    /// `price_per_person × participants` for fee-bearing kinds; `None`
    /// for pure exchange experiences.
    #[schema(value_type = Option<String>)]
    pub total_price: Option<Decimal>,
    /// Scheduled start. May stay unset until the parties agree on a date.
    pub start_date: Option<DateTime<Utc>>,
    /// Per-party platform fee captured at acceptance.
    #[schema(value_type = Option<String>)]
    pub fee_charged: Option<Decimal>,
    /// Refund issued on cancellation or dispute resolution.
    pub refund: Option<RefundRecord>,
    /// Dispute whose resolution overrode the natural outcome, if any.
    pub dispute: Option<DisputeId>,
    /// System- or host-supplied reason for a rejection.
    pub reject_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status mutation.
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// Creates a pending match. Relation preconditions (requester ≠ host,
    /// ban checks, capacity) are the service's job; this constructor only
    /// shapes the row.
    #[must_use]
    pub fn new(
        experience_id: uuid::Uuid,
        host_id: UserId,
        requester_id: UserId,
        participants: u32,
        total_price: Option<Decimal>,
        start_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MatchId::new(),
            experience_id,
            host_id,
            requester_id,
            status: MatchStatus::Pending,
            participants,
            total_price,
            start_date,
            fee_charged: None,
            refund: None,
            dispute: None,
            reject_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the user is one of the two parties.
    #[must_use]
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.host_id == user_id || self.requester_id == user_id
    }

    /// Stamps `updated_at`. Call after every status mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Lightweight match view for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Match identifier.
    pub id: MatchId,
    /// The experience being booked.
    pub experience_id: uuid::Uuid,
    /// Hosting party.
    pub host_id: UserId,
    /// Requesting party.
    pub requester_id: UserId,
    /// Current status.
    pub status: MatchStatus,
    /// Party size.
    pub participants: u32,
    /// Total price, if priced.
    #[schema(value_type = Option<String>)]
    pub total_price: Option<Decimal>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Match> for MatchSummary {
    fn from(m: &Match) -> Self {
        Self {
            id: m.id,
            experience_id: m.experience_id,
            host_id: m.host_id,
            requester_id: m.requester_id,
            status: m.status,
            participants: m.participants,
            total_price: m.total_price,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_match() -> Match {
        Match::new(
            uuid::Uuid::new_v4(),
            UserId::new(),
            UserId::new(),
            2,
            Some(Decimal::new(9000, 2)),
            None,
        )
    }

    #[test]
    fn new_match_is_pending() {
        let m = make_match();
        assert_eq!(m.status, MatchStatus::Pending);
        assert!(m.fee_charged.is_none());
        assert!(m.refund.is_none());
        assert_eq!(m.created_at, m.updated_at);
    }

    #[test]
    fn terminal_states() {
        assert!(!MatchStatus::Pending.is_terminal());
        assert!(!MatchStatus::Accepted.is_terminal());
        assert!(MatchStatus::Rejected.is_terminal());
        assert!(MatchStatus::Cancelled.is_terminal());
        assert!(MatchStatus::Completed.is_terminal());
    }

    #[test]
    fn participants_are_both_parties_only() {
        let m = make_match();
        assert!(m.is_participant(m.host_id));
        assert!(m.is_participant(m.requester_id));
        assert!(!m.is_participant(UserId::new()));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&MatchStatus::Accepted).ok();
        assert_eq!(json.as_deref(), Some("\"accepted\""));
        assert_eq!(MatchStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn summary_reflects_match() {
        let m = make_match();
        let summary = MatchSummary::from(&m);
        assert_eq!(summary.id, m.id);
        assert_eq!(summary.status, MatchStatus::Pending);
        assert_eq!(summary.total_price, m.total_price);
    }
}
