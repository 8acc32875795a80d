//! Domain events reflecting core state mutations.
//!
//! Every committed transition publishes a [`MarketEvent`] through the
//! [`super::EventBus`]. The notifier task forwards them to the external
//! notification service and the persistence layer appends them to the
//! event log. Events are emitted after the owning transaction commits;
//! a consumer failure can never roll a transition back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::dispute::Resolution;
use super::ids::{DisputeId, MatchId, TxId, UserId};

/// Domain event emitted after every state mutation.
///
/// Money amounts serialize as decimal strings, so downstream consumers
/// never see float rounding.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A traveler requested a booking.
    MatchRequested {
        /// Match identifier.
        match_id: MatchId,
        /// The experience being booked.
        experience_id: uuid::Uuid,
        /// Hosting party.
        host_id: UserId,
        /// Requesting party.
        requester_id: UserId,
        /// Party size.
        participants: u32,
        /// Total price, if priced.
        total_price: Option<Decimal>,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The host accepted; for fee-bearing kinds both parties were charged.
    MatchAccepted {
        /// Match identifier.
        match_id: MatchId,
        /// Per-party fee charged, `None` for exchange experiences.
        fee: Option<Decimal>,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The host declined, or the request expired unanswered.
    MatchRejected {
        /// Match identifier.
        match_id: MatchId,
        /// `true` when the expiry sweep rejected the request.
        by_system: bool,
        /// Rejection reason, if supplied.
        reason: Option<String>,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Either party cancelled the match.
    MatchCancelled {
        /// Match identifier.
        match_id: MatchId,
        /// The cancelling party.
        cancelled_by: UserId,
        /// Refund percentage applied, when a fee had been captured.
        refund_percentage: Option<u8>,
        /// Refund amount credited, when a fee had been captured.
        refund_amount: Option<Decimal>,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The experience took place; reviews unlock downstream.
    MatchCompleted {
        /// Match identifier.
        match_id: MatchId,
        /// Completing party; `None` when completed by the system.
        completed_by: Option<UserId>,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A top-up credit was recorded after external capture.
    WalletToppedUp {
        /// Wallet owner.
        user_id: UserId,
        /// Credited amount.
        amount: Decimal,
        /// Ledger entry carrying the credit.
        tx_id: TxId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Both parties were debited the platform fee for a match.
    PlatformFeeCharged {
        /// The accepted match.
        match_id: MatchId,
        /// Hosting party.
        host_id: UserId,
        /// Requesting party.
        requester_id: UserId,
        /// Per-party fee amount.
        fee: Decimal,
        /// Ledger entry debiting the host.
        host_tx: TxId,
        /// Ledger entry debiting the requester.
        requester_tx: TxId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A refund credit was issued.
    RefundIssued {
        /// Refunded user.
        user_id: UserId,
        /// The match that caused the refund.
        match_id: MatchId,
        /// Credited amount.
        amount: Decimal,
        /// Human-readable reason.
        reason: String,
        /// Ledger entry carrying the credit.
        tx_id: TxId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A participant opened a dispute.
    DisputeOpened {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// The contested match.
        match_id: MatchId,
        /// The opener.
        opener_id: UserId,
        /// Short reason tag.
        reason: String,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An admin started reviewing a dispute.
    DisputeUnderReview {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// Reviewing admin, for audit.
        admin_id: UserId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A dispute terminated with a resolution.
    DisputeResolved {
        /// Dispute identifier.
        dispute_id: DisputeId,
        /// The contested match.
        match_id: MatchId,
        /// Final outcome.
        resolution: Resolution,
        /// Refund amount issued, when the resolution implied one.
        refund_amount: Option<Decimal>,
        /// Resolving admin, for audit.
        admin_id: UserId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A user received a strike.
    UserStruck {
        /// The struck user.
        user_id: UserId,
        /// Strike count after the increment.
        strikes: u8,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A user was banned, by threshold or by explicit admin action.
    UserBanned {
        /// The banned user.
        user_id: UserId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Returns the match this event concerns, if any.
    #[must_use]
    pub const fn match_id(&self) -> Option<MatchId> {
        match self {
            Self::MatchRequested { match_id, .. }
            | Self::MatchAccepted { match_id, .. }
            | Self::MatchRejected { match_id, .. }
            | Self::MatchCancelled { match_id, .. }
            | Self::MatchCompleted { match_id, .. }
            | Self::PlatformFeeCharged { match_id, .. }
            | Self::RefundIssued { match_id, .. }
            | Self::DisputeOpened { match_id, .. }
            | Self::DisputeResolved { match_id, .. } => Some(*match_id),
            Self::WalletToppedUp { .. }
            | Self::DisputeUnderReview { .. }
            | Self::UserStruck { .. }
            | Self::UserBanned { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::MatchRequested { .. } => "match_requested",
            Self::MatchAccepted { .. } => "match_accepted",
            Self::MatchRejected { .. } => "match_rejected",
            Self::MatchCancelled { .. } => "match_cancelled",
            Self::MatchCompleted { .. } => "match_completed",
            Self::WalletToppedUp { .. } => "wallet_topped_up",
            Self::PlatformFeeCharged { .. } => "platform_fee_charged",
            Self::RefundIssued { .. } => "refund_issued",
            Self::DisputeOpened { .. } => "dispute_opened",
            Self::DisputeUnderReview { .. } => "dispute_under_review",
            Self::DisputeResolved { .. } => "dispute_resolved",
            Self::UserStruck { .. } => "user_struck",
            Self::UserBanned { .. } => "user_banned",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn match_accepted_event_type() {
        let event = MarketEvent::MatchAccepted {
            match_id: MatchId::new(),
            fee: Some(Decimal::new(150, 2)),
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "match_accepted");
    }

    #[test]
    fn refund_event_serializes_decimal_as_string() {
        let event = MarketEvent::RefundIssued {
            user_id: UserId::new(),
            match_id: MatchId::new(),
            amount: Decimal::new(4500, 2),
            reason: "dispute resolution".to_string(),
            tx_id: TxId::new(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event);
        assert!(json.is_ok());
        let json_str = json.unwrap_or_default();
        assert!(json_str.contains("refund_issued"));
        assert!(json_str.contains("\"45.00\""));
    }

    #[test]
    fn match_id_accessor() {
        let id = MatchId::new();
        let event = MarketEvent::MatchCompleted {
            match_id: id,
            completed_by: None,
            timestamp: Utc::now(),
        };
        assert_eq!(event.match_id(), Some(id));

        let unrelated = MarketEvent::UserBanned {
            user_id: UserId::new(),
            timestamp: Utc::now(),
        };
        assert_eq!(unrelated.match_id(), None);
    }
}
