//! The dispute aggregate: a formal contest over a match's outcome.
//!
//! Resolutions and admin penalties were loosely-typed strings upstream;
//! here they are closed sum types with their required fields enforced at
//! construction — a partial refund cannot exist without a percentage, and
//! a strike cannot exist without a target user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{DisputeId, MatchId, UserId};
use crate::error::CoreError;

/// Lifecycle status of a dispute: `open → under_review → resolved | closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Opened by a participant, awaiting admin attention.
    Open,
    /// An admin has started working the case.
    UnderReview,
    /// Terminally decided with a [`Resolution`].
    Resolved,
    /// Terminally dismissed without a decision on the merits.
    Closed,
}

impl DisputeStatus {
    /// Returns `true` once the dispute can never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// Lower-case status name, as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::UnderReview => "under_review",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

/// Outcome of a resolved dispute.
///
/// The refund percentage is part of the variant, not a sibling field, so
/// an inconsistent combination (full refund with 30%, partial refund with
/// no percentage) is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// Full refund of the match's total price to the paying party.
    Refund,
    /// Partial refund; `percentage` is strictly between 0 and 100.
    PartialRefund {
        /// Share of the total price to refund, 1–99.
        percentage: u8,
    },
    /// Dispute decided against the opener; no money moves.
    NoRefund,
    /// Dismissed without a decision on the merits; no money moves.
    Closed,
}

impl Resolution {
    /// Builds a partial-refund resolution.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] unless `0 < percentage < 100`
    /// (use [`Resolution::Refund`] for 100, [`Resolution::NoRefund`] for 0).
    pub fn partial(percentage: u8) -> Result<Self, CoreError> {
        if percentage == 0 || percentage >= 100 {
            return Err(CoreError::InvalidRequest(format!(
                "partial refund percentage must be between 1 and 99, got {percentage}"
            )));
        }
        Ok(Self::PartialRefund { percentage })
    }

    /// Percentage of the total price to refund, or `None` when the
    /// resolution moves no money.
    #[must_use]
    pub const fn refund_percentage(&self) -> Option<u8> {
        match self {
            Self::Refund => Some(100),
            Self::PartialRefund { percentage } => Some(*percentage),
            Self::NoRefund | Self::Closed => None,
        }
    }
}

/// Penalty applied to the at-fault user as part of a resolution.
///
/// The target user travels inside the variant so a penalty can never be
/// recorded without knowing who it hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    /// No penalty.
    None,
    /// Formal warning, recorded but without trust consequences here.
    Warning {
        /// The warned user.
        user_id: UserId,
    },
    /// One strike; the third strike bans automatically.
    Strike {
        /// The struck user.
        user_id: UserId,
    },
    /// Immediate ban regardless of strike count.
    Ban {
        /// The banned user.
        user_id: UserId,
    },
    /// The offending listing content is removed (handled by the listing
    /// service; recorded here for audit).
    RemoveContent,
}

impl AdminAction {
    /// The user the penalty targets, if any.
    #[must_use]
    pub const fn target(&self) -> Option<UserId> {
        match self {
            Self::Warning { user_id } | Self::Strike { user_id } | Self::Ban { user_id } => {
                Some(*user_id)
            }
            Self::None | Self::RemoveContent => None,
        }
    }
}

/// A formal contest over a match's outcome.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Dispute {
    /// Dispute identifier.
    pub id: DisputeId,
    /// The contested match.
    pub match_id: MatchId,
    /// The participant who opened the dispute.
    pub opener_id: UserId,
    /// Short machine-friendly reason (e.g. `"no_show"`).
    pub reason: String,
    /// Free-form account of what happened.
    pub description: String,
    /// Lifecycle status.
    pub status: DisputeStatus,
    /// Final outcome; set exactly once, when the dispute terminates.
    pub resolution: Option<Resolution>,
    /// Penalty applied at resolution time.
    pub admin_action: Option<AdminAction>,
    /// Admin who resolved the dispute, for audit attribution.
    pub resolved_by: Option<UserId>,
    /// Admin notes attached at resolution time.
    pub admin_notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    /// Opens a new dispute in `open` status.
    #[must_use]
    pub fn new(match_id: MatchId, opener_id: UserId, reason: String, description: String) -> Self {
        Self {
            id: DisputeId::new(),
            match_id,
            opener_id,
            reason,
            description,
            status: DisputeStatus::Open,
            resolution: None,
            admin_action: None,
            resolved_by: None,
            admin_notes: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}
