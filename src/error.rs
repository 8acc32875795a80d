//! Core error types with HTTP status code mapping.
//!
//! [`CoreError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Funding failures carry their own code range so a client can distinguish
//! "top up and retry" from a generic rejection.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::ids::{DisputeId, MatchId, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4102,
///     "message": "funding failed: user ... cannot cover the 1.50 platform fee",
///     "details": "top up the wallet with at least 1.50 and retry"
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`CoreError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                 |
/// |-----------|----------------------|-----------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request             |
/// | 2000–2999 | Not Found            | 404 Not Found               |
/// | 3000–3999 | Server / Integrity   | 500 Internal Server Error   |
/// | 4000–4099 | Conflict             | 409 Conflict                |
/// | 4100–4199 | Funding (retryable)  | 422 Unprocessable Entity    |
/// | 4300–4399 | Forbidden            | 403 Forbidden               |
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Match with the given ID was not found.
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    /// Dispute with the given ID was not found.
    #[error("dispute not found: {0}")]
    DisputeNotFound(DisputeId),

    /// User with the given ID is not known to the registry.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Experience id is not present in the catalog.
    #[error("experience not found: {0}")]
    ExperienceNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A state-machine transition was attempted from a state that does not
    /// permit it. Reported, never retried.
    #[error("invalid transition: cannot {action} from status {status}")]
    InvalidTransition {
        /// The attempted action (e.g. `"accept"`).
        action: &'static str,
        /// The status the entity was actually in.
        status: String,
    },

    /// A debit would push the user's balance below zero.
    #[error("insufficient funds: user {user_id} holds {available}, needs {required}")]
    InsufficientFunds {
        /// User whose balance was short.
        user_id: UserId,
        /// Balance at the time of the check.
        available: Decimal,
        /// Amount the debit required.
        required: Decimal,
    },

    /// The platform-fee charge during `accept` failed on one side.
    /// Retryable by the caller after the named user tops up.
    #[error("funding failed: user {user_id} cannot cover the {required} platform fee")]
    FundingFailed {
        /// The underfunded party.
        user_id: UserId,
        /// Fee amount that could not be covered.
        required: Decimal,
    },

    /// Top-up amount is below the configured minimum.
    #[error("top-up of {amount} is below the minimum of {minimum}")]
    BelowMinimum {
        /// Requested top-up amount.
        amount: Decimal,
        /// Configured minimum.
        minimum: Decimal,
    },

    /// The dispute has already been resolved or closed.
    #[error("dispute {0} is already resolved")]
    AlreadyResolved(DisputeId),

    /// A non-terminal dispute already exists for the match.
    #[error("match {0} already has an active dispute")]
    DuplicateDispute(MatchId),

    /// Cached balance diverged from the transaction log, or an operation
    /// touched an account frozen by a prior divergence. Debits on the
    /// affected user are halted until an operator intervenes.
    #[error("ledger integrity fault for user {user_id}: cached {cached}, log sum {recomputed}")]
    IntegrityFault {
        /// Affected user.
        user_id: UserId,
        /// Cached balance at fault time.
        cached: Decimal,
        /// Balance recomputed from the log.
        recomputed: Decimal,
    },

    /// The acting user is banned and may not create or accept matches.
    #[error("user {0} is banned")]
    UserBanned(UserId),

    /// The acting user is not a participant of the match.
    #[error("user {user_id} is not a participant of match {match_id}")]
    NotParticipant {
        /// The acting user.
        user_id: UserId,
        /// The match they tried to act on.
        match_id: MatchId,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::BelowMinimum { .. } => 1002,
            Self::MatchNotFound(_) => 2001,
            Self::DisputeNotFound(_) => 2002,
            Self::UserNotFound(_) => 2003,
            Self::ExperienceNotFound(_) => 2004,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::IntegrityFault { .. } => 3002,
            Self::InvalidTransition { .. } => 4001,
            Self::AlreadyResolved(_) => 4002,
            Self::DuplicateDispute(_) => 4003,
            Self::InsufficientFunds { .. } => 4101,
            Self::FundingFailed { .. } => 4102,
            Self::UserBanned(_) => 4301,
            Self::NotParticipant { .. } => 4302,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::BelowMinimum { .. } => StatusCode::BAD_REQUEST,
            Self::MatchNotFound(_)
            | Self::DisputeNotFound(_)
            | Self::UserNotFound(_)
            | Self::ExperienceNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. }
            | Self::AlreadyResolved(_)
            | Self::DuplicateDispute(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds { .. } | Self::FundingFailed { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::UserBanned(_) | Self::NotParticipant { .. } => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::IntegrityFault { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns an actionable hint for funding failures, `None` otherwise.
    ///
    /// Surfaced as the `details` field so a client can prompt a top-up
    /// instead of showing a generic failure.
    #[must_use]
    pub fn user_hint(&self) -> Option<String> {
        match self {
            Self::FundingFailed { required, .. } => Some(format!(
                "top up the wallet with at least {required} and retry"
            )),
            Self::InsufficientFunds {
                available,
                required,
                ..
            } => Some(format!(
                "balance {available} does not cover {required}; top up first"
            )),
            _ => None,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.user_hint(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
