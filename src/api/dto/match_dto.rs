//! Match endpoint DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::booking::{MatchStatus, MatchSummary};

/// Request body for `POST /matches`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMatchRequest {
    /// The traveler requesting the booking.
    pub requester_id: uuid::Uuid,
    /// The experience to book.
    pub experience_id: uuid::Uuid,
    /// Party size, at least 1.
    pub participants: u32,
    /// Proposed start, if the parties already agreed on a date.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
}

/// Request body for transitions acted by one identified party
/// (`accept`, `cancel`).
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// The acting user.
    pub user_id: uuid::Uuid,
}

/// Request body for `POST /matches/{id}/reject`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequest {
    /// The acting host.
    pub user_id: uuid::Uuid,
    /// Optional reason shown to the requester.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for `POST /matches/{id}/complete`.
///
/// `user_id` is absent when the system completes a past match.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteRequest {
    /// The acting participant, if any.
    #[serde(default)]
    pub user_id: Option<uuid::Uuid>,
}

/// Query parameters for `GET /matches`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct MatchListParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Only matches in this status.
    #[serde(default)]
    pub status: Option<MatchStatus>,
    /// Only matches this user participates in.
    #[serde(default)]
    pub participant: Option<uuid::Uuid>,
}

/// Response body for `GET /matches`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchListResponse {
    /// One page of match summaries, newest first.
    pub matches: Vec<MatchSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
