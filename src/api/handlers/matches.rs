//! Match lifecycle handlers: create, list, get, and the four transitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CompleteRequest, CreateMatchRequest, MatchListParams, MatchListResponse, PaginationMeta,
    PaginationParams, RejectRequest, TransitionRequest,
};
use crate::app_state::AppState;
use crate::domain::booking::Match;
use crate::domain::ids::{MatchId, UserId};
use crate::domain::match_registry::MatchFilter;
use crate::error::{CoreError, ErrorResponse};

/// `POST /matches` — Request a booking.
///
/// # Errors
///
/// Returns [`CoreError`] on unknown experience, self-booking, capacity or
/// funding problems, or a banned requester.
#[utoipa::path(
    post,
    path = "/api/v1/matches",
    tag = "Matches",
    summary = "Request a booking",
    description = "Creates a pending match for an experience. No money moves; the requester's capacity to pay the platform fee is checked optimistically for fee-bearing experience kinds.",
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match created", body = Match),
        (status = 404, description = "Experience not found", body = ErrorResponse),
        (status = 403, description = "Requester is banned", body = ErrorResponse),
        (status = 422, description = "Wallet cannot cover the fee", body = ErrorResponse),
    )
)]
pub async fn create_match(
    State(state): State<AppState>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let m = state
        .match_service
        .create(
            UserId::from_uuid(req.requester_id),
            req.experience_id,
            req.participants,
            req.start_date,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(m)))
}

/// `GET /matches` — List matches with pagination and filters.
#[utoipa::path(
    get,
    path = "/api/v1/matches",
    tag = "Matches",
    summary = "List matches",
    description = "Returns a paginated list of match summaries, optionally filtered by status or participant.",
    params(MatchListParams),
    responses(
        (status = 200, description = "Paginated match list", body = MatchListResponse),
    )
)]
pub async fn list_matches(
    State(state): State<AppState>,
    Query(params): Query<MatchListParams>,
) -> impl IntoResponse {
    let filter = MatchFilter {
        status: params.status,
        participant: params.participant.map(UserId::from_uuid),
    };
    let all = state.match_service.list(filter).await;

    let pagination = PaginationParams {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(20),
    }
    .clamped();
    let meta = PaginationMeta::for_total(&pagination, all.len());
    let start = (pagination.page.saturating_sub(1) as usize) * pagination.per_page as usize;
    let matches = all
        .into_iter()
        .skip(start)
        .take(pagination.per_page as usize)
        .collect();

    Json(MatchListResponse {
        matches,
        pagination: meta,
    })
}

/// `GET /matches/{id}` — Fetch one match.
///
/// # Errors
///
/// Returns [`CoreError::MatchNotFound`] for an unknown match.
#[utoipa::path(
    get,
    path = "/api/v1/matches/{id}",
    tag = "Matches",
    summary = "Get a match",
    params(("id" = uuid::Uuid, Path, description = "Match UUID")),
    responses(
        (status = 200, description = "The match", body = Match),
        (status = 404, description = "Match not found", body = ErrorResponse),
    )
)]
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let m = state.match_service.get(MatchId::from_uuid(id)).await?;
    Ok(Json(m))
}

/// `POST /matches/{id}/accept` — Host accepts a pending match.
///
/// For fee-bearing experience kinds this charges both parties the
/// platform fee atomically with the status flip; a 422 response means the
/// match is still pending and the named wallet needs a top-up.
///
/// # Errors
///
/// Returns [`CoreError`] on an illegal transition, a non-host caller, a
/// banned host, or a funding failure.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/accept",
    tag = "Matches",
    summary = "Accept a match",
    params(("id" = uuid::Uuid, Path, description = "Match UUID")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Match accepted, fee captured", body = Match),
        (status = 409, description = "Match is not pending", body = ErrorResponse),
        (status = 422, description = "Funding failed; top up and retry", body = ErrorResponse),
    )
)]
pub async fn accept_match(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let m = state
        .match_service
        .accept(MatchId::from_uuid(id), UserId::from_uuid(req.user_id))
        .await?;
    Ok(Json(m))
}

/// `POST /matches/{id}/reject` — Host declines a pending match.
///
/// # Errors
///
/// Returns [`CoreError`] on an illegal transition or a non-host caller.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/reject",
    tag = "Matches",
    summary = "Reject a match",
    params(("id" = uuid::Uuid, Path, description = "Match UUID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Match rejected", body = Match),
        (status = 409, description = "Match is not pending", body = ErrorResponse),
    )
)]
pub async fn reject_match(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let m = state
        .match_service
        .reject(
            MatchId::from_uuid(id),
            UserId::from_uuid(req.user_id),
            req.reason,
        )
        .await?;
    Ok(Json(m))
}

/// `POST /matches/{id}/cancel` — Either party cancels.
///
/// Cancelling an accepted match refunds the requester's fee at the
/// policy percentage; the percentage and amount are recorded on the
/// returned match.
///
/// # Errors
///
/// Returns [`CoreError`] on an illegal transition or a non-participant
/// caller.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/cancel",
    tag = "Matches",
    summary = "Cancel a match",
    params(("id" = uuid::Uuid, Path, description = "Match UUID")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Match cancelled", body = Match),
        (status = 409, description = "Match is terminal", body = ErrorResponse),
        (status = 403, description = "Caller is not a participant", body = ErrorResponse),
    )
)]
pub async fn cancel_match(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let m = state
        .match_service
        .cancel(MatchId::from_uuid(id), UserId::from_uuid(req.user_id))
        .await?;
    Ok(Json(m))
}

/// `POST /matches/{id}/complete` — Mark an accepted match completed.
///
/// Omit `user_id` for system completion (requires the start date to have
/// passed); the host may complete at any time.
///
/// # Errors
///
/// Returns [`CoreError`] on an illegal transition or a premature
/// completion without a host override.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/complete",
    tag = "Matches",
    summary = "Complete a match",
    params(("id" = uuid::Uuid, Path, description = "Match UUID")),
    request_body = CompleteRequest,
    responses(
        (status = 200, description = "Match completed", body = Match),
        (status = 409, description = "Match is not accepted or has not started", body = ErrorResponse),
    )
)]
pub async fn complete_match(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CompleteRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let m = state
        .match_service
        .complete(MatchId::from_uuid(id), req.user_id.map(UserId::from_uuid))
        .await?;
    Ok(Json(m))
}

/// Match routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches", post(create_match).get(list_matches))
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/accept", post(accept_match))
        .route("/matches/{id}/reject", post(reject_match))
        .route("/matches/{id}/cancel", post(cancel_match))
        .route("/matches/{id}/complete", post(complete_match))
}
