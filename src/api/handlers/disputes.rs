//! Dispute handlers: open, inspect, review, and resolve.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{DisputeListParams, OpenDisputeRequest, ResolveDisputeRequest};
use crate::api::handlers::admin_attribution;
use crate::app_state::AppState;
use crate::domain::dispute::Dispute;
use crate::domain::ids::{DisputeId, MatchId, UserId};
use crate::error::{CoreError, ErrorResponse};

/// `POST /matches/{id}/disputes` — Open a dispute against a match.
///
/// # Errors
///
/// Returns [`CoreError`] for a non-participant opener, a match outside
/// the disputable states or resolution window, or an existing active
/// dispute.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/disputes",
    tag = "Disputes",
    summary = "Open a dispute",
    params(("id" = uuid::Uuid, Path, description = "Match UUID")),
    request_body = OpenDisputeRequest,
    responses(
        (status = 201, description = "Dispute opened", body = Dispute),
        (status = 409, description = "Active dispute already exists", body = ErrorResponse),
        (status = 403, description = "Opener is not a participant", body = ErrorResponse),
    )
)]
pub async fn open_dispute(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<OpenDisputeRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let dispute = state
        .dispute_service
        .open(
            MatchId::from_uuid(id),
            UserId::from_uuid(req.opener_id),
            req.reason,
            req.description,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(dispute)))
}

/// `GET /disputes/{id}` — Fetch one dispute.
///
/// # Errors
///
/// Returns [`CoreError::DisputeNotFound`] for an unknown dispute.
#[utoipa::path(
    get,
    path = "/api/v1/disputes/{id}",
    tag = "Disputes",
    summary = "Get a dispute",
    params(("id" = uuid::Uuid, Path, description = "Dispute UUID")),
    responses(
        (status = 200, description = "The dispute", body = Dispute),
        (status = 404, description = "Dispute not found", body = ErrorResponse),
    )
)]
pub async fn get_dispute(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let dispute = state.dispute_service.get(DisputeId::from_uuid(id)).await?;
    Ok(Json(dispute))
}

/// `GET /disputes` — Admin listing of disputes.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRequest`] when attribution is missing.
#[utoipa::path(
    get,
    path = "/api/v1/disputes",
    tag = "Disputes",
    summary = "List disputes",
    params(
        DisputeListParams,
        ("X-Admin-Id" = String, Header, description = "Acting admin UUID for audit"),
    ),
    responses(
        (status = 200, description = "Disputes, newest first", body = Vec<Dispute>),
    )
)]
pub async fn list_disputes(
    State(state): State<AppState>,
    Query(params): Query<DisputeListParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CoreError> {
    let _admin_id = admin_attribution(&headers)?;
    let disputes = state.dispute_service.list(params.status).await;
    Ok(Json(disputes))
}

/// `POST /disputes/{id}/review` — Admin takes a dispute under review.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTransition`] unless the dispute is open,
/// or [`CoreError::InvalidRequest`] when attribution is missing.
#[utoipa::path(
    post,
    path = "/api/v1/disputes/{id}/review",
    tag = "Disputes",
    summary = "Mark a dispute under review",
    params(
        ("id" = uuid::Uuid, Path, description = "Dispute UUID"),
        ("X-Admin-Id" = String, Header, description = "Acting admin UUID for audit"),
    ),
    responses(
        (status = 200, description = "Dispute under review", body = Dispute),
        (status = 409, description = "Dispute is not open", body = ErrorResponse),
    )
)]
pub async fn review_dispute(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CoreError> {
    let admin_id = admin_attribution(&headers)?;
    let dispute = state
        .dispute_service
        .mark_under_review(DisputeId::from_uuid(id), admin_id)
        .await?;
    Ok(Json(dispute))
}

/// `POST /disputes/{id}/resolve` — Terminally resolve a dispute.
///
/// Refund, trust penalty, and status flip are one unit; a second call on
/// the same dispute returns 409 and never issues a second refund.
///
/// # Errors
///
/// Returns [`CoreError`] for inconsistent wire fields, a terminated
/// dispute, or missing attribution.
#[utoipa::path(
    post,
    path = "/api/v1/disputes/{id}/resolve",
    tag = "Disputes",
    summary = "Resolve a dispute",
    params(
        ("id" = uuid::Uuid, Path, description = "Dispute UUID"),
        ("X-Admin-Id" = String, Header, description = "Acting admin UUID for audit"),
    ),
    request_body = ResolveDisputeRequest,
    responses(
        (status = 200, description = "Dispute resolved", body = Dispute),
        (status = 409, description = "Already resolved", body = ErrorResponse),
        (status = 400, description = "Inconsistent resolution fields", body = ErrorResponse),
    )
)]
pub async fn resolve_dispute(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
    Json(req): Json<ResolveDisputeRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let admin_id = admin_attribution(&headers)?;
    let (resolution, admin_action) = req.to_domain()?;
    let dispute = state
        .dispute_service
        .resolve(
            DisputeId::from_uuid(id),
            resolution,
            admin_action,
            admin_id,
            req.admin_notes,
        )
        .await?;
    Ok(Json(dispute))
}

/// Dispute routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches/{id}/disputes", post(open_dispute))
        .route("/disputes", get(list_disputes))
        .route("/disputes/{id}", get(get_dispute))
        .route("/disputes/{id}/review", post(review_dispute))
        .route("/disputes/{id}/resolve", post(resolve_dispute))
}
