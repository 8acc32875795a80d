//! Admin trust actions and internal push boundaries.
//!
//! `/admin/*` routes apply strikes and bans outside a dispute and are
//! attributed via `X-Admin-Id`. `/internal/*` routes are the push
//! boundary where the external listing and user services mirror their
//! state into this core; they are mounted at the root, outside the
//! public `/api/v1` prefix, and fronted by network policy in deployment.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::handlers::admin_attribution;
use crate::app_state::AppState;
use crate::domain::dispute::AdminAction;
use crate::domain::experience::ExperienceInfo;
use crate::domain::ids::UserId;
use crate::domain::user::{UserAccount, UserRole};
use crate::error::{CoreError, ErrorResponse};

/// Trust state returned after an admin action.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrustResponse {
    /// The affected user.
    pub user_id: UserId,
    /// Strike count after the action.
    pub strikes: u8,
    /// Ban timestamp, if banned.
    pub banned_at: Option<DateTime<Utc>>,
}

/// Request body for `PUT /internal/users/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertUserRequest {
    /// Role at the user service.
    pub role: UserRole,
    /// Strike count carried over.
    #[serde(default)]
    pub strikes: u8,
    /// Ban timestamp carried over.
    #[serde(default)]
    pub banned_at: Option<DateTime<Utc>>,
}

/// `POST /admin/users/{id}/strike` — Apply one strike.
///
/// The third strike bans the user in the same operation.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRequest`] when attribution is missing.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/strike",
    tag = "Admin",
    summary = "Strike a user",
    params(
        ("id" = uuid::Uuid, Path, description = "Target user UUID"),
        ("X-Admin-Id" = String, Header, description = "Acting admin UUID for audit"),
    ),
    responses(
        (status = 200, description = "Strike applied", body = TrustResponse),
        (status = 400, description = "Missing attribution", body = ErrorResponse),
    )
)]
pub async fn strike_user(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CoreError> {
    let admin_id = admin_attribution(&headers)?;
    let user_id = UserId::from_uuid(id);
    state
        .dispute_service
        .apply_admin_action(AdminAction::Strike { user_id })
        .await;
    tracing::info!(%admin_id, %user_id, "strike applied by admin");
    trust_response(&state, user_id).await
}

/// `POST /admin/users/{id}/ban` — Ban a user immediately.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRequest`] when attribution is missing.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/ban",
    tag = "Admin",
    summary = "Ban a user",
    params(
        ("id" = uuid::Uuid, Path, description = "Target user UUID"),
        ("X-Admin-Id" = String, Header, description = "Acting admin UUID for audit"),
    ),
    responses(
        (status = 200, description = "User banned", body = TrustResponse),
        (status = 400, description = "Missing attribution", body = ErrorResponse),
    )
)]
pub async fn ban_user(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CoreError> {
    let admin_id = admin_attribution(&headers)?;
    let user_id = UserId::from_uuid(id);
    state
        .dispute_service
        .apply_admin_action(AdminAction::Ban { user_id })
        .await;
    tracing::warn!(%admin_id, %user_id, "user banned by admin");
    trust_response(&state, user_id).await
}

async fn trust_response(
    state: &AppState,
    user_id: UserId,
) -> Result<Json<TrustResponse>, CoreError> {
    let account = state
        .users
        .get(user_id)
        .await
        .ok_or(CoreError::UserNotFound(user_id))?;
    Ok(Json(TrustResponse {
        user_id,
        strikes: account.strikes,
        banned_at: account.banned_at,
    }))
}

/// `PUT /internal/experiences/{id}` — Listing service pushes pricing facts.
#[utoipa::path(
    put,
    path = "/internal/experiences/{id}",
    tag = "Internal",
    summary = "Upsert a catalog entry",
    description = "Push boundary for the experience-listing service: host, kind, per-person price, and capacity for one experience.",
    params(("id" = uuid::Uuid, Path, description = "Experience UUID")),
    request_body = ExperienceInfo,
    responses(
        (status = 204, description = "Catalog entry stored"),
    )
)]
pub async fn upsert_experience(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(info): Json<ExperienceInfo>,
) -> impl IntoResponse {
    state.catalog.upsert(id, info).await;
    StatusCode::NO_CONTENT
}

/// `PUT /internal/users/{id}` — User service pushes trust state.
#[utoipa::path(
    put,
    path = "/internal/users/{id}",
    tag = "Internal",
    summary = "Upsert a user's trust state",
    params(("id" = uuid::Uuid, Path, description = "User UUID")),
    request_body = UpsertUserRequest,
    responses(
        (status = 204, description = "Trust state stored"),
    )
)]
pub async fn upsert_user(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpsertUserRequest>,
) -> impl IntoResponse {
    let user_id = UserId::from_uuid(id);
    state
        .users
        .upsert(UserAccount {
            id: user_id,
            role: req.role,
            strikes: req.strikes,
            banned_at: req.banned_at,
        })
        .await;
    StatusCode::NO_CONTENT
}

/// Admin routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users/{id}/strike", post(strike_user))
        .route("/admin/users/{id}/ban", post(ban_user))
}

/// Internal push routes, mounted at the root.
pub fn internal_routes() -> Router<AppState> {
    Router::new()
        .route("/internal/experiences/{id}", put(upsert_experience))
        .route("/internal/users/{id}", put(upsert_user))
}
