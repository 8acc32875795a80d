//! System endpoints: health check and fee configuration.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use axum::extract::State;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Fee configuration visible to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeesResponse {
    /// Fixed per-party fee charged when a match is accepted.
    platform_fee: String,
    /// Minimum accepted top-up amount.
    min_top_up: String,
    /// Currency all amounts are denominated in.
    currency: &'static str,
}

/// `GET /config/fees` — Current fee configuration.
#[utoipa::path(
    get,
    path = "/config/fees",
    tag = "System",
    summary = "Fee configuration",
    description = "Returns the platform fee and minimum top-up so clients can render funding prompts.",
    responses(
        (status = 200, description = "Fee configuration", body = FeesResponse),
    )
)]
pub async fn fees_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(FeesResponse {
            platform_fee: state.wallet_service.platform_fee().to_string(),
            min_top_up: state.wallet_service.min_top_up().to_string(),
            currency: "EUR",
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/fees", get(fees_handler))
}
