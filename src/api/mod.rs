//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; system and internal
//! push endpoints live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering the whole REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::matches::create_match,
        handlers::matches::list_matches,
        handlers::matches::get_match,
        handlers::matches::accept_match,
        handlers::matches::reject_match,
        handlers::matches::cancel_match,
        handlers::matches::complete_match,
        handlers::wallet::top_up,
        handlers::wallet::get_balance,
        handlers::wallet::list_transactions,
        handlers::wallet::reconcile,
        handlers::disputes::open_dispute,
        handlers::disputes::get_dispute,
        handlers::disputes::list_disputes,
        handlers::disputes::review_dispute,
        handlers::disputes::resolve_dispute,
        handlers::admin::strike_user,
        handlers::admin::ban_user,
        handlers::admin::upsert_experience,
        handlers::admin::upsert_user,
        handlers::system::health_handler,
        handlers::system::fees_handler,
    ),
    components(schemas(
        crate::domain::booking::Match,
        crate::domain::booking::MatchStatus,
        crate::domain::booking::MatchSummary,
        crate::domain::booking::RefundRecord,
        crate::domain::dispute::AdminAction,
        crate::domain::dispute::Dispute,
        crate::domain::dispute::DisputeStatus,
        crate::domain::dispute::Resolution,
        crate::domain::experience::ExperienceInfo,
        crate::domain::experience::ExperienceKind,
        crate::domain::transaction::TransactionKind,
        crate::domain::transaction::TransactionStatus,
        crate::domain::transaction::WalletTransaction,
        crate::domain::user::UserAccount,
        crate::domain::user::UserRole,
        crate::error::ErrorBody,
        crate::error::ErrorResponse,
        dto::CreateMatchRequest,
        dto::MatchListResponse,
        dto::OpenDisputeRequest,
        dto::ResolveDisputeRequest,
        dto::TopUpRequest,
        dto::TopUpResponse,
        dto::BalanceResponse,
        dto::TransactionListResponse,
        dto::ReconcileResponse,
        handlers::admin::TrustResponse,
        handlers::admin::UpsertUserRequest,
        handlers::system::FeesResponse,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "Matches", description = "Booking lifecycle"),
        (name = "Wallet", description = "Prepaid wallet ledger"),
        (name = "Disputes", description = "Dispute resolution"),
        (name = "Admin", description = "Trust actions"),
        (name = "Internal", description = "Service push boundaries"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(handlers::admin::internal_routes())
}
