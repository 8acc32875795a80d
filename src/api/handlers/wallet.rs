//! Wallet handlers: top-up, balance, history, and reconciliation.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    BalanceResponse, PaginationMeta, PaginationParams, ReconcileResponse, TopUpRequest,
    TopUpResponse, TransactionListParams, TransactionListResponse,
};
use crate::api::handlers::admin_attribution;
use crate::app_state::AppState;
use crate::domain::ids::UserId;
use crate::error::{CoreError, ErrorResponse};

/// `POST /wallet/{user_id}/topup` — Record a top-up credit.
///
/// The external card capture already succeeded upstream; this endpoint
/// only books the resulting credit.
///
/// # Errors
///
/// Returns [`CoreError::BelowMinimum`] if the amount is under the
/// configured minimum.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/{user_id}/topup",
    tag = "Wallet",
    summary = "Record a top-up",
    params(("user_id" = uuid::Uuid, Path, description = "Wallet owner UUID")),
    request_body = TopUpRequest,
    responses(
        (status = 201, description = "Credit recorded", body = TopUpResponse),
        (status = 400, description = "Amount below minimum", body = ErrorResponse),
    )
)]
pub async fn top_up(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    Json(req): Json<TopUpRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let user_id = UserId::from_uuid(user_id);
    let tx_id = state.wallet_service.top_up(user_id, req.amount).await?;
    let balance = state.wallet_service.balance(user_id).await;
    Ok((
        StatusCode::CREATED,
        Json(TopUpResponse {
            tx_id,
            user_id,
            amount: req.amount,
            balance,
            recorded_at: Utc::now(),
        }),
    ))
}

/// `GET /wallet/{user_id}/balance` — Cached balance and fee capacity.
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}/balance",
    tag = "Wallet",
    summary = "Get wallet balance",
    params(("user_id" = uuid::Uuid, Path, description = "Wallet owner UUID")),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let user_id = UserId::from_uuid(user_id);
    let balance = state.wallet_service.balance(user_id).await;
    let can_operate = state.wallet_service.can_operate(user_id).await;
    Json(BalanceResponse {
        user_id,
        balance,
        can_operate,
        as_of: Utc::now(),
    })
}

/// `GET /wallet/{user_id}/transactions` — Paginated ledger history.
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}/transactions",
    tag = "Wallet",
    summary = "List wallet transactions",
    description = "Returns the user's ledger entries newest first, optionally filtered by kind.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Wallet owner UUID"),
        TransactionListParams,
    ),
    responses(
        (status = 200, description = "Paginated transaction list", body = TransactionListResponse),
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    Query(params): Query<TransactionListParams>,
) -> impl IntoResponse {
    let pagination = PaginationParams {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(20),
    }
    .clamped();
    let page = state
        .wallet_service
        .transactions(
            UserId::from_uuid(user_id),
            pagination.page as usize,
            pagination.per_page as usize,
            params.kind,
        )
        .await;
    let meta = PaginationMeta::for_total(&pagination, page.total);
    Json(TransactionListResponse {
        transactions: page.items,
        pagination: meta,
    })
}

/// `POST /wallet/{user_id}/reconcile` — Audit the cached balance.
///
/// Admin-only (attributed via `X-Admin-Id`). Recomputes the balance from
/// the transaction log; a divergence is reported as an integrity fault
/// and freezes the account for further debits.
///
/// # Errors
///
/// Returns [`CoreError::IntegrityFault`] on divergence, or
/// [`CoreError::InvalidRequest`] when attribution is missing.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/{user_id}/reconcile",
    tag = "Wallet",
    summary = "Reconcile a wallet",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Wallet owner UUID"),
        ("X-Admin-Id" = String, Header, description = "Acting admin UUID for audit"),
    ),
    responses(
        (status = 200, description = "Ledger and cache agree", body = ReconcileResponse),
        (status = 500, description = "Divergence detected; account frozen", body = ErrorResponse),
    )
)]
pub async fn reconcile(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CoreError> {
    let admin_id = admin_attribution(&headers)?;
    let user_id = UserId::from_uuid(user_id);
    let balance = state.wallet_service.reconcile(user_id).await?;
    tracing::info!(%admin_id, %user_id, %balance, "wallet reconciled by admin");
    Ok(Json(ReconcileResponse {
        user_id,
        balance,
        checked_at: Utc::now(),
    }))
}

/// Wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet/{user_id}/topup", post(top_up))
        .route("/wallet/{user_id}/balance", get(get_balance))
        .route("/wallet/{user_id}/transactions", get(list_transactions))
        .route("/wallet/{user_id}/reconcile", post(reconcile))
}
