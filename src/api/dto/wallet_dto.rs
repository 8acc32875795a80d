//! Wallet endpoint DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::ids::{TxId, UserId};
use crate::domain::transaction::{TransactionKind, WalletTransaction};

/// Request body for `POST /wallet/{user_id}/topup`.
///
/// The external card capture has already succeeded upstream; this call
/// records the resulting credit.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TopUpRequest {
    /// Amount to credit; must meet the configured minimum.
    #[schema(value_type = String)]
    pub amount: Decimal,
}

/// Response body for `POST /wallet/{user_id}/topup`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TopUpResponse {
    /// Ledger entry carrying the credit.
    pub tx_id: TxId,
    /// Wallet owner.
    pub user_id: UserId,
    /// Credited amount.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Balance after the credit.
    #[schema(value_type = String)]
    pub balance: Decimal,
    /// Recording timestamp.
    pub recorded_at: DateTime<Utc>,
}

/// Response body for `GET /wallet/{user_id}/balance`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Wallet owner.
    pub user_id: UserId,
    /// Cached balance.
    #[schema(value_type = String)]
    pub balance: Decimal,
    /// Whether the balance covers the platform fee.
    pub can_operate: bool,
    /// Read timestamp.
    pub as_of: DateTime<Utc>,
}

/// Query parameters for `GET /wallet/{user_id}/transactions`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionListParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Only entries of this kind.
    #[serde(default)]
    pub kind: Option<TransactionKind>,
}

/// Response body for `GET /wallet/{user_id}/transactions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    /// One page of ledger entries, newest first.
    pub transactions: Vec<WalletTransaction>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `POST /wallet/{user_id}/reconcile`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileResponse {
    /// Wallet owner.
    pub user_id: UserId,
    /// Balance recomputed from the transaction log; matches the cached
    /// balance, or the request would have failed with an integrity fault.
    #[schema(value_type = String)]
    pub balance: Decimal,
    /// Audit timestamp.
    pub checked_at: DateTime<Utc>,
}
