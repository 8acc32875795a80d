//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{DisputeRow, MatchRow, StoredEvent, TransactionRow};
use crate::domain::booking::Match;
use crate::domain::dispute::Dispute;
use crate::domain::transaction::WalletTransaction;
use crate::error::CoreError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
///
/// Write-behind: the in-memory registries stay authoritative; rows here
/// mirror them for audit queries and restart recovery.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        match_id: Option<Uuid>,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, CoreError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (match_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(match_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CoreError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Inserts or updates the durable mirror of a match row.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn upsert_match(&self, m: &Match) -> Result<(), CoreError> {
        let refund = m
            .refund
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok());
        sqlx::query(
            "INSERT INTO matches \
             (id, experience_id, host_id, requester_id, status, participants, total_price, \
              start_date, fee_charged, refund, dispute_id, reject_reason, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (id) DO UPDATE SET \
             status = EXCLUDED.status, total_price = EXCLUDED.total_price, \
             start_date = EXCLUDED.start_date, fee_charged = EXCLUDED.fee_charged, \
             refund = EXCLUDED.refund, dispute_id = EXCLUDED.dispute_id, \
             reject_reason = EXCLUDED.reject_reason, updated_at = EXCLUDED.updated_at",
        )
        .bind(*m.id.as_uuid())
        .bind(m.experience_id)
        .bind(*m.host_id.as_uuid())
        .bind(*m.requester_id.as_uuid())
        .bind(m.status.as_str())
        .bind(i32::try_from(m.participants).unwrap_or(i32::MAX))
        .bind(m.total_price)
        .bind(m.start_date)
        .bind(m.fee_charged)
        .bind(refund)
        .bind(m.dispute.map(|d| *d.as_uuid()))
        .bind(m.reject_reason.as_deref())
        .bind(m.created_at)
        .bind(m.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::PersistenceError(e.to_string()))?;
        Ok(())
    }

    /// Inserts the durable mirror of a ledger entry. Entries are
    /// immutable, so a conflicting id is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn insert_transaction(&self, tx: &WalletTransaction) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO wallet_transactions \
             (id, user_id, kind, amount, related_match, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(*tx.id.as_uuid())
        .bind(*tx.user_id.as_uuid())
        .bind(tx.kind.as_str())
        .bind(tx.amount)
        .bind(tx.related_match.map(|m| *m.as_uuid()))
        .bind(tx.status.as_str())
        .bind(tx.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::PersistenceError(e.to_string()))?;
        Ok(())
    }

    /// Inserts or updates the durable mirror of a dispute row.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn upsert_dispute(&self, d: &Dispute) -> Result<(), CoreError> {
        let resolution = d
            .resolution
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok());
        let admin_action = d
            .admin_action
            .as_ref()
            .and_then(|a| serde_json::to_value(a).ok());
        sqlx::query(
            "INSERT INTO disputes \
             (id, match_id, opener_id, reason, description, status, resolution, admin_action, \
              resolved_by, admin_notes, created_at, resolved_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (id) DO UPDATE SET \
             status = EXCLUDED.status, resolution = EXCLUDED.resolution, \
             admin_action = EXCLUDED.admin_action, resolved_by = EXCLUDED.resolved_by, \
             admin_notes = EXCLUDED.admin_notes, resolved_at = EXCLUDED.resolved_at",
        )
        .bind(*d.id.as_uuid())
        .bind(*d.match_id.as_uuid())
        .bind(*d.opener_id.as_uuid())
        .bind(d.reason.as_str())
        .bind(d.description.as_str())
        .bind(d.status.as_str())
        .bind(resolution)
        .bind(admin_action)
        .bind(d.resolved_by.map(|u| *u.as_uuid()))
        .bind(d.admin_notes.as_deref())
        .bind(d.created_at)
        .bind(d.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::PersistenceError(e.to_string()))?;
        Ok(())
    }

    /// Loads all mirrored match rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn load_matches(&self) -> Result<Vec<MatchRow>, CoreError> {
        let rows = sqlx::query_as::<
            _,
            (
                Uuid,
                Uuid,
                Uuid,
                Uuid,
                String,
                i32,
                Option<Decimal>,
                Option<DateTime<Utc>>,
                Option<Decimal>,
                Option<serde_json::Value>,
                Option<Uuid>,
                Option<String>,
                DateTime<Utc>,
                DateTime<Utc>,
            ),
        >(
            "SELECT id, experience_id, host_id, requester_id, status, participants, total_price, \
             start_date, fee_charged, refund, dispute_id, reject_reason, created_at, updated_at \
             FROM matches ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    id,
                    experience_id,
                    host_id,
                    requester_id,
                    status,
                    participants,
                    total_price,
                    start_date,
                    fee_charged,
                    refund,
                    dispute_id,
                    reject_reason,
                    created_at,
                    updated_at,
                )| MatchRow {
                    id,
                    experience_id,
                    host_id,
                    requester_id,
                    status,
                    participants,
                    total_price,
                    start_date,
                    fee_charged,
                    refund,
                    dispute_id,
                    reject_reason,
                    created_at,
                    updated_at,
                },
            )
            .collect())
    }

    /// Loads the mirrored ledger rows for one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn load_transactions(&self, user_id: Uuid) -> Result<Vec<TransactionRow>, CoreError> {
        let rows = sqlx::query_as::<
            _,
            (
                Uuid,
                Uuid,
                String,
                Decimal,
                Option<Uuid>,
                String,
                DateTime<Utc>,
            ),
        >(
            "SELECT id, user_id, kind, amount, related_match, status, created_at \
             FROM wallet_transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, user_id, kind, amount, related_match, status, created_at)| TransactionRow {
                    id,
                    user_id,
                    kind,
                    amount,
                    related_match,
                    status,
                    created_at,
                },
            )
            .collect())
    }

    /// Loads all mirrored dispute rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn load_disputes(&self) -> Result<Vec<DisputeRow>, CoreError> {
        let rows = sqlx::query_as::<
            _,
            (
                Uuid,
                Uuid,
                Uuid,
                String,
                String,
                String,
                Option<serde_json::Value>,
                Option<serde_json::Value>,
                Option<Uuid>,
                Option<String>,
                DateTime<Utc>,
                Option<DateTime<Utc>>,
            ),
        >(
            "SELECT id, match_id, opener_id, reason, description, status, resolution, \
             admin_action, resolved_by, admin_notes, created_at, resolved_at \
             FROM disputes ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    id,
                    match_id,
                    opener_id,
                    reason,
                    description,
                    status,
                    resolution,
                    admin_action,
                    resolved_by,
                    admin_notes,
                    created_at,
                    resolved_at,
                )| DisputeRow {
                    id,
                    match_id,
                    opener_id,
                    reason,
                    description,
                    status,
                    resolution,
                    admin_action,
                    resolved_by,
                    admin_notes,
                    created_at,
                    resolved_at,
                },
            )
            .collect())
    }

    /// Loads events after the given timestamp, optionally filtered by
    /// match ID.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        match_id: Option<Uuid>,
    ) -> Result<Vec<StoredEvent>, CoreError> {
        let rows = if let Some(mid) = match_id {
            sqlx::query_as::<_, (i64, Option<Uuid>, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, match_id, event_type, payload, created_at FROM events \
                 WHERE created_at > $1 AND match_id = $2 ORDER BY created_at ASC",
            )
            .bind(after)
            .bind(mid)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, Option<Uuid>, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, match_id, event_type, payload, created_at FROM events \
                 WHERE created_at > $1 ORDER BY created_at ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| CoreError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, match_id, event_type, payload, created_at)| StoredEvent {
                    id,
                    match_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Deletes event-log rows older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`CoreError::PersistenceError`] on database failure.
    pub async fn delete_old_events(&self, before_days: u64) -> Result<u64, CoreError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM events WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::PersistenceError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
