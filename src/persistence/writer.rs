//! Write-behind persistence consumer.
//!
//! Subscribes to the event bus and mirrors every committed mutation into
//! PostgreSQL: the event itself into the append-only log, and the
//! affected match/dispute/ledger rows into their tables. Database
//! failures are logged and skipped — the in-memory state is
//! authoritative, and persistence lag must never block the core.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::postgres::PostgresPersistence;
use crate::domain::dispute_registry::DisputeRegistry;
use crate::domain::ids::{TxId, UserId};
use crate::domain::match_registry::MatchRegistry;
use crate::domain::{EventBus, MarketEvent};
use crate::ledger::LedgerStore;

/// Shared handles the writer needs to snapshot authoritative state.
#[derive(Debug, Clone)]
pub struct WriterContext {
    /// Durable sink.
    pub persistence: PostgresPersistence,
    /// Authoritative match store.
    pub matches: Arc<MatchRegistry>,
    /// Authoritative dispute store.
    pub disputes: Arc<DisputeRegistry>,
    /// Authoritative ledger.
    pub ledger: Arc<LedgerStore>,
    /// Whether to append events to the event log.
    pub event_log_enabled: bool,
}

/// Spawns the writer loop on the given bus. The task ends when the bus
/// is dropped.
pub fn spawn(event_bus: &EventBus, ctx: WriterContext) -> tokio::task::JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => mirror(&ctx, &event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "persistence writer lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("persistence writer stopped");
    })
}

async fn mirror(ctx: &WriterContext, event: &MarketEvent) {
    if ctx.event_log_enabled {
        let payload = serde_json::to_value(event).unwrap_or_default();
        if let Err(err) = ctx
            .persistence
            .save_event(
                event.match_id().map(|m| *m.as_uuid()),
                event.event_type_str(),
                &payload,
            )
            .await
        {
            tracing::warn!(error = %err, "event log append failed");
        }
    }

    match event {
        MarketEvent::MatchRequested { match_id, .. }
        | MarketEvent::MatchAccepted { match_id, .. }
        | MarketEvent::MatchRejected { match_id, .. }
        | MarketEvent::MatchCancelled { match_id, .. }
        | MarketEvent::MatchCompleted { match_id, .. } => {
            match ctx.matches.snapshot(*match_id).await {
                Ok(m) => {
                    if let Err(err) = ctx.persistence.upsert_match(&m).await {
                        tracing::warn!(%match_id, error = %err, "match mirror failed");
                    }
                }
                Err(err) => tracing::warn!(%match_id, error = %err, "match snapshot failed"),
            }
        }
        MarketEvent::DisputeOpened { dispute_id, .. }
        | MarketEvent::DisputeUnderReview { dispute_id, .. }
        | MarketEvent::DisputeResolved { dispute_id, .. } => {
            match ctx.disputes.snapshot(*dispute_id).await {
                Ok(d) => {
                    if let Err(err) = ctx.persistence.upsert_dispute(&d).await {
                        tracing::warn!(%dispute_id, error = %err, "dispute mirror failed");
                    }
                }
                Err(err) => tracing::warn!(%dispute_id, error = %err, "dispute snapshot failed"),
            }
        }
        MarketEvent::WalletToppedUp { user_id, tx_id, .. } => {
            mirror_transaction(ctx, *user_id, *tx_id).await;
        }
        MarketEvent::RefundIssued { user_id, tx_id, .. } => {
            mirror_transaction(ctx, *user_id, *tx_id).await;
        }
        MarketEvent::PlatformFeeCharged {
            host_id,
            requester_id,
            host_tx,
            requester_tx,
            ..
        } => {
            mirror_transaction(ctx, *host_id, *host_tx).await;
            mirror_transaction(ctx, *requester_id, *requester_tx).await;
        }
        MarketEvent::UserStruck { .. } | MarketEvent::UserBanned { .. } => {
            // Trust state lives with the user service; the event-log
            // append above is the durable audit record here.
        }
    }
}

async fn mirror_transaction(ctx: &WriterContext, user_id: UserId, tx_id: TxId) {
    let Some(tx) = ctx.ledger.find_transaction(user_id, tx_id).await else {
        tracing::warn!(%user_id, %tx_id, "ledger entry named by event not found");
        return;
    };
    if let Err(err) = ctx.persistence.insert_transaction(&tx).await {
        tracing::warn!(%tx_id, error = %err, "transaction mirror failed");
    }
}
