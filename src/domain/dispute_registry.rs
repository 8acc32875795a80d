//! Concurrent dispute storage enforcing one active dispute per match.
//!
//! Alongside the per-dispute locks, the registry keeps an index from match
//! to its non-terminal dispute. Insertion checks the index under the outer
//! write lock, which is what makes the one-active-dispute invariant hold
//! against concurrent `open` calls.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::dispute::{Dispute, DisputeStatus};
use super::ids::{DisputeId, MatchId};
use crate::error::CoreError;

#[derive(Debug, Default)]
struct Inner {
    disputes: HashMap<DisputeId, Arc<RwLock<Dispute>>>,
    /// match → its one non-terminal dispute.
    active_by_match: HashMap<MatchId, DisputeId>,
}

/// Central store for all disputes.
#[derive(Debug, Default)]
pub struct DisputeRegistry {
    inner: RwLock<Inner>,
}

impl DisputeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a newly opened dispute.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateDispute`] if the match already has a
    /// non-terminal dispute.
    pub async fn insert(&self, dispute: Dispute) -> Result<DisputeId, CoreError> {
        let dispute_id = dispute.id;
        let match_id = dispute.match_id;
        let mut inner = self.inner.write().await;
        if inner.active_by_match.contains_key(&match_id) {
            return Err(CoreError::DuplicateDispute(match_id));
        }
        inner.active_by_match.insert(match_id, dispute_id);
        inner
            .disputes
            .insert(dispute_id, Arc::new(RwLock::new(dispute)));
        Ok(dispute_id)
    }

    /// Returns a shared reference to the dispute behind its lock.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DisputeNotFound`] if no dispute with the given
    /// ID exists.
    pub async fn get(&self, dispute_id: DisputeId) -> Result<Arc<RwLock<Dispute>>, CoreError> {
        let inner = self.inner.read().await;
        inner
            .disputes
            .get(&dispute_id)
            .map(Arc::clone)
            .ok_or(CoreError::DisputeNotFound(dispute_id))
    }

    /// Returns a snapshot of the dispute row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DisputeNotFound`] if no dispute with the given
    /// ID exists.
    pub async fn snapshot(&self, dispute_id: DisputeId) -> Result<Dispute, CoreError> {
        let entry = self.get(dispute_id).await?;
        let d = entry.read().await;
        Ok(d.clone())
    }

    /// Returns the match's non-terminal dispute, if one exists.
    pub async fn active_for_match(&self, match_id: MatchId) -> Option<DisputeId> {
        self.inner
            .read()
            .await
            .active_by_match
            .get(&match_id)
            .copied()
    }

    /// Drops the active-index entry after `dispute_id` terminated.
    ///
    /// A no-op if the index has already moved on (it can only point at a
    /// newer dispute, never back at a terminated one).
    pub async fn release_active(&self, match_id: MatchId, dispute_id: DisputeId) {
        let mut inner = self.inner.write().await;
        if inner.active_by_match.get(&match_id) == Some(&dispute_id) {
            inner.active_by_match.remove(&match_id);
        }
    }

    /// Returns snapshots of disputes, optionally filtered by status,
    /// newest first.
    pub async fn list(&self, status: Option<DisputeStatus>) -> Vec<Dispute> {
        let inner = self.inner.read().await;
        let mut rows = Vec::with_capacity(inner.disputes.len());
        for entry_lock in inner.disputes.values() {
            let d = entry_lock.read().await;
            if let Some(wanted) = status
                && d.status != wanted
            {
                continue;
            }
            rows.push(d.clone());
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    /// Returns the number of disputes ever opened.
    pub async fn len(&self) -> usize {
        self.inner.read().await.disputes.len()
    }

    /// Returns `true` if no disputes exist.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.disputes.is_empty()
    }
}
