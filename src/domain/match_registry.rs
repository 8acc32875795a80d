//! Concurrent match storage with per-match fine-grained locking.
//!
//! [`MatchRegistry`] stores all matches in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::RwLock`]. Status-guarded
//! transitions take the per-match write lock, so two concurrent `accept`
//! calls on the same match settle on exactly one winner, and the expiry
//! sweep can never race a live transition.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::booking::{Match, MatchStatus, MatchSummary};
use super::ids::{MatchId, UserId};
use crate::error::CoreError;

/// Central store for all matches.
///
/// # Concurrency
///
/// - Multiple tasks may read the same match concurrently.
/// - Writes to different matches are concurrent.
/// - Writes to the same match are serialized; transition legality is
///   checked inside the write guard.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: RwLock<HashMap<MatchId, Arc<RwLock<Match>>>>,
}

/// Filter for match list queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchFilter {
    /// Only matches in this status.
    pub status: Option<MatchStatus>,
    /// Only matches where this user is host or requester.
    pub participant: Option<UserId>,
}

impl MatchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new match.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] if a match with the same ID
    /// already exists (should never happen with UUID v4).
    pub async fn insert(&self, m: Match) -> Result<MatchId, CoreError> {
        let match_id = m.id;
        let mut map = self.matches.write().await;
        if map.contains_key(&match_id) {
            return Err(CoreError::InvalidRequest(format!(
                "match {match_id} already exists"
            )));
        }
        map.insert(match_id, Arc::new(RwLock::new(m)));
        Ok(match_id)
    }

    /// Returns a shared reference to the match behind its per-match lock.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MatchNotFound`] if no match with the given ID
    /// exists.
    pub async fn get(&self, match_id: MatchId) -> Result<Arc<RwLock<Match>>, CoreError> {
        let map = self.matches.read().await;
        map.get(&match_id)
            .map(Arc::clone)
            .ok_or(CoreError::MatchNotFound(match_id))
    }

    /// Returns a snapshot of the match row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MatchNotFound`] if no match with the given ID
    /// exists.
    pub async fn snapshot(&self, match_id: MatchId) -> Result<Match, CoreError> {
        let entry = self.get(match_id).await?;
        let m = entry.read().await;
        Ok(m.clone())
    }

    /// Returns summaries of matches passing the filter, newest first.
    pub async fn list(&self, filter: MatchFilter) -> Vec<MatchSummary> {
        let map = self.matches.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for entry_lock in map.values() {
            let m = entry_lock.read().await;
            if let Some(status) = filter.status
                && m.status != status
            {
                continue;
            }
            if let Some(user) = filter.participant
                && !m.is_participant(user)
            {
                continue;
            }
            summaries.push(MatchSummary::from(&*m));
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Returns the IDs of pending matches created before `cutoff`.
    ///
    /// Used by the expiry sweep. The returned set is a hint: the sweep
    /// re-checks the status inside the per-match write lock, so a match
    /// accepted between this scan and the sweep is left alone.
    pub async fn pending_created_before(&self, cutoff: DateTime<Utc>) -> Vec<MatchId> {
        let map = self.matches.read().await;
        let mut expired = Vec::new();
        for entry_lock in map.values() {
            let m = entry_lock.read().await;
            if m.status == MatchStatus::Pending && m.created_at < cutoff {
                expired.push(m.id);
            }
        }
        expired
    }

    /// Returns the number of matches in the registry.
    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    /// Returns `true` if the registry contains no matches.
    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }
}
