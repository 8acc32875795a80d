//! Trust projection of marketplace users.
//!
//! Users live in the external user service; this core keeps the minimal
//! per-user trust state the booking and dispute flows read and mutate:
//! strike count and ban timestamp. Wallet balances live in the ledger,
//! never here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::ids::UserId;

/// Number of strikes that triggers an automatic ban.
pub const STRIKES_FOR_BAN: u8 = 3;

/// Role of a marketplace user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Books experiences.
    Traveler,
    /// Offers experiences.
    Host,
    /// Resolves disputes and applies penalties.
    Admin,
}

/// Per-user trust state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserAccount {
    /// User identifier (owned by the external user service).
    pub id: UserId,
    /// Role at registration time.
    pub role: UserRole,
    /// Accumulated strikes, 0 to [`STRIKES_FOR_BAN`].
    pub strikes: u8,
    /// Set when the user is banned; a banned user may not create or
    /// accept matches.
    pub banned_at: Option<DateTime<Utc>>,
}

impl UserAccount {
    /// Creates a clean account with no strikes.
    #[must_use]
    pub fn new(id: UserId, role: UserRole) -> Self {
        Self {
            id,
            role,
            strikes: 0,
            banned_at: None,
        }
    }

    /// Returns `true` if the user is banned.
    #[must_use]
    pub const fn is_banned(&self) -> bool {
        self.banned_at.is_some()
    }
}

/// Outcome of applying a strike, returned to the caller for event emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeOutcome {
    /// Strike count after the increment.
    pub strikes: u8,
    /// `true` if this strike crossed the threshold and banned the user
    /// in the same operation.
    pub banned: bool,
}

/// Registry of per-user trust state with per-user locking.
///
/// Same shape as the match registry: an outer `RwLock<HashMap>` handing out
/// `Arc<RwLock<UserAccount>>` entries, so a strike on one user never
/// contends with a ban check on another.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<HashMap<UserId, Arc<RwLock<UserAccount>>>>,
}

impl UserRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for a user, registering a clean traveler account
    /// on first contact. The user service pushes richer data via
    /// [`UserRegistry::upsert`]; first-contact defaults only matter for
    /// users it has not announced yet.
    pub async fn get_or_register(&self, user_id: UserId) -> Arc<RwLock<UserAccount>> {
        if let Some(entry) = self.users.read().await.get(&user_id) {
            return Arc::clone(entry);
        }
        let mut map = self.users.write().await;
        Arc::clone(
            map.entry(user_id)
                .or_insert_with(|| Arc::new(RwLock::new(UserAccount::new(user_id, UserRole::Traveler)))),
        )
    }

    /// Replaces a user's trust state wholesale (push from the user service).
    pub async fn upsert(&self, account: UserAccount) {
        let entry = self.get_or_register(account.id).await;
        *entry.write().await = account;
    }

    /// Returns a snapshot of the user's trust state, if known.
    pub async fn get(&self, user_id: UserId) -> Option<UserAccount> {
        let entry = {
            let map = self.users.read().await;
            map.get(&user_id).map(Arc::clone)
        };
        match entry {
            Some(e) => Some(e.read().await.clone()),
            None => None,
        }
    }

    /// Returns `true` if the user is currently banned.
    ///
    /// Unknown users are not banned; the ban check must never block a
    /// first-time traveler.
    pub async fn is_banned(&self, user_id: UserId) -> bool {
        match self.get(user_id).await {
            Some(account) => account.is_banned(),
            None => false,
        }
    }

    /// Adds one strike to the user.
    ///
    /// Crossing [`STRIKES_FOR_BAN`] sets `banned_at` under the same write
    /// lock, so the ban is visible to any concurrent `create`/`accept`
    /// ban check the instant this returns.
    pub async fn strike(&self, user_id: UserId) -> StrikeOutcome {
        let entry = self.get_or_register(user_id).await;
        let mut account = entry.write().await;
        account.strikes = account.strikes.saturating_add(1).min(STRIKES_FOR_BAN);
        let crossed = account.strikes >= STRIKES_FOR_BAN && account.banned_at.is_none();
        if crossed {
            account.banned_at = Some(Utc::now());
        }
        StrikeOutcome {
            strikes: account.strikes,
            banned: crossed,
        }
    }

    /// Bans the user immediately, regardless of strike count.
    ///
    /// Returns `true` if the user was not already banned.
    pub async fn ban(&self, user_id: UserId) -> bool {
        let entry = self.get_or_register(user_id).await;
        let mut account = entry.write().await;
        if account.banned_at.is_some() {
            return false;
        }
        account.banned_at = Some(Utc::now());
        true
    }
}
