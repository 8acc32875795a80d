//! Append-only per-user ledger with serialized balance mutation.
//!
//! Each user's account is a `Vec` of immutable [`WalletTransaction`]s plus
//! a cached balance, behind its own [`tokio::sync::Mutex`]. Every
//! check-and-append runs under that one lock, so two concurrent debits can
//! never both pass an insufficient-funds check against a stale balance.
//! Two-user operations ([`LedgerStore::debit_pair`]) acquire both locks in
//! ascending [`UserId`] order.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};

use crate::domain::ids::{MatchId, TxId, UserId};
use crate::domain::transaction::{TransactionKind, WalletTransaction};
use crate::error::CoreError;

/// Divergence details kept on a frozen account so every rejected debit
/// can repeat the numbers that caused the halt.
#[derive(Debug, Clone, Copy)]
struct IntegrityRecord {
    cached: Decimal,
    recomputed: Decimal,
}

/// One user's ledger: the log, the cached projection, and the freeze flag.
#[derive(Debug, Default)]
struct UserLedger {
    entries: Vec<WalletTransaction>,
    balance: Decimal,
    fault: Option<IntegrityRecord>,
}

impl UserLedger {
    fn settled_sum(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|tx| tx.is_settled())
            .map(|tx| tx.amount)
            .sum()
    }
}

/// One page of a user's transaction history.
#[derive(Debug, Clone)]
pub struct TransactionPage {
    /// Entries on this page, newest first.
    pub items: Vec<WalletTransaction>,
    /// Total entries matching the filter, across all pages.
    pub total: usize,
}

/// Durable-in-memory ledger store for all users.
///
/// # Concurrency
///
/// - Mutations on one user are serialized by that user's mutex.
/// - Mutations on different users are concurrent.
/// - [`LedgerStore::debit_pair`] holds both parties' locks for the whole
///   both-or-neither check-and-append.
#[derive(Debug, Default)]
pub struct LedgerStore {
    accounts: RwLock<HashMap<UserId, Arc<Mutex<UserLedger>>>>,
}

impl LedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn account(&self, user_id: UserId) -> Arc<Mutex<UserLedger>> {
        if let Some(account) = self.accounts.read().await.get(&user_id) {
            return Arc::clone(account);
        }
        let mut map = self.accounts.write().await;
        Arc::clone(map.entry(user_id).or_default())
    }

    /// Appends a completed credit and increments the cached balance.
    ///
    /// Credits are accepted even on a frozen account: a refund must not
    /// bounce because of an audit halt.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] if `amount` is not positive.
    pub async fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        kind: TransactionKind,
        related_match: Option<MatchId>,
    ) -> Result<TxId, CoreError> {
        ensure_positive(amount)?;
        let account = self.account(user_id).await;
        let mut ledger = account.lock().await;
        let tx = WalletTransaction::completed_credit(user_id, amount, kind, related_match);
        let tx_id = tx.id;
        ledger.balance += amount;
        ledger.entries.push(tx);
        Ok(tx_id)
    }

    /// Appends a completed debit and decrements the cached balance, only
    /// if the resulting balance stays ≥ 0. Check and append happen under
    /// one per-user lock.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidRequest`] if `amount` is not positive.
    /// - [`CoreError::InsufficientFunds`] if the balance cannot cover it;
    ///   no transaction is written.
    /// - [`CoreError::IntegrityFault`] if the account is frozen by a prior
    ///   reconciliation divergence.
    pub async fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        kind: TransactionKind,
        related_match: Option<MatchId>,
    ) -> Result<TxId, CoreError> {
        ensure_positive(amount)?;
        let account = self.account(user_id).await;
        let mut ledger = account.lock().await;
        Self::debit_locked(&mut ledger, user_id, amount, kind, related_match)
    }

    /// Debits two distinct users the same amount, both-or-neither.
    ///
    /// Locks are acquired in ascending [`UserId`] order so two concurrent
    /// charges over an overlapping pair of users cannot deadlock. Both
    /// balances are checked before either entry is written.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidRequest`] if the users are the same or the
    ///   amount is not positive.
    /// - [`CoreError::InsufficientFunds`] naming the underfunded side;
    ///   neither entry is written.
    /// - [`CoreError::IntegrityFault`] if either account is frozen.
    pub async fn debit_pair(
        &self,
        first: UserId,
        second: UserId,
        amount: Decimal,
        kind: TransactionKind,
        related_match: Option<MatchId>,
    ) -> Result<(TxId, TxId), CoreError> {
        ensure_positive(amount)?;
        if first == second {
            return Err(CoreError::InvalidRequest(
                "cannot debit the same user twice in one pair charge".to_string(),
            ));
        }

        let (lo, hi) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        let lo_account = self.account(lo).await;
        let hi_account = self.account(hi).await;
        let mut lo_ledger = lo_account.lock().await;
        let mut hi_ledger = hi_account.lock().await;

        // Check both sides before writing either.
        Self::check_debitable(&lo_ledger, lo, amount)?;
        Self::check_debitable(&hi_ledger, hi, amount)?;

        let lo_tx = Self::debit_locked(&mut lo_ledger, lo, amount, kind, related_match)?;
        let hi_tx = Self::debit_locked(&mut hi_ledger, hi, amount, kind, related_match)?;

        if first == lo {
            Ok((lo_tx, hi_tx))
        } else {
            Ok((hi_tx, lo_tx))
        }
    }

    fn check_debitable(
        ledger: &UserLedger,
        user_id: UserId,
        amount: Decimal,
    ) -> Result<(), CoreError> {
        if let Some(fault) = ledger.fault {
            return Err(CoreError::IntegrityFault {
                user_id,
                cached: fault.cached,
                recomputed: fault.recomputed,
            });
        }
        if ledger.balance < amount {
            return Err(CoreError::InsufficientFunds {
                user_id,
                available: ledger.balance,
                required: amount,
            });
        }
        Ok(())
    }

    fn debit_locked(
        ledger: &mut UserLedger,
        user_id: UserId,
        amount: Decimal,
        kind: TransactionKind,
        related_match: Option<MatchId>,
    ) -> Result<TxId, CoreError> {
        Self::check_debitable(ledger, user_id, amount)?;
        let tx = WalletTransaction::completed_debit(user_id, amount, kind, related_match);
        let tx_id = tx.id;
        ledger.balance -= amount;
        ledger.entries.push(tx);
        Ok(tx_id)
    }

    /// Returns the cached balance. Unknown users hold zero.
    pub async fn balance(&self, user_id: UserId) -> Decimal {
        let account = self.account(user_id).await;
        let ledger = account.lock().await;
        ledger.balance
    }

    /// Recomputes the balance from the transaction log.
    ///
    /// On agreement, returns the balance. On divergence, the account is
    /// frozen — every later debit fails with the same fault — and the
    /// divergence is reported. It is never silently corrected.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IntegrityFault`] with both values when the
    /// cached balance and the log disagree.
    pub async fn reconcile(&self, user_id: UserId) -> Result<Decimal, CoreError> {
        let account = self.account(user_id).await;
        let mut ledger = account.lock().await;
        let recomputed = ledger.settled_sum();
        if recomputed == ledger.balance {
            return Ok(recomputed);
        }
        let record = IntegrityRecord {
            cached: ledger.balance,
            recomputed,
        };
        ledger.fault = Some(record);
        tracing::error!(
            %user_id,
            cached = %record.cached,
            recomputed = %record.recomputed,
            "ledger divergence detected; debits halted for user"
        );
        Err(CoreError::IntegrityFault {
            user_id,
            cached: record.cached,
            recomputed: record.recomputed,
        })
    }

    /// Returns one page of the user's history, newest first, optionally
    /// filtered by kind. `page` is 1-indexed.
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        page: usize,
        per_page: usize,
        kind: Option<TransactionKind>,
    ) -> TransactionPage {
        let account = self.account(user_id).await;
        let ledger = account.lock().await;
        let mut matching: Vec<WalletTransaction> = ledger
            .entries
            .iter()
            .filter(|tx| kind.is_none_or(|k| tx.kind == k))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len();
        let start = page.saturating_sub(1).saturating_mul(per_page);
        let items = matching.into_iter().skip(start).take(per_page).collect();
        TransactionPage { items, total }
    }

    /// Looks up one entry in a user's log by id. Used by the persistence
    /// writer to mirror entries named in events.
    pub async fn find_transaction(
        &self,
        user_id: UserId,
        tx_id: TxId,
    ) -> Option<WalletTransaction> {
        let account = self.account(user_id).await;
        let ledger = account.lock().await;
        ledger.entries.iter().find(|tx| tx.id == tx_id).cloned()
    }

    /// Counts settled entries of a kind referencing a match. Used by the
    /// audit surface to verify the exactly-two-fee-entries invariant.
    pub async fn count_for_match(
        &self,
        user_id: UserId,
        match_id: MatchId,
        kind: TransactionKind,
    ) -> usize {
        let account = self.account(user_id).await;
        let ledger = account.lock().await;
        ledger
            .entries
            .iter()
            .filter(|tx| {
                tx.is_settled() && tx.kind == kind && tx.related_match == Some(match_id)
            })
            .count()
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::InvalidRequest(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
