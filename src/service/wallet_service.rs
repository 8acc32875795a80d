//! Wallet service: business rules over the ledger store.
//!
//! The ledger knows how to move money safely; this layer knows when the
//! platform is allowed to. It owns the minimum top-up and platform fee
//! constants, translates a failed pair debit into the retryable funding
//! error the match flow surfaces, and emits wallet events.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::ids::{MatchId, TxId, UserId};
use crate::domain::transaction::TransactionKind;
use crate::domain::{EventBus, MarketEvent};
use crate::error::CoreError;
use crate::ledger::{LedgerStore, TransactionPage};

/// Business-rule layer above the [`LedgerStore`].
#[derive(Debug, Clone)]
pub struct WalletService {
    ledger: Arc<LedgerStore>,
    event_bus: EventBus,
    min_top_up: Decimal,
    platform_fee: Decimal,
}

impl WalletService {
    /// Creates a new `WalletService`.
    #[must_use]
    pub fn new(
        ledger: Arc<LedgerStore>,
        event_bus: EventBus,
        min_top_up: Decimal,
        platform_fee: Decimal,
    ) -> Self {
        Self {
            ledger,
            event_bus,
            min_top_up,
            platform_fee,
        }
    }

    /// The fixed per-party fee charged when a match is accepted.
    #[must_use]
    pub const fn platform_fee(&self) -> Decimal {
        self.platform_fee
    }

    /// The minimum accepted top-up amount.
    #[must_use]
    pub const fn min_top_up(&self) -> Decimal {
        self.min_top_up
    }

    /// Returns a reference to the underlying ledger store.
    #[must_use]
    pub fn ledger(&self) -> &Arc<LedgerStore> {
        &self.ledger
    }

    /// Returns `true` if the user's balance covers the platform fee.
    /// Read-only; never mutates.
    pub async fn can_operate(&self, user_id: UserId) -> bool {
        self.ledger.balance(user_id).await >= self.platform_fee
    }

    /// Records a top-up credit. The external card capture has already
    /// succeeded upstream; this call only books the result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BelowMinimum`] if `amount` is under the
    /// configured minimum.
    pub async fn top_up(&self, user_id: UserId, amount: Decimal) -> Result<TxId, CoreError> {
        if amount < self.min_top_up {
            return Err(CoreError::BelowMinimum {
                amount,
                minimum: self.min_top_up,
            });
        }
        let tx_id = self
            .ledger
            .credit(user_id, amount, TransactionKind::TopUp, None)
            .await?;

        let _ = self.event_bus.publish(MarketEvent::WalletToppedUp {
            user_id,
            amount,
            tx_id,
            timestamp: Utc::now(),
        });
        tracing::info!(%user_id, %amount, %tx_id, "top-up recorded");
        Ok(tx_id)
    }

    /// Debits the platform fee from both parties of a match as one
    /// both-or-neither operation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FundingFailed`] naming the underfunded party;
    /// no transaction is written on either side. Ledger integrity faults
    /// pass through unchanged.
    pub async fn charge_platform_fee(
        &self,
        host_id: UserId,
        requester_id: UserId,
        match_id: MatchId,
    ) -> Result<(TxId, TxId), CoreError> {
        let fee = self.platform_fee;
        let (host_tx, requester_tx) = self
            .ledger
            .debit_pair(
                host_id,
                requester_id,
                fee,
                TransactionKind::PlatformFee,
                Some(match_id),
            )
            .await
            .map_err(|err| match err {
                CoreError::InsufficientFunds { user_id, .. } => CoreError::FundingFailed {
                    user_id,
                    required: fee,
                },
                other => other,
            })?;

        let _ = self.event_bus.publish(MarketEvent::PlatformFeeCharged {
            match_id,
            host_id,
            requester_id,
            fee,
            host_tx,
            requester_tx,
            timestamp: Utc::now(),
        });
        tracing::info!(%match_id, %host_id, %requester_id, %fee, "platform fee charged to both parties");
        Ok((host_tx, requester_tx))
    }

    /// Issues a refund credit. Refunds are not constrained by balance
    /// checks and land even on frozen accounts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] if `amount` is not positive.
    pub async fn refund(
        &self,
        user_id: UserId,
        amount: Decimal,
        match_id: MatchId,
        reason: &str,
    ) -> Result<TxId, CoreError> {
        let tx_id = self
            .ledger
            .credit(user_id, amount, TransactionKind::Refund, Some(match_id))
            .await?;

        let _ = self.event_bus.publish(MarketEvent::RefundIssued {
            user_id,
            match_id,
            amount,
            reason: reason.to_string(),
            tx_id,
            timestamp: Utc::now(),
        });
        tracing::info!(%user_id, %match_id, %amount, reason, "refund issued");
        Ok(tx_id)
    }

    /// Returns the user's cached balance.
    pub async fn balance(&self, user_id: UserId) -> Decimal {
        self.ledger.balance(user_id).await
    }

    /// Recomputes the user's balance from the log (audit/repair).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IntegrityFault`] on divergence; the account
    /// is frozen for further debits.
    pub async fn reconcile(&self, user_id: UserId) -> Result<Decimal, CoreError> {
        self.ledger.reconcile(user_id).await
    }

    /// Returns one page of the user's transaction history.
    pub async fn transactions(
        &self,
        user_id: UserId,
        page: usize,
        per_page: usize,
        kind: Option<TransactionKind>,
    ) -> TransactionPage {
        self.ledger
            .list_transactions(user_id, page, per_page, kind)
            .await
    }
}
