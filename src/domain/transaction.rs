//! Immutable wallet ledger entries.
//!
//! A [`WalletTransaction`] is append-only: once its status reaches a
//! terminal value it is never edited. Corrections are new transactions
//! (a refund), never mutations of an old one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{MatchId, TxId, UserId};

/// Business meaning of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credit recorded after an external payment capture succeeded.
    TopUp,
    /// Fee debited from both parties when a match is accepted.
    PlatformFee,
    /// Credit restoring funds after a cancellation or dispute resolution.
    Refund,
    /// Outbound transfer to a user's external account.
    Payout,
}

impl TransactionKind {
    /// Lower-case kind name, as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TopUp => "top_up",
            Self::PlatformFee => "platform_fee",
            Self::Refund => "refund",
            Self::Payout => "payout",
        }
    }
}

/// Lifecycle status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created but not yet settled. Pending entries do not count toward
    /// the balance.
    Pending,
    /// Settled; counts toward the balance. Terminal.
    Completed,
    /// Did not settle. Terminal.
    Failed,
}

impl TransactionStatus {
    /// Lower-case status name, as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One immutable entry in a user's wallet ledger.
///
/// `amount` is signed: positive entries are credits, negative entries are
/// debits. The sum of a user's completed entries is, at all times, their
/// wallet balance (the cached balance is a projection of this log).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletTransaction {
    /// Entry identifier.
    pub id: TxId,
    /// Owner of the wallet this entry belongs to.
    pub user_id: UserId,
    /// Business meaning.
    pub kind: TransactionKind,
    /// Signed amount; positive = credit, negative = debit.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// The match that caused this entry, when applicable.
    pub related_match: Option<MatchId>,
    /// Settlement status.
    pub status: TransactionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Builds a completed credit entry. `amount` must be positive; callers
    /// validate before constructing.
    #[must_use]
    pub fn completed_credit(
        user_id: UserId,
        amount: Decimal,
        kind: TransactionKind,
        related_match: Option<MatchId>,
    ) -> Self {
        Self {
            id: TxId::new(),
            user_id,
            kind,
            amount,
            related_match,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Builds a completed debit entry; the stored amount is negated.
    #[must_use]
    pub fn completed_debit(
        user_id: UserId,
        amount: Decimal,
        kind: TransactionKind,
        related_match: Option<MatchId>,
    ) -> Self {
        Self {
            id: TxId::new(),
            user_id,
            kind,
            amount: -amount,
            related_match,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if this entry counts toward the balance.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self.status, TransactionStatus::Completed)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn debit_stores_negative_amount() {
        let tx = WalletTransaction::completed_debit(
            UserId::new(),
            Decimal::new(150, 2),
            TransactionKind::PlatformFee,
            Some(MatchId::new()),
        );
        assert_eq!(tx.amount, Decimal::new(-150, 2));
        assert!(tx.is_settled());
    }

    #[test]
    fn credit_stores_positive_amount() {
        let tx = WalletTransaction::completed_credit(
            UserId::new(),
            Decimal::new(2000, 2),
            TransactionKind::TopUp,
            None,
        );
        assert_eq!(tx.amount, Decimal::new(2000, 2));
        assert_eq!(tx.kind, TransactionKind::TopUp);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&TransactionKind::PlatformFee).ok();
        assert_eq!(json.as_deref(), Some("\"platform_fee\""));
    }

    #[test]
    fn pending_entries_are_not_settled() {
        let mut tx = WalletTransaction::completed_credit(
            UserId::new(),
            Decimal::ONE,
            TransactionKind::TopUp,
            None,
        );
        tx.status = TransactionStatus::Pending;
        assert!(!tx.is_settled());
    }
}
