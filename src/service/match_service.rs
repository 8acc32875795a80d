//! Match service: owns the booking lifecycle.
//!
//! Every transition is validated inside the per-match write lock, so two
//! concurrent calls on the same match settle on exactly one winner. The
//! one multi-party rule lives in `accept`: for fee-bearing experience
//! kinds, the status flip and the platform-fee charge are a single atomic
//! unit — never charge without accepting, never accept without charging.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::config::CoreConfig;
use crate::domain::booking::{Match, MatchStatus, MatchSummary, RefundRecord};
use crate::domain::ids::{MatchId, UserId};
use crate::domain::match_registry::{MatchFilter, MatchRegistry};
use crate::domain::{EventBus, ExperienceCatalog, MarketEvent, UserRegistry};
use crate::error::CoreError;
use crate::service::WalletService;

/// Cancellation and expiry policy knobs, lifted from [`CoreConfig`].
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy {
    /// Hours a match may stay pending before the sweep rejects it.
    pub pending_expiry_hours: i64,
    /// Refund percentage when the host cancels an accepted match.
    pub host_cancel_refund_pct: u8,
    /// Refund percentage when the requester cancels close to the start.
    pub late_cancel_refund_pct: u8,
    /// Days before the start date up to which a requester cancellation
    /// still refunds 100%.
    pub full_refund_cutoff_days: i64,
}

impl From<&CoreConfig> for MatchPolicy {
    fn from(config: &CoreConfig) -> Self {
        Self {
            pending_expiry_hours: config.pending_expiry_hours,
            host_cancel_refund_pct: config.host_cancel_refund_pct,
            late_cancel_refund_pct: config.late_cancel_refund_pct,
            full_refund_cutoff_days: config.full_refund_cutoff_days,
        }
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::from(&CoreConfig::default())
    }
}

/// Orchestration layer for the booking lifecycle.
#[derive(Debug, Clone)]
pub struct MatchService {
    registry: Arc<MatchRegistry>,
    users: Arc<UserRegistry>,
    catalog: Arc<ExperienceCatalog>,
    wallet: WalletService,
    event_bus: EventBus,
    policy: MatchPolicy,
}

impl MatchService {
    /// Creates a new `MatchService`.
    #[must_use]
    pub fn new(
        registry: Arc<MatchRegistry>,
        users: Arc<UserRegistry>,
        catalog: Arc<ExperienceCatalog>,
        wallet: WalletService,
        event_bus: EventBus,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            registry,
            users,
            catalog,
            wallet,
            event_bus,
            policy,
        }
    }

    /// Returns a reference to the match registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<MatchRegistry> {
        &self.registry
    }

    /// Creates a pending match. No money moves here; the requester's
    /// capacity to eventually pay the fee is checked optimistically and
    /// re-checked at accept time.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ExperienceNotFound`] for an unknown experience.
    /// - [`CoreError::InvalidRequest`] for self-booking, zero
    ///   participants, or a party above capacity.
    /// - [`CoreError::UserBanned`] if the requester is banned.
    /// - [`CoreError::FundingFailed`] if a fee-bearing booking is
    ///   requested with a wallet that cannot cover the fee.
    pub async fn create(
        &self,
        requester_id: UserId,
        experience_id: uuid::Uuid,
        participants: u32,
        start_date: Option<DateTime<Utc>>,
    ) -> Result<Match, CoreError> {
        if participants == 0 {
            return Err(CoreError::InvalidRequest(
                "a match needs at least one participant".to_string(),
            ));
        }
        let info = self.catalog.get(experience_id).await?;
        if info.host_id == requester_id {
            return Err(CoreError::InvalidRequest(
                "hosts cannot book their own experience".to_string(),
            ));
        }
        if participants > info.capacity {
            return Err(CoreError::InvalidRequest(format!(
                "party of {participants} exceeds capacity {}",
                info.capacity
            )));
        }
        if self.users.is_banned(requester_id).await {
            return Err(CoreError::UserBanned(requester_id));
        }
        if info.kind.fee_applies() && !self.wallet.can_operate(requester_id).await {
            return Err(CoreError::FundingFailed {
                user_id: requester_id,
                required: self.wallet.platform_fee(),
            });
        }

        let total_price = if info.kind.fee_applies() {
            info.total_price(participants)
        } else {
            None
        };
        let m = Match::new(
            experience_id,
            info.host_id,
            requester_id,
            participants,
            total_price,
            start_date,
        );
        let snapshot = m.clone();
        self.registry.insert(m).await?;

        let _ = self.event_bus.publish(MarketEvent::MatchRequested {
            match_id: snapshot.id,
            experience_id,
            host_id: snapshot.host_id,
            requester_id,
            participants,
            total_price: snapshot.total_price,
            timestamp: Utc::now(),
        });
        tracing::info!(match_id = %snapshot.id, %requester_id, "match requested");
        Ok(snapshot)
    }

    /// Host accepts a pending match.
    ///
    /// For fee-bearing experience kinds, charges both parties the platform
    /// fee before flipping the status; if the charge fails the match stays
    /// `pending` and the funding error is surfaced as-is (retryable after
    /// a top-up). Pure exchange kinds skip the wallet entirely.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidTransition`] unless the match is `pending`.
    /// - [`CoreError::InvalidRequest`] if the caller is not the host.
    /// - [`CoreError::UserBanned`] if the host is banned.
    /// - [`CoreError::FundingFailed`] if either wallet cannot cover the fee.
    pub async fn accept(&self, match_id: MatchId, acting: UserId) -> Result<Match, CoreError> {
        let entry = self.registry.get(match_id).await?;
        let mut m = entry.write().await;

        if m.status != MatchStatus::Pending {
            return Err(CoreError::InvalidTransition {
                action: "accept",
                status: m.status.as_str().to_string(),
            });
        }
        if acting != m.host_id {
            return Err(CoreError::InvalidRequest(
                "only the host may accept a match".to_string(),
            ));
        }
        if self.users.is_banned(acting).await {
            return Err(CoreError::UserBanned(acting));
        }

        let info = self.catalog.get(m.experience_id).await?;
        let fee = if info.kind.fee_applies() {
            // The charge happens while we hold the match write lock: a
            // concurrent accept is still parked on the lock, and a failure
            // here returns before any field of the match is touched.
            self.wallet
                .charge_platform_fee(m.host_id, m.requester_id, match_id)
                .await?;
            Some(self.wallet.platform_fee())
        } else {
            None
        };

        m.status = MatchStatus::Accepted;
        m.fee_charged = fee;
        m.touch();
        let snapshot = m.clone();
        drop(m);

        let _ = self.event_bus.publish(MarketEvent::MatchAccepted {
            match_id,
            fee,
            timestamp: Utc::now(),
        });
        tracing::info!(%match_id, fee = ?fee, "match accepted");
        Ok(snapshot)
    }

    /// Host rejects a pending match. No money was taken, none moves.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidTransition`] unless the match is `pending`.
    /// - [`CoreError::InvalidRequest`] if the caller is not the host.
    pub async fn reject(
        &self,
        match_id: MatchId,
        acting: UserId,
        reason: Option<String>,
    ) -> Result<Match, CoreError> {
        let entry = self.registry.get(match_id).await?;
        let mut m = entry.write().await;

        if m.status != MatchStatus::Pending {
            return Err(CoreError::InvalidTransition {
                action: "reject",
                status: m.status.as_str().to_string(),
            });
        }
        if acting != m.host_id {
            return Err(CoreError::InvalidRequest(
                "only the host may reject a match".to_string(),
            ));
        }

        m.status = MatchStatus::Rejected;
        m.reject_reason = reason.clone();
        m.touch();
        let snapshot = m.clone();
        drop(m);

        let _ = self.event_bus.publish(MarketEvent::MatchRejected {
            match_id,
            by_system: false,
            reason,
            timestamp: Utc::now(),
        });
        tracing::info!(%match_id, "match rejected by host");
        Ok(snapshot)
    }

    /// Either party cancels a pending or accepted match.
    ///
    /// Cancelling from `accepted` refunds the requester's fee at the
    /// policy percentage: 100% for host-initiated cancellations, and for
    /// requester-initiated ones 100% far from the start date, the late
    /// percentage close to it. Percentage and amount are recorded on the
    /// match for display.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidTransition`] from terminal states.
    /// - [`CoreError::NotParticipant`] if the caller is neither party.
    pub async fn cancel(&self, match_id: MatchId, acting: UserId) -> Result<Match, CoreError> {
        let entry = self.registry.get(match_id).await?;
        let mut m = entry.write().await;

        if !m.is_participant(acting) {
            return Err(CoreError::NotParticipant {
                user_id: acting,
                match_id,
            });
        }
        if m.status != MatchStatus::Pending && m.status != MatchStatus::Accepted {
            return Err(CoreError::InvalidTransition {
                action: "cancel",
                status: m.status.as_str().to_string(),
            });
        }

        let mut refund_percentage = None;
        let mut refund_amount = None;
        if m.status == MatchStatus::Accepted
            && let Some(fee) = m.fee_charged
        {
            let pct = self.cancellation_refund_pct(acting, &m);
            refund_percentage = Some(pct);
            if pct > 0 {
                let amount = fee * Decimal::from(pct) / Decimal::from(100u8);
                let tx_id = self
                    .wallet
                    .refund(m.requester_id, amount, match_id, "match cancelled")
                    .await?;
                m.refund = Some(RefundRecord {
                    percentage: pct,
                    amount,
                    tx_id,
                    issued_at: Utc::now(),
                });
                refund_amount = Some(amount);
            }
        }

        m.status = MatchStatus::Cancelled;
        m.touch();
        let snapshot = m.clone();
        drop(m);

        let _ = self.event_bus.publish(MarketEvent::MatchCancelled {
            match_id,
            cancelled_by: acting,
            refund_percentage,
            refund_amount,
            timestamp: Utc::now(),
        });
        tracing::info!(%match_id, cancelled_by = %acting, "match cancelled");
        Ok(snapshot)
    }

    /// Marks an accepted match completed, unlocking review eligibility
    /// downstream. The host may complete at any time (manual override);
    /// the requester and the system only after the start date has passed.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidTransition`] unless the match is `accepted`,
    ///   or when completion is attempted before the start date without a
    ///   host override.
    /// - [`CoreError::NotParticipant`] if the caller is neither party.
    pub async fn complete(
        &self,
        match_id: MatchId,
        acting: Option<UserId>,
    ) -> Result<Match, CoreError> {
        let entry = self.registry.get(match_id).await?;
        let mut m = entry.write().await;

        if m.status != MatchStatus::Accepted {
            return Err(CoreError::InvalidTransition {
                action: "complete",
                status: m.status.as_str().to_string(),
            });
        }
        if let Some(user) = acting
            && !m.is_participant(user)
        {
            return Err(CoreError::NotParticipant {
                user_id: user,
                match_id,
            });
        }
        let host_override = acting == Some(m.host_id);
        let started = m.start_date.is_some_and(|start| start <= Utc::now());
        if !host_override && !started {
            return Err(CoreError::InvalidTransition {
                action: "complete",
                status: "accepted before start date".to_string(),
            });
        }

        m.status = MatchStatus::Completed;
        m.touch();
        let snapshot = m.clone();
        drop(m);

        let _ = self.event_bus.publish(MarketEvent::MatchCompleted {
            match_id,
            completed_by: acting,
            timestamp: Utc::now(),
        });
        tracing::info!(%match_id, "match completed");
        Ok(snapshot)
    }

    /// Rejects pending matches older than the configured expiry window.
    ///
    /// Idempotent: already-expired matches are no longer pending and are
    /// skipped by the status re-check inside the write lock, which also
    /// settles any race with a concurrent accept or reject.
    pub async fn expire_pending(&self) -> usize {
        let cutoff = Utc::now() - Duration::hours(self.policy.pending_expiry_hours);
        let candidates = self.registry.pending_created_before(cutoff).await;
        let mut expired = 0;
        for match_id in candidates {
            let Ok(entry) = self.registry.get(match_id).await else {
                continue;
            };
            let mut m = entry.write().await;
            if m.status != MatchStatus::Pending || m.created_at >= cutoff {
                continue;
            }
            let reason = format!(
                "expired after {} hours without a host response",
                self.policy.pending_expiry_hours
            );
            m.status = MatchStatus::Rejected;
            m.reject_reason = Some(reason.clone());
            m.touch();
            drop(m);
            expired += 1;

            let _ = self.event_bus.publish(MarketEvent::MatchRejected {
                match_id,
                by_system: true,
                reason: Some(reason),
                timestamp: Utc::now(),
            });
        }
        if expired > 0 {
            tracing::info!(expired, "pending matches expired by sweep");
        }
        expired
    }

    /// Returns a snapshot of a match.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MatchNotFound`] for an unknown match.
    pub async fn get(&self, match_id: MatchId) -> Result<Match, CoreError> {
        self.registry.snapshot(match_id).await
    }

    /// Returns match summaries passing the filter, newest first.
    pub async fn list(&self, filter: MatchFilter) -> Vec<MatchSummary> {
        self.registry.list(filter).await
    }

    fn cancellation_refund_pct(&self, acting: UserId, m: &Match) -> u8 {
        if acting == m.host_id {
            return self.policy.host_cancel_refund_pct;
        }
        let far_from_start = match m.start_date {
            // No agreed date yet: nothing was locked in, full refund.
            None => true,
            Some(start) => {
                start - Utc::now() >= Duration::days(self.policy.full_refund_cutoff_days)
            }
        };
        if far_from_start {
            100
        } else {
            self.policy.late_cancel_refund_pct
        }
    }
}
