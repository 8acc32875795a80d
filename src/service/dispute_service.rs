//! Dispute & trust service: contesting match outcomes after the fact.
//!
//! `resolve` is the highest-consequence operation in the core: it can move
//! money (refund), mutate trust state (strike up to an automatic ban), and
//! terminate the dispute, all as one unit. The per-dispute write lock is
//! held across the whole operation, so concurrent resolutions have exactly
//! one winner and a second attempt always sees the terminal status — never
//! a second refund.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::booking::{MatchStatus, RefundRecord};
use crate::domain::dispute::{AdminAction, Dispute, DisputeStatus, Resolution};
use crate::domain::dispute_registry::DisputeRegistry;
use crate::domain::ids::{DisputeId, MatchId, UserId};
use crate::domain::match_registry::MatchRegistry;
use crate::domain::{EventBus, MarketEvent, UserRegistry};
use crate::error::CoreError;
use crate::service::WalletService;

/// Orchestration layer for dispute resolution and user trust.
#[derive(Debug, Clone)]
pub struct DisputeService {
    disputes: Arc<DisputeRegistry>,
    matches: Arc<MatchRegistry>,
    users: Arc<UserRegistry>,
    wallet: WalletService,
    event_bus: EventBus,
    dispute_window_days: i64,
}

impl DisputeService {
    /// Creates a new `DisputeService`.
    #[must_use]
    pub fn new(
        disputes: Arc<DisputeRegistry>,
        matches: Arc<MatchRegistry>,
        users: Arc<UserRegistry>,
        wallet: WalletService,
        event_bus: EventBus,
        dispute_window_days: i64,
    ) -> Self {
        Self {
            disputes,
            matches,
            users,
            wallet,
            event_bus,
            dispute_window_days,
        }
    }

    /// Returns a reference to the dispute registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<DisputeRegistry> {
        &self.disputes
    }

    /// Opens a dispute against a match.
    ///
    /// Allowed while the match is accepted, and on a terminal match
    /// (completed or cancelled) within the resolution window. At most one
    /// non-terminal dispute may exist per match.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotParticipant`] if the opener is neither party.
    /// - [`CoreError::InvalidTransition`] outside the disputable states
    ///   or past the resolution window.
    /// - [`CoreError::DuplicateDispute`] if an active dispute exists.
    pub async fn open(
        &self,
        match_id: MatchId,
        opener_id: UserId,
        reason: String,
        description: String,
    ) -> Result<Dispute, CoreError> {
        let m = self.matches.snapshot(match_id).await?;
        if !m.is_participant(opener_id) {
            return Err(CoreError::NotParticipant {
                user_id: opener_id,
                match_id,
            });
        }
        match m.status {
            MatchStatus::Accepted => {}
            MatchStatus::Completed | MatchStatus::Cancelled => {
                let window = Duration::days(self.dispute_window_days);
                if Utc::now() - m.updated_at > window {
                    return Err(CoreError::InvalidTransition {
                        action: "dispute",
                        status: format!("{} outside the resolution window", m.status.as_str()),
                    });
                }
            }
            MatchStatus::Pending | MatchStatus::Rejected => {
                return Err(CoreError::InvalidTransition {
                    action: "dispute",
                    status: m.status.as_str().to_string(),
                });
            }
        }

        let dispute = Dispute::new(match_id, opener_id, reason.clone(), description);
        let snapshot = dispute.clone();
        self.disputes.insert(dispute).await?;

        let _ = self.event_bus.publish(MarketEvent::DisputeOpened {
            dispute_id: snapshot.id,
            match_id,
            opener_id,
            reason,
            timestamp: Utc::now(),
        });
        tracing::info!(dispute_id = %snapshot.id, %match_id, %opener_id, "dispute opened");
        Ok(snapshot)
    }

    /// Marks an open dispute as under review. Admin-only, informational;
    /// no side effects beyond the status.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DisputeNotFound`] for an unknown dispute.
    /// - [`CoreError::InvalidTransition`] unless the dispute is `open`.
    pub async fn mark_under_review(
        &self,
        dispute_id: DisputeId,
        admin_id: UserId,
    ) -> Result<Dispute, CoreError> {
        let entry = self.disputes.get(dispute_id).await?;
        let mut d = entry.write().await;
        if d.status != DisputeStatus::Open {
            return Err(CoreError::InvalidTransition {
                action: "review",
                status: d.status.as_str().to_string(),
            });
        }
        d.status = DisputeStatus::UnderReview;
        let snapshot = d.clone();
        drop(d);

        let _ = self.event_bus.publish(MarketEvent::DisputeUnderReview {
            dispute_id,
            admin_id,
            timestamp: Utc::now(),
        });
        tracing::info!(%dispute_id, %admin_id, "dispute under review");
        Ok(snapshot)
    }

    /// Resolves a dispute: refund, penalty, and status flip as one unit.
    ///
    /// Refund variants compute `total_price × percentage / 100` and credit
    /// the paying party (the requester). A strike that reaches the
    /// threshold sets the ban in the same operation, visible to every
    /// subsequent `create`/`accept` ban check. Re-resolving is detected
    /// under the same write lock and refused — there is no path to a
    /// second refund.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DisputeNotFound`] for an unknown dispute.
    /// - [`CoreError::AlreadyResolved`] if the dispute already terminated.
    /// - [`CoreError::InvalidRequest`] for a refund resolution on a match
    ///   without a total price.
    pub async fn resolve(
        &self,
        dispute_id: DisputeId,
        resolution: Resolution,
        admin_action: AdminAction,
        admin_id: UserId,
        admin_notes: Option<String>,
    ) -> Result<Dispute, CoreError> {
        let entry = self.disputes.get(dispute_id).await?;
        let mut d = entry.write().await;
        if d.status.is_terminal() {
            return Err(CoreError::AlreadyResolved(dispute_id));
        }
        let match_id = d.match_id;
        let match_entry = self.matches.get(match_id).await?;
        let mut m = match_entry.write().await;

        // Money first, then trust, then the status flip — all while both
        // locks are held, so a concurrent resolve is parked until the
        // terminal status is visible.
        let mut refund_amount = None;
        if let Some(pct) = resolution.refund_percentage() {
            let Some(total_price) = m.total_price else {
                return Err(CoreError::InvalidRequest(
                    "match has no total price; a refund resolution does not apply".to_string(),
                ));
            };
            let amount = total_price * Decimal::from(pct) / Decimal::from(100u8);
            let tx_id = self
                .wallet
                .refund(m.requester_id, amount, match_id, "dispute resolution")
                .await?;
            m.refund = Some(RefundRecord {
                percentage: pct,
                amount,
                tx_id,
                issued_at: Utc::now(),
            });
            refund_amount = Some(amount);
        }

        self.apply_admin_action(admin_action).await;

        d.status = if resolution == Resolution::Closed {
            DisputeStatus::Closed
        } else {
            DisputeStatus::Resolved
        };
        d.resolution = Some(resolution);
        d.admin_action = Some(admin_action);
        d.resolved_by = Some(admin_id);
        d.admin_notes = admin_notes;
        d.resolved_at = Some(Utc::now());
        let snapshot = d.clone();

        m.dispute = Some(dispute_id);
        m.touch();
        drop(m);
        drop(d);

        self.disputes.release_active(match_id, dispute_id).await;

        let _ = self.event_bus.publish(MarketEvent::DisputeResolved {
            dispute_id,
            match_id,
            resolution,
            refund_amount,
            admin_id,
            timestamp: Utc::now(),
        });
        tracing::info!(
            %dispute_id,
            %match_id,
            %admin_id,
            resolution = ?resolution,
            "dispute resolved"
        );
        Ok(snapshot)
    }

    /// Applies a strike or ban outside a dispute, for direct admin use.
    ///
    /// Shares the event emission with dispute-driven penalties so the
    /// audit trail is uniform.
    pub async fn apply_admin_action(&self, action: AdminAction) {
        match action {
            AdminAction::Strike { user_id } => {
                let outcome = self.users.strike(user_id).await;
                let _ = self.event_bus.publish(MarketEvent::UserStruck {
                    user_id,
                    strikes: outcome.strikes,
                    timestamp: Utc::now(),
                });
                if outcome.banned {
                    let _ = self.event_bus.publish(MarketEvent::UserBanned {
                        user_id,
                        timestamp: Utc::now(),
                    });
                    tracing::warn!(%user_id, "third strike: user banned");
                }
            }
            AdminAction::Ban { user_id } => {
                if self.users.ban(user_id).await {
                    let _ = self.event_bus.publish(MarketEvent::UserBanned {
                        user_id,
                        timestamp: Utc::now(),
                    });
                    tracing::warn!(%user_id, "user banned by admin action");
                }
            }
            AdminAction::None | AdminAction::Warning { .. } | AdminAction::RemoveContent => {}
        }
    }

    /// Returns a snapshot of a dispute.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DisputeNotFound`] for an unknown dispute.
    pub async fn get(&self, dispute_id: DisputeId) -> Result<Dispute, CoreError> {
        self.disputes.snapshot(dispute_id).await
    }

    /// Returns dispute snapshots, optionally filtered by status.
    pub async fn list(&self, status: Option<DisputeStatus>) -> Vec<Dispute> {
        self.disputes.list(status).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::experience::{ExperienceInfo, ExperienceKind};
    use crate::domain::match_registry::MatchFilter;
    use crate::domain::{ExperienceCatalog, Match};
    use crate::ledger::LedgerStore;
    use crate::service::match_service::{MatchPolicy, MatchService};

    fn eur(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    struct Fixture {
        disputes: DisputeService,
        matches: MatchService,
        wallet: WalletService,
        users: Arc<UserRegistry>,
        host: UserId,
        requester: UserId,
        experience_id: uuid::Uuid,
    }

    async fn fixture() -> Fixture {
        let ledger = Arc::new(LedgerStore::new());
        let event_bus = EventBus::new(1000);
        let wallet = WalletService::new(Arc::clone(&ledger), event_bus.clone(), eur(500), eur(150));
        let users = Arc::new(UserRegistry::new());
        let catalog = Arc::new(ExperienceCatalog::new());
        let match_registry = Arc::new(MatchRegistry::new());

        let host = UserId::new();
        let requester = UserId::new();
        let experience_id = uuid::Uuid::new_v4();
        catalog
            .upsert(
                experience_id,
                ExperienceInfo {
                    host_id: host,
                    kind: ExperienceKind::Pago,
                    price_per_person: Some(eur(4500)),
                    capacity: 6,
                },
            )
            .await;
        for user in [host, requester] {
            let r = wallet.top_up(user, eur(1000)).await;
            assert!(r.is_ok());
        }

        let matches = MatchService::new(
            Arc::clone(&match_registry),
            Arc::clone(&users),
            catalog,
            wallet.clone(),
            event_bus.clone(),
            MatchPolicy::default(),
        );
        let disputes = DisputeService::new(
            Arc::new(DisputeRegistry::new()),
            match_registry,
            Arc::clone(&users),
            wallet.clone(),
            event_bus,
            14,
        );
        Fixture {
            disputes,
            matches,
            wallet,
            users,
            host,
            requester,
            experience_id,
        }
    }

    /// Creates, accepts, and completes a 2-person match (total €90).
    async fn completed_match(f: &Fixture) -> Match {
        let Ok(m) = f
            .matches
            .create(f.requester, f.experience_id, 2, None)
            .await
        else {
            panic!("create must succeed");
        };
        let r = f.matches.accept(m.id, f.host).await;
        assert!(r.is_ok());
        let Ok(done) = f.matches.complete(m.id, Some(f.host)).await else {
            panic!("complete must succeed");
        };
        done
    }

    #[tokio::test]
    async fn open_requires_participant() {
        let f = fixture().await;
        let m = completed_match(&f).await;
        let result = f
            .disputes
            .open(m.id, UserId::new(), "no_show".into(), "".into())
            .await;
        assert!(matches!(result, Err(CoreError::NotParticipant { .. })));
    }

    #[tokio::test]
    async fn open_rejected_on_pending_match() {
        let f = fixture().await;
        let Ok(m) = f
            .matches
            .create(f.requester, f.experience_id, 1, None)
            .await
        else {
            panic!("create must succeed");
        };
        let result = f
            .disputes
            .open(m.id, f.requester, "no_show".into(), "".into())
            .await;
        assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn second_active_dispute_rejected() {
        let f = fixture().await;
        let m = completed_match(&f).await;
        let r = f
            .disputes
            .open(m.id, f.requester, "no_show".into(), "host absent".into())
            .await;
        assert!(r.is_ok());

        let result = f
            .disputes
            .open(m.id, f.host, "abuse".into(), "".into())
            .await;
        assert!(matches!(result, Err(CoreError::DuplicateDispute(_))));
    }

    #[tokio::test]
    async fn partial_refund_credits_half_total_price() {
        let f = fixture().await;
        let m = completed_match(&f).await;
        // After accept both wallets hold 8.50.
        let Ok(d) = f
            .disputes
            .open(m.id, f.requester, "quality".into(), "not as described".into())
            .await
        else {
            panic!("open must succeed");
        };
        let admin = UserId::new();
        let r = f.disputes.mark_under_review(d.id, admin).await;
        assert!(r.is_ok());

        let Ok(partial) = Resolution::partial(50) else {
            panic!("50% is valid");
        };
        let Ok(resolved) = f
            .disputes
            .resolve(d.id, partial, AdminAction::None, admin, None)
            .await
        else {
            panic!("resolve must succeed");
        };
        assert_eq!(resolved.status, DisputeStatus::Resolved);
        assert_eq!(resolved.resolved_by, Some(admin));

        // €90 total, 50% → €45 to the paying party.
        assert_eq!(f.wallet.balance(f.requester).await, eur(850) + eur(4500));

        let Ok(updated) = f.matches.get(m.id).await else {
            panic!("match must exist");
        };
        assert_eq!(updated.dispute, Some(d.id));
        let Some(refund) = updated.refund else {
            panic!("refund recorded on match");
        };
        assert_eq!(refund.amount, eur(4500));
    }

    #[tokio::test]
    async fn second_resolve_errors_without_second_refund() {
        let f = fixture().await;
        let m = completed_match(&f).await;
        let Ok(d) = f
            .disputes
            .open(m.id, f.requester, "no_show".into(), "".into())
            .await
        else {
            panic!("open must succeed");
        };
        let admin = UserId::new();
        let r = f
            .disputes
            .resolve(d.id, Resolution::Refund, AdminAction::None, admin, None)
            .await;
        assert!(r.is_ok());
        let after_first = f.wallet.balance(f.requester).await;

        let second = f
            .disputes
            .resolve(d.id, Resolution::Refund, AdminAction::None, admin, None)
            .await;
        assert!(matches!(second, Err(CoreError::AlreadyResolved(_))));
        assert_eq!(f.wallet.balance(f.requester).await, after_first);
    }

    #[tokio::test]
    async fn concurrent_resolves_have_one_winner() {
        let f = fixture().await;
        let m = completed_match(&f).await;
        let Ok(d) = f
            .disputes
            .open(m.id, f.requester, "no_show".into(), "".into())
            .await
        else {
            panic!("open must succeed");
        };
        let admin = UserId::new();
        let before = f.wallet.balance(f.requester).await;

        let s1 = f.disputes.clone();
        let s2 = f.disputes.clone();
        let id = d.id;
        let a = tokio::spawn(async move {
            s1.resolve(id, Resolution::Refund, AdminAction::None, admin, None)
                .await
        });
        let b = tokio::spawn(async move {
            s2.resolve(id, Resolution::Refund, AdminAction::None, admin, None)
                .await
        });
        let (ra, rb) = (a.await, b.await);
        let (Ok(ra), Ok(rb)) = (ra, rb) else {
            panic!("resolve tasks must not panic");
        };
        assert_eq!(u8::from(ra.is_ok()) + u8::from(rb.is_ok()), 1);
        // Exactly one refund of the full €90.
        assert_eq!(f.wallet.balance(f.requester).await, before + eur(9000));
    }

    #[tokio::test]
    async fn no_refund_resolution_moves_no_money() {
        let f = fixture().await;
        let m = completed_match(&f).await;
        let Ok(d) = f
            .disputes
            .open(m.id, f.requester, "quality".into(), "".into())
            .await
        else {
            panic!("open must succeed");
        };
        let before = f.wallet.balance(f.requester).await;
        let r = f
            .disputes
            .resolve(
                d.id,
                Resolution::NoRefund,
                AdminAction::None,
                UserId::new(),
                None,
            )
            .await;
        assert!(r.is_ok());
        assert_eq!(f.wallet.balance(f.requester).await, before);
    }

    #[tokio::test]
    async fn closed_resolution_sets_closed_status() {
        let f = fixture().await;
        let m = completed_match(&f).await;
        let Ok(d) = f
            .disputes
            .open(m.id, f.requester, "spam".into(), "".into())
            .await
        else {
            panic!("open must succeed");
        };
        let Ok(closed) = f
            .disputes
            .resolve(
                d.id,
                Resolution::Closed,
                AdminAction::None,
                UserId::new(),
                Some("not actionable".into()),
            )
            .await
        else {
            panic!("resolve must succeed");
        };
        assert_eq!(closed.status, DisputeStatus::Closed);
    }

    #[tokio::test]
    async fn third_strike_bans_and_blocks_future_creates() {
        let f = fixture().await;
        let admin = UserId::new();

        // Two prior strikes from earlier incidents.
        f.users.strike(f.requester).await;
        f.users.strike(f.requester).await;

        let m = completed_match(&f).await;
        let Ok(d) = f
            .disputes
            .open(m.id, f.host, "abuse".into(), "requester trashed the venue".into())
            .await
        else {
            panic!("open must succeed");
        };
        let r = f
            .disputes
            .resolve(
                d.id,
                Resolution::NoRefund,
                AdminAction::Strike {
                    user_id: f.requester,
                },
                admin,
                None,
            )
            .await;
        assert!(r.is_ok());

        let Some(account) = f.users.get(f.requester).await else {
            panic!("struck user must exist");
        };
        assert_eq!(account.strikes, 3);
        assert!(account.banned_at.is_some());

        // Any subsequent create by the banned user fails immediately.
        let result = f
            .matches
            .create(f.requester, f.experience_id, 1, None)
            .await;
        assert!(matches!(result, Err(CoreError::UserBanned(_))));
    }

    #[tokio::test]
    async fn resolved_dispute_frees_the_match_for_a_new_one() {
        let f = fixture().await;
        let m = completed_match(&f).await;
        let Ok(d) = f
            .disputes
            .open(m.id, f.requester, "no_show".into(), "".into())
            .await
        else {
            panic!("open must succeed");
        };
        let r = f
            .disputes
            .resolve(d.id, Resolution::NoRefund, AdminAction::None, UserId::new(), None)
            .await;
        assert!(r.is_ok());

        // The invariant is one *active* dispute per match.
        let again = f
            .disputes
            .open(m.id, f.host, "retaliation".into(), "".into())
            .await;
        assert!(again.is_ok());
        assert_eq!(f.disputes.list(None).await.len(), 2);
        assert_eq!(
            f.matches
                .list(MatchFilter {
                    status: Some(MatchStatus::Completed),
                    participant: None,
                })
                .await
                .len(),
            1
        );
    }
}
