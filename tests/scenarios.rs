//! End-to-end scenarios for the booking, wallet, and dispute core,
//! exercised at the service layer.

#![allow(clippy::panic, clippy::indexing_slicing, missing_docs, missing_debug_implementations)]

mod common;

use common::{Harness, eur};
use rust_decimal::Decimal;
use tokio_test::assert_ok;

use verbena_core::domain::booking::MatchStatus;
use verbena_core::domain::dispute::{AdminAction, DisputeStatus, Resolution};
use verbena_core::domain::experience::ExperienceKind;
use verbena_core::domain::ids::UserId;
use verbena_core::domain::transaction::TransactionKind;
use verbena_core::error::CoreError;

/// Scenario A: €45/person paid experience, 2 participants, host accepts.
/// Both wallets pay the €1.50 fee; total price stored as €90.
#[tokio::test]
async fn scenario_a_accept_charges_both_parties() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 2, None)
        .await
    else {
        panic!("create must succeed");
    };
    assert_eq!(m.total_price, Some(eur(9000)));

    let Ok(accepted) = h.state.match_service.accept(m.id, h.host).await else {
        panic!("accept must succeed");
    };
    assert_eq!(accepted.status, MatchStatus::Accepted);
    assert_eq!(h.state.wallet_service.balance(h.host).await, eur(850));
    assert_eq!(h.state.wallet_service.balance(h.requester).await, eur(850));

    // Exactly two platform-fee transactions reference the match, one per
    // party.
    let ledger = h.state.wallet_service.ledger();
    assert_eq!(
        ledger
            .count_for_match(h.host, m.id, TransactionKind::PlatformFee)
            .await,
        1
    );
    assert_eq!(
        ledger
            .count_for_match(h.requester, m.id, TransactionKind::PlatformFee)
            .await,
        1
    );
}

/// Scenario B: requester's balance is €0.50, below the fee. Accept fails
/// with a funding error, the match stays pending, nothing is written.
#[tokio::test]
async fn scenario_b_underfunded_accept_fails_cleanly() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 2, None)
        .await
    else {
        panic!("create must succeed while the wallet is funded");
    };

    // The requester's balance drains to €0.50 between create and accept
    // (the create-time check is only optimistic).
    let r = h
        .state
        .wallet_service
        .ledger()
        .debit(h.requester, eur(950), TransactionKind::Payout, None)
        .await;
    assert!(r.is_ok());

    let result = h.state.match_service.accept(m.id, h.host).await;
    let Err(CoreError::FundingFailed { user_id, .. }) = result else {
        panic!("expected a distinct funding failure");
    };
    assert_eq!(user_id, h.requester);

    let Ok(still) = h.state.match_service.get(m.id).await else {
        panic!("match must exist");
    };
    assert_eq!(still.status, MatchStatus::Pending);
    // No fee transaction was created on either side.
    assert_eq!(h.state.wallet_service.balance(h.host).await, eur(1000));
    assert_eq!(h.state.wallet_service.balance(h.requester).await, eur(50));
    let fees = h
        .state
        .wallet_service
        .ledger()
        .count_for_match(h.host, m.id, TransactionKind::PlatformFee)
        .await;
    assert_eq!(fees, 0);
}

/// Scenario B continued: create itself refuses when the requester cannot
/// even optimistically cover the fee.
#[tokio::test]
async fn scenario_b_create_precheck() {
    let h = Harness::new().await;
    let result = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 1, None)
        .await;
    assert!(matches!(result, Err(CoreError::FundingFailed { .. })));
}

/// Scenario C: host cancels an accepted match; the requester gets the
/// full fee back as a refund transaction.
#[tokio::test]
async fn scenario_c_host_cancel_full_refund() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 1, None)
        .await
    else {
        panic!("create must succeed");
    };
    tokio_test::assert_ok!(h.state.match_service.accept(m.id, h.host).await);

    let Ok(cancelled) = h.state.match_service.cancel(m.id, h.host).await else {
        panic!("cancel must succeed");
    };
    assert_eq!(cancelled.status, MatchStatus::Cancelled);
    let Some(refund) = cancelled.refund else {
        panic!("refund must be recorded for display");
    };
    assert_eq!(refund.percentage, 100);
    assert_eq!(refund.amount, eur(150));

    // The refund is a credit transaction, not an edit of the fee entry.
    let page = h
        .state
        .wallet_service
        .transactions(h.requester, 1, 10, Some(TransactionKind::Refund))
        .await;
    assert_eq!(page.total, 1);
    assert_eq!(h.state.wallet_service.balance(h.requester).await, eur(1000));
}

/// Scenario D: dispute on a completed €90 match resolved with a 50%
/// partial refund → €45 credit; a second resolve attempt errors.
#[tokio::test]
async fn scenario_d_partial_refund_dispute() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 2, None)
        .await
    else {
        panic!("create must succeed");
    };
    tokio_test::assert_ok!(h.state.match_service.accept(m.id, h.host).await);
    tokio_test::assert_ok!(h.state.match_service.complete(m.id, Some(h.host)).await);

    let Ok(d) = h
        .state
        .dispute_service
        .open(m.id, h.requester, "quality".into(), "not as described".into())
        .await
    else {
        panic!("open must succeed");
    };

    let admin = UserId::new();
    let Ok(partial) = Resolution::partial(50) else {
        panic!("50% is valid");
    };
    let Ok(resolved) = h
        .state
        .dispute_service
        .resolve(d.id, partial, AdminAction::None, admin, None)
        .await
    else {
        panic!("resolve must succeed");
    };
    assert_eq!(resolved.status, DisputeStatus::Resolved);

    // €90 × 50% = €45 to the paying party, on top of 10.00 - 1.50.
    assert_eq!(
        h.state.wallet_service.balance(h.requester).await,
        eur(850) + eur(4500)
    );

    let second = h
        .state
        .dispute_service
        .resolve(d.id, Resolution::Refund, AdminAction::None, admin, None)
        .await;
    assert!(matches!(second, Err(CoreError::AlreadyResolved(_))));
    // Still exactly one refund.
    let page = h
        .state
        .wallet_service
        .transactions(h.requester, 1, 10, Some(TransactionKind::Refund))
        .await;
    assert_eq!(page.total, 1);
}

/// Scenario E: a third strike issued through dispute resolution bans the
/// user in the same operation; their next create fails immediately.
#[tokio::test]
async fn scenario_e_third_strike_bans() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    h.state.users.strike(h.requester).await;
    h.state.users.strike(h.requester).await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 1, None)
        .await
    else {
        panic!("create must succeed");
    };
    let r = h.state.match_service.accept(m.id, h.host).await;
    assert!(r.is_ok());
    let r = h.state.match_service.complete(m.id, Some(h.host)).await;
    assert!(r.is_ok());

    let Ok(d) = h
        .state
        .dispute_service
        .open(m.id, h.host, "abuse".into(), "".into())
        .await
    else {
        panic!("open must succeed");
    };
    let r = h
        .state
        .dispute_service
        .resolve(
            d.id,
            Resolution::NoRefund,
            AdminAction::Strike {
                user_id: h.requester,
            },
            UserId::new(),
            None,
        )
        .await;
    assert!(r.is_ok());

    let Some(account) = h.state.users.get(h.requester).await else {
        panic!("struck user must exist");
    };
    assert_eq!(account.strikes, 3);
    assert!(account.banned_at.is_some());

    let result = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 1, None)
        .await;
    assert!(matches!(result, Err(CoreError::UserBanned(_))));
}

/// Wallet invariant: balances always equal the settled log sum, through
/// an arbitrary sequence of fees, refunds, and top-ups.
#[tokio::test]
async fn ledger_invariant_holds_across_full_lifecycle() {
    let h = Harness::new().await;
    h.fund_parties(2000).await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 2, None)
        .await
    else {
        panic!("create must succeed");
    };
    let r = h.state.match_service.accept(m.id, h.host).await;
    assert!(r.is_ok());
    let r = h.state.match_service.cancel(m.id, h.requester).await;
    assert!(r.is_ok());

    for user in [h.host, h.requester] {
        let Ok(reconciled) = h.state.wallet_service.reconcile(user).await else {
            panic!("consistent ledger must reconcile");
        };
        assert_eq!(reconciled, h.state.wallet_service.balance(user).await);
    }
}

/// Exchange experiences never touch the wallet through the whole flow.
#[tokio::test]
async fn exchange_flow_is_moneyless() {
    let h = Harness::new().await;
    let other_host = UserId::new();
    let exchange = h
        .add_experience(other_host, ExperienceKind::Intercambio, None, 4)
        .await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, exchange, 2, None)
        .await
    else {
        panic!("create must succeed without funds");
    };
    let Ok(accepted) = h.state.match_service.accept(m.id, other_host).await else {
        panic!("accept must succeed without funds");
    };
    assert_eq!(accepted.fee_charged, None);
    assert_eq!(accepted.total_price, None);
    assert_eq!(
        h.state.wallet_service.balance(h.requester).await,
        Decimal::ZERO
    );
    assert_eq!(
        h.state.wallet_service.balance(other_host).await,
        Decimal::ZERO
    );
}

/// Concurrency: two accepts race; one wins, one charge pair exists.
#[tokio::test]
async fn concurrent_accept_single_charge_pair() {
    let h = Harness::new().await;
    h.fund_parties(1000).await;

    let Ok(m) = h
        .state
        .match_service
        .create(h.requester, h.experience_id, 1, None)
        .await
    else {
        panic!("create must succeed");
    };

    let s1 = std::sync::Arc::clone(&h.state.match_service);
    let s2 = std::sync::Arc::clone(&h.state.match_service);
    let host = h.host;
    let id = m.id;
    let a = tokio::spawn(async move { s1.accept(id, host).await });
    let b = tokio::spawn(async move { s2.accept(id, host).await });
    let (ra, rb) = (a.await, b.await);
    let (Ok(ra), Ok(rb)) = (ra, rb) else {
        panic!("accept tasks must not panic");
    };
    assert_eq!(u8::from(ra.is_ok()) + u8::from(rb.is_ok()), 1);

    let ledger = h.state.wallet_service.ledger();
    let total_fee_entries = ledger
        .count_for_match(h.host, id, TransactionKind::PlatformFee)
        .await
        + ledger
            .count_for_match(h.requester, id, TransactionKind::PlatformFee)
            .await;
    assert_eq!(total_fee_entries, 2, "exactly one charge pair");
}
