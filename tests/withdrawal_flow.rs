//! End-to-end workflow tests over the in-memory store.
//!
//! Covers the reservation invariants, the terminal-state machine and the
//! payment-method lifecycle, including the documented scenarios A-E.

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use payout_core::wallet::error::WalletError;
use payout_core::wallet::memory::MemoryStore;
use payout_core::wallet::method::MethodService;
use payout_core::wallet::notify::{NotifyTarget, RecordingNotifier};
use payout_core::wallet::store::WalletStore;
use payout_core::wallet::types::{AccountId, MethodDetails, Page, Tier, WithdrawalStatus};
use payout_core::wallet::withdraw::WithdrawService;

fn dec(v: i64) -> Decimal {
    Decimal::from(v)
}

struct TestContext {
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    withdrawals: WithdrawService,
    methods: MethodService,
}

fn setup() -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    TestContext {
        store: store.clone(),
        notifier: notifier.clone(),
        withdrawals: WithdrawService::new(store.clone(), notifier),
        methods: MethodService::new(store),
    }
}

fn bank_details() -> MethodDetails {
    MethodDetails::Bank {
        account_number: "12345678".to_string(),
        bank_name: "First Bank".to_string(),
        account_holder: "Ada Lovelace".to_string(),
    }
}

async fn seed_account(ctx: &TestContext, tier: Tier, balance: i64) -> AccountId {
    let account = ctx.store.create_account(tier).await.unwrap();
    if balance > 0 {
        ctx.store
            .credit(account.account_id, dec(balance))
            .await
            .unwrap();
    }
    account.account_id
}

async fn seed_bank_method(ctx: &TestContext, account_id: AccountId) -> Uuid {
    let summary = ctx.methods.add(account_id, bank_details()).await.unwrap();
    summary.method_id
}

#[tokio::test]
async fn scenario_a_successful_bank_withdrawal() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    assert_eq!(withdrawal.status, WithdrawalStatus::Pending);
    assert_eq!(withdrawal.amount, dec(200));
    assert_eq!(withdrawal.fee, dec(4), "bank fee is 2% of 200");

    let ledger = ctx.withdrawals.balance(account_id).await.unwrap();
    assert_eq!(ledger.available(), dec(300));
    assert_eq!(ledger.pending_withdrawals(), dec(200));
}

#[tokio::test]
async fn scenario_b_cancel_restores_balance() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    let cancelled = ctx
        .withdrawals
        .cancel(account_id, withdrawal.request_id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, WithdrawalStatus::Cancelled);

    let ledger = ctx.withdrawals.balance(account_id).await.unwrap();
    assert_eq!(ledger.available(), dec(500), "round trip restores balance");
    assert_eq!(ledger.pending_withdrawals(), Decimal::ZERO);
}

#[tokio::test]
async fn scenario_c_insufficient_balance_leaves_state_untouched() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 50).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let err = ctx
        .withdrawals
        .create(account_id, dec(100), method_id, serde_json::Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance));

    let ledger = ctx.withdrawals.balance(account_id).await.unwrap();
    assert_eq!(ledger.available(), dec(50));
    assert_eq!(ledger.pending_withdrawals(), Decimal::ZERO);
    assert!(
        ctx.withdrawals
            .history(account_id, Page::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn scenario_d_below_minimum_fails_validation() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let err = ctx
        .withdrawals
        .create(account_id, dec(5), method_id, serde_json::Value::Null)
        .await
        .unwrap_err();
    match err {
        WalletError::Validation(msg) => assert!(msg.contains("minimum")),
        other => panic!("expected Validation, got {:?}", other),
    }

    let ledger = ctx.withdrawals.balance(account_id).await.unwrap();
    assert_eq!(ledger.available(), dec(500));
    assert_eq!(ledger.pending_withdrawals(), Decimal::ZERO);
}

#[tokio::test]
async fn scenario_e_method_removal_blocked_by_pending_reference() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    let err = ctx.methods.remove(account_id, method_id).await.unwrap_err();
    assert!(matches!(err, WalletError::Conflict(_)));

    ctx.withdrawals
        .cancel(account_id, withdrawal.request_id)
        .await
        .unwrap();

    // No pending reference left; removal now succeeds
    ctx.methods.remove(account_id, method_id).await.unwrap();
    assert!(ctx.methods.list(account_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn boundary_amounts_are_inclusive() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 5_000).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    // Exactly min and exactly max both succeed
    ctx.withdrawals
        .create(account_id, dec(10), method_id, serde_json::Value::Null)
        .await
        .unwrap();
    ctx.withdrawals
        .create(account_id, dec(1_000), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    // One unit outside either bound fails validation
    let err = ctx
        .withdrawals
        .create(account_id, dec(9), method_id, serde_json::Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::Validation(_)));

    let err = ctx
        .withdrawals
        .create(account_id, dec(1_001), method_id, serde_json::Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::Validation(_)));
}

#[tokio::test]
async fn higher_tiers_get_higher_ceilings() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Verified, 10_000).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    // 5000 is over the basic ceiling but exactly the verified one
    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(5_000), method_id, serde_json::Value::Null)
        .await
        .unwrap();
    assert_eq!(withdrawal.amount, dec(5_000));

    let limits = ctx.withdrawals.limits(account_id).await.unwrap();
    assert_eq!(limits.max_amount, dec(5_000));
    assert_eq!(limits.monthly_limit, dec(25_000));
}

#[tokio::test]
async fn cancel_is_terminal_and_idempotently_rejected() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    ctx.withdrawals
        .cancel(account_id, withdrawal.request_id)
        .await
        .unwrap();

    // Second cancel conflicts; the state never regresses
    let err = ctx
        .withdrawals
        .cancel(account_id, withdrawal.request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::Conflict(_)));

    // Operator actions on a terminal request conflict too
    let err = ctx
        .withdrawals
        .approve(withdrawal.request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::Conflict(_)));

    // Balance released exactly once
    let ledger = ctx.withdrawals.balance(account_id).await.unwrap();
    assert_eq!(ledger.available(), dec(500));
}

#[tokio::test]
async fn approve_settles_the_reservation() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    let approved = ctx
        .withdrawals
        .approve(withdrawal.request_id)
        .await
        .unwrap();
    assert_eq!(approved.status, WithdrawalStatus::Approved);

    // Reserved funds left for the settlement rail; available untouched
    let ledger = ctx.withdrawals.balance(account_id).await.unwrap();
    assert_eq!(ledger.available(), dec(300));
    assert_eq!(ledger.pending_withdrawals(), Decimal::ZERO);
}

#[tokio::test]
async fn reject_releases_the_reservation() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    let rejected = ctx
        .withdrawals
        .reject(withdrawal.request_id)
        .await
        .unwrap();
    assert_eq!(rejected.status, WithdrawalStatus::Rejected);

    let ledger = ctx.withdrawals.balance(account_id).await.unwrap();
    assert_eq!(ledger.available(), dec(500));
    assert_eq!(ledger.pending_withdrawals(), Decimal::ZERO);
}

#[tokio::test]
async fn reservation_counts_against_subsequent_requests() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    ctx.withdrawals
        .create(account_id, dec(400), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    // Only 100 available now; a 200 request must fail
    let err = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance));
}

#[tokio::test]
async fn precondition_order_balance_before_method() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 50).await;

    // Both the balance and the method are invalid; the sufficiency
    // failure wins because it is checked first
    let err = ctx
        .withdrawals
        .create(
            account_id,
            dec(100),
            Uuid::new_v4(),
            serde_json::Value::Null,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance));
}

#[tokio::test]
async fn foreign_method_is_rejected() {
    let ctx = setup();
    let owner = seed_account(&ctx, Tier::Basic, 500).await;
    let intruder = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, owner).await;

    let err = ctx
        .withdrawals
        .create(intruder, dec(100), method_id, serde_json::Value::Null)
        .await
        .unwrap_err();
    match err {
        WalletError::Validation(msg) => assert!(msg.contains("invalid payment method")),
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn fee_rate_depends_on_method_kind() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 1_000).await;

    let crypto = ctx
        .methods
        .add(
            account_id,
            MethodDetails::Crypto {
                wallet_address: "0xabcdef0123456789".to_string(),
                network: "ethereum".to_string(),
            },
        )
        .await
        .unwrap();
    let paypal = ctx
        .methods
        .add(
            account_id,
            MethodDetails::Paypal {
                email: "ada@example.com".to_string(),
            },
        )
        .await
        .unwrap();

    let w1 = ctx
        .withdrawals
        .create(
            account_id,
            dec(200),
            crypto.method_id,
            serde_json::Value::Null,
        )
        .await
        .unwrap();
    assert_eq!(w1.fee, dec(2), "crypto fee is 1%");

    let w2 = ctx
        .withdrawals
        .create(
            account_id,
            dec(200),
            paypal.method_id,
            serde_json::Value::Null,
        )
        .await
        .unwrap();
    assert_eq!(w2.fee, dec(6), "paypal fee is 3%");
}

#[tokio::test]
async fn history_is_paginated_newest_first() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 1_000).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let mut request_ids = Vec::new();
    for amount in [100, 200, 300] {
        let w = ctx
            .withdrawals
            .create(account_id, dec(amount), method_id, serde_json::Value::Null)
            .await
            .unwrap();
        request_ids.push(w.request_id);
    }

    let first_page = ctx
        .withdrawals
        .history(account_id, Page::new(1, 2))
        .await
        .unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].amount, dec(300), "newest first");
    assert_eq!(first_page[1].amount, dec(200));

    let second_page = ctx
        .withdrawals
        .history(account_id, Page::new(2, 2))
        .await
        .unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].amount, dec(100));
}

#[tokio::test]
async fn queries_are_scoped_to_the_owner() {
    let ctx = setup();
    let owner = seed_account(&ctx, Tier::Basic, 500).await;
    let other = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, owner).await;

    let withdrawal = ctx
        .withdrawals
        .create(owner, dec(100), method_id, serde_json::Value::Null)
        .await
        .unwrap();

    // Owner sees it
    let fetched = ctx
        .withdrawals
        .get(owner, withdrawal.request_id)
        .await
        .unwrap();
    assert_eq!(fetched.request_id, withdrawal.request_id);

    // Anyone else gets NotFound, for get and for cancel
    let err = ctx
        .withdrawals
        .get(other, withdrawal.request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::NotFound(_)));

    let err = ctx
        .withdrawals
        .cancel(other, withdrawal.request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::NotFound(_)));

    // And the reservation is still in place
    let ledger = ctx.withdrawals.balance(owner).await.unwrap();
    assert_eq!(ledger.pending_withdrawals(), dec(100));
}

#[tokio::test]
async fn limits_for_unknown_account_not_found() {
    let ctx = setup();
    let err = ctx.withdrawals.limits(4242).await.unwrap_err();
    assert!(matches!(err, WalletError::NotFound(_)));
}

#[tokio::test]
async fn listed_methods_are_redacted() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 0).await;
    ctx.methods.add(account_id, bank_details()).await.unwrap();

    let listed = ctx.methods.list(account_id).await.unwrap();
    assert_eq!(listed.len(), 1);

    let serialized = serde_json::to_string(&listed).unwrap();
    assert!(
        !serialized.contains("12345678"),
        "raw account number must not leak through the list operation"
    );
    assert!(serialized.contains("****5678"));
}

#[tokio::test]
async fn invalid_method_details_are_rejected_before_persisting() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 0).await;

    let err = ctx
        .methods
        .add(
            account_id,
            MethodDetails::Crypto {
                wallet_address: "0xabc".to_string(),
                network: "".to_string(),
            },
        )
        .await
        .unwrap_err();
    match err {
        WalletError::Validation(msg) => assert!(msg.contains("network")),
        other => panic!("expected Validation, got {:?}", other),
    }

    assert!(ctx.methods.list(account_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn notifications_follow_the_transitions() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap();
    ctx.withdrawals
        .cancel(account_id, withdrawal.request_id)
        .await
        .unwrap();

    let sent = ctx.notifier.sent();
    assert_eq!(sent.len(), 2);

    // Create notifies the operators with the request data
    assert_eq!(sent[0].0, NotifyTarget::Operators);
    assert_eq!(sent[0].1.event, "withdrawal.requested");
    assert_eq!(
        sent[0].1.data["request_id"],
        serde_json::json!(withdrawal.request_id)
    );

    // Cancel notifies the account holder
    assert_eq!(sent[1].0, NotifyTarget::Account(account_id));
    assert_eq!(sent[1].1.event, "withdrawal.cancelled");
}

#[tokio::test]
async fn approve_notification_carries_net_amount() {
    let ctx = setup();
    let account_id = seed_account(&ctx, Tier::Basic, 500).await;
    let method_id = seed_bank_method(&ctx, account_id).await;

    let withdrawal = ctx
        .withdrawals
        .create(account_id, dec(200), method_id, serde_json::Value::Null)
        .await
        .unwrap();
    ctx.withdrawals
        .approve(withdrawal.request_id)
        .await
        .unwrap();

    let sent = ctx.notifier.sent();
    let approve_note = &sent.last().unwrap().1;
    assert_eq!(approve_note.event, "withdrawal.approved");
    // 200 - 4 fee
    let net: Decimal = approve_note.data["net"].as_str().unwrap().parse().unwrap();
    assert_eq!(net, dec(196));
}
