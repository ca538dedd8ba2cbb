//! Withdrawal workflow.
//!
//! State machine: pending -> {approved, rejected, cancelled}, all three
//! terminal. Creation reserves the full requested amount out of the
//! available balance; cancel and reject release the reservation; approve
//! hands the reserved funds to the external settlement rail. Every
//! transition notifies the affected party, fire-and-forget.

use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::ledger::AccountLedger;

use super::error::WalletError;
use super::fee::withdrawal_fee;
use super::limits::{TierLimits, limits_for};
use super::notify::{Notification, Notifier, NotifyTarget};
use super::store::WalletStore;
use super::types::{AccountId, Page, Withdrawal, WithdrawalStatus};

pub struct WithdrawService {
    store: Arc<dyn WalletStore>,
    notifier: Arc<dyn Notifier>,
}

impl WithdrawService {
    pub fn new(store: Arc<dyn WalletStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Withdrawal ceilings for the account's verification tier.
    pub async fn limits(&self, account_id: AccountId) -> Result<TierLimits, WalletError> {
        let account = self
            .store
            .account(account_id)
            .await?
            .ok_or(WalletError::NotFound("account"))?;
        Ok(limits_for(account.tier))
    }

    /// Current ledger pair for an account.
    pub async fn balance(&self, account_id: AccountId) -> Result<AccountLedger, WalletError> {
        self.store.balance(account_id).await
    }

    /// Credit the available balance (top-up path).
    pub async fn credit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<AccountLedger, WalletError> {
        self.store.credit(account_id, amount).await
    }

    /// Request a withdrawal.
    ///
    /// Preconditions run in a fixed order, each with its own failure:
    /// 1. available balance covers the amount -> `InsufficientBalance`
    /// 2. the payment method is owned and active -> `Validation`
    /// 3. the amount sits inside the tier's [min, max] -> `Validation`
    ///
    /// The reservation and the request-row insert are one atomic store
    /// operation; the sufficiency check is repeated under the store's
    /// lock, so a concurrent create cannot slip past a stale read.
    pub async fn create(
        &self,
        account_id: AccountId,
        amount: Decimal,
        method_id: Uuid,
        account_details: serde_json::Value,
    ) -> Result<Withdrawal, WalletError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::validation("amount must be positive"));
        }

        let account = self
            .store
            .account(account_id)
            .await?
            .ok_or(WalletError::NotFound("account"))?;

        // 1. Sufficiency (advisory read; re-checked atomically below)
        let ledger = self.store.balance(account_id).await?;
        if ledger.available() < amount {
            return Err(WalletError::InsufficientBalance);
        }

        // 2. Method ownership
        let method = self
            .store
            .method(account_id, method_id)
            .await?
            .ok_or_else(|| WalletError::validation("invalid payment method"))?;

        // 3. Tier bounds
        limits_for(account.tier)
            .check_amount(amount)
            .map_err(|violation| WalletError::validation(violation.to_string()))?;

        // Full amount is reserved; the fee is informational until settlement
        let fee = withdrawal_fee(method.kind, amount);
        let now = chrono::Utc::now();
        let withdrawal = Withdrawal {
            request_id: Uuid::new_v4(),
            account_id,
            method_id,
            amount,
            fee,
            status: WithdrawalStatus::Pending,
            account_details,
            created_at: now,
            updated_at: now,
        };
        let withdrawal = self.store.reserve_and_insert(withdrawal).await?;

        tracing::info!(
            account_id,
            request_id = %withdrawal.request_id,
            amount = %withdrawal.amount,
            fee = %withdrawal.fee,
            method = %method.kind,
            "withdrawal requested"
        );
        self.dispatch(
            NotifyTarget::Operators,
            Notification {
                event: "withdrawal.requested",
                title: "New withdrawal request".to_string(),
                message: format!(
                    "Account {} requested a withdrawal of {} via {}",
                    account_id, withdrawal.amount, method.kind
                ),
                data: json!({
                    "request_id": withdrawal.request_id,
                    "account_id": account_id,
                    "amount": withdrawal.amount,
                    "method": method.kind,
                }),
            },
        )
        .await;

        Ok(withdrawal)
    }

    /// Holder-driven cancel; only valid while the request is pending.
    pub async fn cancel(
        &self,
        account_id: AccountId,
        request_id: Uuid,
    ) -> Result<Withdrawal, WalletError> {
        let withdrawal = self
            .store
            .transition(Some(account_id), request_id, WithdrawalStatus::Cancelled)
            .await?;

        tracing::info!(account_id, request_id = %request_id, "withdrawal cancelled");
        self.dispatch(
            NotifyTarget::Account(account_id),
            Notification {
                event: "withdrawal.cancelled",
                title: "Withdrawal cancelled".to_string(),
                message: format!(
                    "Your withdrawal of {} was cancelled and the funds returned to your balance",
                    withdrawal.amount
                ),
                data: json!({
                    "request_id": withdrawal.request_id,
                    "amount": withdrawal.amount,
                }),
            },
        )
        .await;

        Ok(withdrawal)
    }

    /// Operator approval: the reserved funds leave the ledger for the
    /// external payment rail. Status assignment only from pending.
    pub async fn approve(&self, request_id: Uuid) -> Result<Withdrawal, WalletError> {
        let withdrawal = self
            .store
            .transition(None, request_id, WithdrawalStatus::Approved)
            .await?;

        // The rail receives the requested amount net of the fee
        let net = withdrawal.amount - withdrawal.fee;
        tracing::info!(
            account_id = withdrawal.account_id,
            request_id = %request_id,
            net = %net,
            "withdrawal approved"
        );
        self.dispatch(
            NotifyTarget::Account(withdrawal.account_id),
            Notification {
                event: "withdrawal.approved",
                title: "Withdrawal approved".to_string(),
                message: format!(
                    "Your withdrawal of {} was approved; {} will arrive after fees",
                    withdrawal.amount, net
                ),
                data: json!({
                    "request_id": withdrawal.request_id,
                    "amount": withdrawal.amount,
                    "fee": withdrawal.fee,
                    "net": net,
                }),
            },
        )
        .await;

        Ok(withdrawal)
    }

    /// Operator rejection: releases the reservation like a cancel.
    pub async fn reject(&self, request_id: Uuid) -> Result<Withdrawal, WalletError> {
        let withdrawal = self
            .store
            .transition(None, request_id, WithdrawalStatus::Rejected)
            .await?;

        tracing::info!(
            account_id = withdrawal.account_id,
            request_id = %request_id,
            "withdrawal rejected"
        );
        self.dispatch(
            NotifyTarget::Account(withdrawal.account_id),
            Notification {
                event: "withdrawal.rejected",
                title: "Withdrawal rejected".to_string(),
                message: format!(
                    "Your withdrawal of {} was rejected and the funds returned to your balance",
                    withdrawal.amount
                ),
                data: json!({
                    "request_id": withdrawal.request_id,
                    "amount": withdrawal.amount,
                }),
            },
        )
        .await;

        Ok(withdrawal)
    }

    /// Single request scoped to its owner.
    pub async fn get(
        &self,
        account_id: AccountId,
        request_id: Uuid,
    ) -> Result<Withdrawal, WalletError> {
        self.store
            .withdrawal(account_id, request_id)
            .await?
            .ok_or(WalletError::NotFound("withdrawal"))
    }

    /// Paginated history, newest first.
    pub async fn history(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Withdrawal>, WalletError> {
        self.store
            .account(account_id)
            .await?
            .ok_or(WalletError::NotFound("account"))?;
        self.store.history(account_id, page).await
    }

    /// Fire-and-forget dispatch: failures are logged, never surfaced.
    async fn dispatch(&self, target: NotifyTarget, note: Notification) {
        if let Err(e) = self.notifier.notify(target, note).await {
            tracing::warn!(error = %e, "notification dispatch failed");
        }
    }
}
