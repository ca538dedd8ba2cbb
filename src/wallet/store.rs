//! Store port for the payout core.
//!
//! The reservation/release pair is the one correctness-critical shared
//! mutation in the system, so the atomic operations live on this trait:
//! each adapter decides how to make them indivisible (one mutex
//! acquisition in memory, one transaction with row locks in Postgres).
//! The workflow service never mutates balances directly.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ledger::AccountLedger;

use super::error::WalletError;
use super::types::{Account, AccountId, Page, PaymentMethod, Tier, Withdrawal, WithdrawalStatus};

#[async_trait]
pub trait WalletStore: Send + Sync {
    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Create an account with a zero ledger.
    async fn create_account(&self, tier: Tier) -> Result<Account, WalletError>;

    /// Fetch an account record, `None` when unknown.
    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, WalletError>;

    /// Read the ledger pair. Fails with `NotFound` for unknown accounts.
    async fn balance(&self, account_id: AccountId) -> Result<AccountLedger, WalletError>;

    /// Credit the available balance (top-up path).
    async fn credit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<AccountLedger, WalletError>;

    // ------------------------------------------------------------------
    // Payment methods
    // ------------------------------------------------------------------

    /// Persist an already-validated payment method.
    async fn insert_method(&self, method: PaymentMethod) -> Result<(), WalletError>;

    /// Fetch an active method scoped to its owner, `None` when absent.
    async fn method(
        &self,
        account_id: AccountId,
        method_id: Uuid,
    ) -> Result<Option<PaymentMethod>, WalletError>;

    /// All active methods of an account.
    async fn list_methods(&self, account_id: AccountId)
    -> Result<Vec<PaymentMethod>, WalletError>;

    /// Deactivate a method. Atomic with the pending-reference check:
    /// fails with `Conflict` while any referencing withdrawal is pending.
    async fn deactivate_method(
        &self,
        account_id: AccountId,
        method_id: Uuid,
    ) -> Result<(), WalletError>;

    // ------------------------------------------------------------------
    // Withdrawals
    // ------------------------------------------------------------------

    /// Atomically re-check sufficiency, reserve the amount and insert the
    /// pending request row. Both writes apply or neither does; a stale
    /// sufficiency read surfaces as `InsufficientBalance`, never as a
    /// negative balance.
    async fn reserve_and_insert(&self, withdrawal: Withdrawal) -> Result<Withdrawal, WalletError>;

    /// Atomically transition a pending request to a terminal status and
    /// apply the matching ledger movement (release for cancel/reject,
    /// settle for approve).
    ///
    /// `scope` restricts the lookup to an owning account (holder-driven
    /// cancel); `None` is the operator path. Fails with `NotFound` when
    /// absent or out of scope, `Conflict` when already terminal.
    async fn transition(
        &self,
        scope: Option<AccountId>,
        request_id: Uuid,
        to: WithdrawalStatus,
    ) -> Result<Withdrawal, WalletError>;

    /// Fetch a request scoped to its owner, `None` when absent.
    async fn withdrawal(
        &self,
        account_id: AccountId,
        request_id: Uuid,
    ) -> Result<Option<Withdrawal>, WalletError>;

    /// Paginated request history, newest first.
    async fn history(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Withdrawal>, WalletError>;
}
