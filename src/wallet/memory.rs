//! In-memory store adapter.
//!
//! Backs tests and the no-Postgres local mode. A single mutex serializes
//! every operation, so the atomic store contracts (reserve+insert,
//! transition+release, guarded removal) hold trivially: each is one lock
//! acquisition. Balance mutation still goes through the enforced
//! [`AccountLedger`] methods, the same code path the SQL adapter guards
//! with row locks.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::ledger::AccountLedger;

use super::error::WalletError;
use super::store::WalletStore;
use super::types::{Account, AccountId, Page, PaymentMethod, Tier, Withdrawal, WithdrawalStatus};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, AccountRow>,
    methods: HashMap<Uuid, PaymentMethod>,
    withdrawals: HashMap<Uuid, Withdrawal>,
    next_account_id: AccountId,
}

struct AccountRow {
    account: Account,
    ledger: AccountLedger,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn ledger_err(e: &'static str) -> WalletError {
    match e {
        "Insufficient funds" => WalletError::InsufficientBalance,
        "Credit must be positive"
        | "Reservation must be positive"
        | "Release must be positive"
        | "Settlement must be positive" => WalletError::validation(e),
        other => WalletError::internal(other),
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn create_account(&self, tier: Tier) -> Result<Account, WalletError> {
        let mut inner = self.lock();
        inner.next_account_id += 1;
        let account = Account {
            account_id: inner.next_account_id,
            tier,
            created_at: Utc::now(),
        };
        inner.accounts.insert(
            account.account_id,
            AccountRow {
                account: account.clone(),
                ledger: AccountLedger::default(),
            },
        );
        Ok(account)
    }

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, WalletError> {
        let inner = self.lock();
        Ok(inner.accounts.get(&account_id).map(|row| row.account.clone()))
    }

    async fn balance(&self, account_id: AccountId) -> Result<AccountLedger, WalletError> {
        let inner = self.lock();
        inner
            .accounts
            .get(&account_id)
            .map(|row| row.ledger)
            .ok_or(WalletError::NotFound("account"))
    }

    async fn credit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<AccountLedger, WalletError> {
        let mut inner = self.lock();
        let row = inner
            .accounts
            .get_mut(&account_id)
            .ok_or(WalletError::NotFound("account"))?;
        row.ledger.credit(amount).map_err(ledger_err)?;
        Ok(row.ledger)
    }

    async fn insert_method(&self, method: PaymentMethod) -> Result<(), WalletError> {
        let mut inner = self.lock();
        if !inner.accounts.contains_key(&method.account_id) {
            return Err(WalletError::NotFound("account"));
        }
        inner.methods.insert(method.method_id, method);
        Ok(())
    }

    async fn method(
        &self,
        account_id: AccountId,
        method_id: Uuid,
    ) -> Result<Option<PaymentMethod>, WalletError> {
        let inner = self.lock();
        Ok(inner
            .methods
            .get(&method_id)
            .filter(|m| m.account_id == account_id && m.active)
            .cloned())
    }

    async fn list_methods(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<PaymentMethod>, WalletError> {
        let inner = self.lock();
        let mut methods: Vec<PaymentMethod> = inner
            .methods
            .values()
            .filter(|m| m.account_id == account_id && m.active)
            .cloned()
            .collect();
        methods.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(methods)
    }

    async fn deactivate_method(
        &self,
        account_id: AccountId,
        method_id: Uuid,
    ) -> Result<(), WalletError> {
        let mut inner = self.lock();

        let owned = inner
            .methods
            .get(&method_id)
            .is_some_and(|m| m.account_id == account_id && m.active);
        if !owned {
            return Err(WalletError::NotFound("payment method"));
        }

        let pending_refs = inner
            .withdrawals
            .values()
            .any(|w| w.method_id == method_id && w.status == WithdrawalStatus::Pending);
        if pending_refs {
            return Err(WalletError::conflict(
                "payment method is referenced by a pending withdrawal",
            ));
        }

        if let Some(method) = inner.methods.get_mut(&method_id) {
            method.active = false;
        }
        Ok(())
    }

    async fn reserve_and_insert(&self, withdrawal: Withdrawal) -> Result<Withdrawal, WalletError> {
        let mut inner = self.lock();
        let row = inner
            .accounts
            .get_mut(&withdrawal.account_id)
            .ok_or(WalletError::NotFound("account"))?;

        // Reservation and row insert under the same lock: both or neither.
        row.ledger.reserve(withdrawal.amount).map_err(ledger_err)?;
        inner
            .withdrawals
            .insert(withdrawal.request_id, withdrawal.clone());
        Ok(withdrawal)
    }

    async fn transition(
        &self,
        scope: Option<AccountId>,
        request_id: Uuid,
        to: WithdrawalStatus,
    ) -> Result<Withdrawal, WalletError> {
        if !to.is_terminal() {
            return Err(WalletError::internal("transition target must be terminal"));
        }

        let mut inner = self.lock();

        let (account_id, amount, status) = match inner.withdrawals.get(&request_id) {
            Some(w) if scope.is_none() || scope == Some(w.account_id) => {
                (w.account_id, w.amount, w.status)
            }
            _ => return Err(WalletError::NotFound("withdrawal")),
        };

        if status.is_terminal() {
            return Err(WalletError::conflict(format!(
                "withdrawal already {}",
                status
            )));
        }

        let account = inner
            .accounts
            .get_mut(&account_id)
            .ok_or(WalletError::internal("withdrawal without account"))?;
        match to {
            WithdrawalStatus::Approved => account.ledger.settle(amount).map_err(ledger_err)?,
            WithdrawalStatus::Rejected | WithdrawalStatus::Cancelled => {
                account.ledger.release(amount).map_err(ledger_err)?
            }
            WithdrawalStatus::Pending => unreachable!("guarded above"),
        }

        let withdrawal = inner
            .withdrawals
            .get_mut(&request_id)
            .ok_or(WalletError::internal("withdrawal row vanished"))?;
        withdrawal.status = to;
        withdrawal.updated_at = Utc::now();
        Ok(withdrawal.clone())
    }

    async fn withdrawal(
        &self,
        account_id: AccountId,
        request_id: Uuid,
    ) -> Result<Option<Withdrawal>, WalletError> {
        let inner = self.lock();
        Ok(inner
            .withdrawals
            .get(&request_id)
            .filter(|w| w.account_id == account_id)
            .cloned())
    }

    async fn history(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Withdrawal>, WalletError> {
        let inner = self.lock();
        let mut rows: Vec<Withdrawal> = inner
            .withdrawals
            .values()
            .filter(|w| w.account_id == account_id)
            .cloned()
            .collect();
        // Newest first; request_id tie-break keeps pagination stable
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.request_id.cmp(&a.request_id))
        });
        Ok(rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }
}
