//! PostgreSQL store adapter.
//!
//! Non-macro sqlx queries throughout. Every paired mutation (reserve +
//! insert, transition + release, guarded deactivation) runs inside one
//! transaction with `SELECT ... FOR UPDATE` row locks and a version
//! bump, so two concurrent creates cannot both pass the sufficiency
//! check against a stale read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::ledger::AccountLedger;

use super::error::WalletError;
use super::store::WalletStore;
use super::types::{
    Account, AccountId, MethodDetails, Page, PaymentMethod, Tier, Withdrawal, WithdrawalStatus,
};

/// PostgreSQL connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts_tb (
        account_id BIGSERIAL PRIMARY KEY,
        tier SMALLINT NOT NULL DEFAULT 1,
        available NUMERIC NOT NULL DEFAULT 0,
        pending_withdrawals NUMERIC NOT NULL DEFAULT 0,
        version BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payment_methods_tb (
        method_id UUID PRIMARY KEY,
        account_id BIGINT NOT NULL REFERENCES accounts_tb(account_id),
        kind SMALLINT NOT NULL,
        details JSONB NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS withdrawals_tb (
        request_id UUID PRIMARY KEY,
        account_id BIGINT NOT NULL REFERENCES accounts_tb(account_id),
        method_id UUID NOT NULL REFERENCES payment_methods_tb(method_id),
        amount NUMERIC NOT NULL,
        fee NUMERIC NOT NULL,
        status SMALLINT NOT NULL DEFAULT 1,
        account_details JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_withdrawals_account_created
        ON withdrawals_tb (account_id, created_at DESC)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_withdrawals_method_status
        ON withdrawals_tb (method_id, status)
    "#,
];

pub struct PgStore {
    db: Arc<Database>,
}

impl PgStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), WalletError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(self.db.pool()).await?;
        }
        Ok(())
    }
}

fn row_to_account(row: &PgRow) -> Account {
    Account {
        account_id: row.get("account_id"),
        tier: Tier::from(row.get::<i16, _>("tier")),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

fn row_to_ledger(row: &PgRow) -> Result<AccountLedger, WalletError> {
    AccountLedger::from_parts(
        row.get::<Decimal, _>("available"),
        row.get::<Decimal, _>("pending_withdrawals"),
        row.get::<i64, _>("version") as u64,
    )
    .map_err(WalletError::internal)
}

fn row_to_method(row: &PgRow) -> Result<PaymentMethod, WalletError> {
    let details: MethodDetails = serde_json::from_value(row.get::<serde_json::Value, _>("details"))
        .map_err(|e| WalletError::internal(format!("stored method details corrupted: {}", e)))?;
    Ok(PaymentMethod {
        method_id: row.get("method_id"),
        account_id: row.get("account_id"),
        kind: details.kind(),
        details,
        active: row.get("active"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn row_to_withdrawal(row: &PgRow) -> Withdrawal {
    Withdrawal {
        request_id: row.get("request_id"),
        account_id: row.get("account_id"),
        method_id: row.get("method_id"),
        amount: row.get("amount"),
        fee: row.get("fee"),
        status: WithdrawalStatus::from(row.get::<i16, _>("status")),
        account_details: row.get("account_details"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn create_account(&self, tier: Tier) -> Result<Account, WalletError> {
        let row = sqlx::query(
            "INSERT INTO accounts_tb (tier) VALUES ($1)
             RETURNING account_id, tier, created_at",
        )
        .bind(i16::from(tier))
        .fetch_one(self.db.pool())
        .await?;

        Ok(row_to_account(&row))
    }

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>, WalletError> {
        let row = sqlx::query(
            "SELECT account_id, tier, created_at FROM accounts_tb WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(row_to_account))
    }

    async fn balance(&self, account_id: AccountId) -> Result<AccountLedger, WalletError> {
        let row = sqlx::query(
            "SELECT available, pending_withdrawals, version
             FROM accounts_tb WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(WalletError::NotFound("account"))?;

        row_to_ledger(&row)
    }

    async fn credit(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<AccountLedger, WalletError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::validation("Credit must be positive"));
        }

        let row = sqlx::query(
            "UPDATE accounts_tb
             SET available = available + $1, version = version + 1
             WHERE account_id = $2
             RETURNING available, pending_withdrawals, version",
        )
        .bind(amount)
        .bind(account_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(WalletError::NotFound("account"))?;

        row_to_ledger(&row)
    }

    async fn insert_method(&self, method: PaymentMethod) -> Result<(), WalletError> {
        let details = serde_json::to_value(&method.details)
            .map_err(|e| WalletError::internal(format!("serialize method details: {}", e)))?;

        sqlx::query(
            "INSERT INTO payment_methods_tb
                 (method_id, account_id, kind, details, active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(method.method_id)
        .bind(method.account_id)
        .bind(i16::from(method.kind))
        .bind(details)
        .bind(method.active)
        .bind(method.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn method(
        &self,
        account_id: AccountId,
        method_id: Uuid,
    ) -> Result<Option<PaymentMethod>, WalletError> {
        let row = sqlx::query(
            "SELECT method_id, account_id, kind, details, active, created_at
             FROM payment_methods_tb
             WHERE method_id = $1 AND account_id = $2 AND active",
        )
        .bind(method_id)
        .bind(account_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(row_to_method).transpose()
    }

    async fn list_methods(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<PaymentMethod>, WalletError> {
        let rows = sqlx::query(
            "SELECT method_id, account_id, kind, details, active, created_at
             FROM payment_methods_tb
             WHERE account_id = $1 AND active
             ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_method).collect()
    }

    async fn deactivate_method(
        &self,
        account_id: AccountId,
        method_id: Uuid,
    ) -> Result<(), WalletError> {
        let mut tx = self.db.pool().begin().await?;

        let owned = sqlx::query(
            "SELECT method_id FROM payment_methods_tb
             WHERE method_id = $1 AND account_id = $2 AND active
             FOR UPDATE",
        )
        .bind(method_id)
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            return Err(WalletError::NotFound("payment method"));
        }

        let pending_refs: bool = sqlx::query(
            "SELECT EXISTS(
                 SELECT 1 FROM withdrawals_tb
                 WHERE method_id = $1 AND status = $2
             ) AS pending",
        )
        .bind(method_id)
        .bind(i16::from(WithdrawalStatus::Pending))
        .fetch_one(&mut *tx)
        .await?
        .get("pending");

        if pending_refs {
            return Err(WalletError::conflict(
                "payment method is referenced by a pending withdrawal",
            ));
        }

        sqlx::query("UPDATE payment_methods_tb SET active = FALSE WHERE method_id = $1")
            .bind(method_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn reserve_and_insert(&self, withdrawal: Withdrawal) -> Result<Withdrawal, WalletError> {
        let mut tx = self.db.pool().begin().await?;

        // Lock the account row so the sufficiency check cannot go stale
        let row = sqlx::query(
            "SELECT available, pending_withdrawals, version
             FROM accounts_tb WHERE account_id = $1
             FOR UPDATE",
        )
        .bind(withdrawal.account_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(WalletError::NotFound("account"))?;

        let available: Decimal = row.get("available");
        if available < withdrawal.amount {
            return Err(WalletError::InsufficientBalance);
        }

        sqlx::query(
            "UPDATE accounts_tb
             SET available = available - $1,
                 pending_withdrawals = pending_withdrawals + $1,
                 version = version + 1
             WHERE account_id = $2",
        )
        .bind(withdrawal.amount)
        .bind(withdrawal.account_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO withdrawals_tb
                 (request_id, account_id, method_id, amount, fee, status,
                  account_details, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(withdrawal.request_id)
        .bind(withdrawal.account_id)
        .bind(withdrawal.method_id)
        .bind(withdrawal.amount)
        .bind(withdrawal.fee)
        .bind(i16::from(withdrawal.status))
        .bind(&withdrawal.account_details)
        .bind(withdrawal.created_at)
        .bind(withdrawal.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
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

        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(
            "SELECT account_id, amount, status FROM withdrawals_tb
             WHERE request_id = $1 AND ($2::BIGINT IS NULL OR account_id = $2)
             FOR UPDATE",
        )
        .bind(request_id)
        .bind(scope)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(WalletError::NotFound("withdrawal"))?;

        let account_id: AccountId = row.get("account_id");
        let amount: Decimal = row.get("amount");
        let status = WithdrawalStatus::from(row.get::<i16, _>("status"));

        if status.is_terminal() {
            return Err(WalletError::conflict(format!(
                "withdrawal already {}",
                status
            )));
        }

        let ledger_update = match to {
            // Reserved funds leave for the settlement rail
            WithdrawalStatus::Approved => {
                "UPDATE accounts_tb
                 SET pending_withdrawals = pending_withdrawals - $1,
                     version = version + 1
                 WHERE account_id = $2"
            }
            // Release the reservation back to available
            WithdrawalStatus::Rejected | WithdrawalStatus::Cancelled => {
                "UPDATE accounts_tb
                 SET available = available + $1,
                     pending_withdrawals = pending_withdrawals - $1,
                     version = version + 1
                 WHERE account_id = $2"
            }
            WithdrawalStatus::Pending => unreachable!("guarded above"),
        };

        sqlx::query(ledger_update)
            .bind(amount)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(
            "UPDATE withdrawals_tb
             SET status = $1, updated_at = NOW()
             WHERE request_id = $2
             RETURNING request_id, account_id, method_id, amount, fee, status,
                       account_details, created_at, updated_at",
        )
        .bind(i16::from(to))
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row_to_withdrawal(&row))
    }

    async fn withdrawal(
        &self,
        account_id: AccountId,
        request_id: Uuid,
    ) -> Result<Option<Withdrawal>, WalletError> {
        let row = sqlx::query(
            "SELECT request_id, account_id, method_id, amount, fee, status,
                    account_details, created_at, updated_at
             FROM withdrawals_tb
             WHERE request_id = $1 AND account_id = $2",
        )
        .bind(request_id)
        .bind(account_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(row_to_withdrawal))
    }

    async fn history(
        &self,
        account_id: AccountId,
        page: Page,
    ) -> Result<Vec<Withdrawal>, WalletError> {
        let rows = sqlx::query(
            "SELECT request_id, account_id, method_id, amount, fee, status,
                    account_details, created_at, updated_at
             FROM withdrawals_tb
             WHERE account_id = $1
             ORDER BY created_at DESC, request_id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(account_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(row_to_withdrawal).collect())
    }
}
