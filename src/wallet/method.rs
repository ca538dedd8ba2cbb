//! Payment-method registry.
//!
//! Validates destination details before anything is persisted, lists
//! methods back redacted, and refuses removal while a pending withdrawal
//! still references the method.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::error::WalletError;
use super::store::WalletStore;
use super::types::{AccountId, MethodDetails, MethodSummary, PaymentMethod};

pub struct MethodService {
    store: Arc<dyn WalletStore>,
}

impl MethodService {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a payment method; returns the redacted view.
    pub async fn add(
        &self,
        account_id: AccountId,
        details: MethodDetails,
    ) -> Result<MethodSummary, WalletError> {
        details.validate()?;

        self.store
            .account(account_id)
            .await?
            .ok_or(WalletError::NotFound("account"))?;

        let method = PaymentMethod {
            method_id: Uuid::new_v4(),
            account_id,
            kind: details.kind(),
            details,
            active: true,
            created_at: Utc::now(),
        };
        self.store.insert_method(method.clone()).await?;

        tracing::info!(
            account_id,
            method_id = %method.method_id,
            kind = %method.kind,
            "payment method added"
        );
        Ok(method.redacted())
    }

    /// Active methods of an account, raw details excluded.
    pub async fn list(&self, account_id: AccountId) -> Result<Vec<MethodSummary>, WalletError> {
        self.store
            .account(account_id)
            .await?
            .ok_or(WalletError::NotFound("account"))?;

        let methods = self.store.list_methods(account_id).await?;
        Ok(methods.iter().map(PaymentMethod::redacted).collect())
    }

    /// Deactivate a method. Conflict while referenced by a pending
    /// withdrawal; the store makes the check-and-deactivate atomic.
    pub async fn remove(&self, account_id: AccountId, method_id: Uuid) -> Result<(), WalletError> {
        self.store.deactivate_method(account_id, method_id).await?;
        tracing::info!(account_id, method_id = %method_id, "payment method removed");
        Ok(())
    }
}
