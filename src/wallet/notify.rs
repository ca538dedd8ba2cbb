//! Notification dispatcher port.
//!
//! The workflow treats dispatch as fire-and-forget: failures are logged
//! and never bubble into the caller's result.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use thiserror::Error;

use super::types::AccountId;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Dispatch failed: {0}")]
    Dispatch(String),
}

/// Who receives a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTarget {
    /// The account holder (email + in-app, downstream's concern)
    Account(AccountId),
    /// The operator/back-office role
    Operators,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub event: &'static str,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, target: NotifyTarget, note: Notification) -> Result<(), NotifyError>;
}

/// Production wiring: structured log line per notification. The actual
/// email/in-app delivery pipeline consumes these downstream.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, target: NotifyTarget, note: Notification) -> Result<(), NotifyError> {
        match target {
            NotifyTarget::Account(account_id) => {
                tracing::info!(
                    account_id,
                    event = note.event,
                    title = %note.title,
                    data = %note.data,
                    "user notification"
                );
            }
            NotifyTarget::Operators => {
                tracing::info!(
                    event = note.event,
                    title = %note.title,
                    data = %note.data,
                    "operator notification"
                );
            }
        }
        Ok(())
    }
}

/// Test double: records every dispatched notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(NotifyTarget, Notification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(NotifyTarget, Notification)> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, target: NotifyTarget, note: Notification) -> Result<(), NotifyError> {
        let mut guard = match self.sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((target, note));
        Ok(())
    }
}
