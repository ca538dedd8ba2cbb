use thiserror::Error;

/// Error taxonomy of the payout core.
///
/// Every variant is recoverable by the caller; the gateway maps them to
/// the numeric error-code table. Nothing here aborts the process.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WalletError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        WalletError::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        WalletError::Internal(msg.into())
    }
}
