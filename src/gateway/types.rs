use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::wallet::error::WalletError;
use crate::wallet::types::{AccountId, MethodDetails, Tier};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;

    // Auth errors (2xxx)
    pub const AUTH_FAILED: i32 = 2002;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4091;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

/// Map a domain error to HTTP status + response code.
pub fn error_mapping(e: &WalletError) -> (axum::http::StatusCode, i32) {
    use axum::http::StatusCode;
    match e {
        WalletError::Validation(_) => (StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER),
        WalletError::InsufficientBalance => {
            (StatusCode::BAD_REQUEST, error_codes::INSUFFICIENT_BALANCE)
        }
        WalletError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
        WalletError::Conflict(_) => (StatusCode::CONFLICT, error_codes::CONFLICT),
        WalletError::Database(_) | WalletError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
        ),
    }
}

// --- Requests ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub tier: Tier,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreditRequest {
    pub account_id: AccountId,
    /// Decimal amount as string, e.g. "500.00"
    pub amount: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMethodRequest {
    pub account_id: AccountId,
    pub details: MethodDetails,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWithdrawalRequest {
    pub account_id: AccountId,
    /// Decimal amount as string, e.g. "200.00"
    pub amount: String,
    pub method_id: Uuid,
    /// Destination snapshot stored on the request
    #[serde(default)]
    pub account_details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelWithdrawalRequest {
    pub account_id: AccountId,
}

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub account_id: AccountId,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub account_id: AccountId,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// --- Responses ---

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub account_id: AccountId,
    pub tier: Tier,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Available funds, rounded to the currency's minor unit for display
    pub available: Decimal,
    /// Funds reserved against in-flight withdrawals
    pub pending_withdrawals: Decimal,
}

impl BalanceResponse {
    pub fn from_ledger(ledger: &crate::ledger::AccountLedger) -> Self {
        // Display rounding only; the stored ledger keeps full precision
        Self {
            available: ledger.available().round_dp(2),
            pending_withdrawals: ledger.pending_withdrawals().round_dp(2),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}
