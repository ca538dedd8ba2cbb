//! OpenAPI documentation
//!
//! The generated document is served at `/api/v1/openapi.json`; point any
//! Swagger UI at it.

use utoipa::OpenApi;

use crate::wallet::limits::TierLimits;
use crate::wallet::types::{MethodDetails, MethodKind, MethodSummary, Tier, Withdrawal, WithdrawalStatus};

use super::types::{
    AccountResponse, AddMethodRequest, BalanceResponse, CancelWithdrawalRequest,
    CreateAccountRequest, CreateWithdrawalRequest, CreditRequest, HealthResponse,
};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payout Core API",
        description = "Wallet payout core: balances, payment methods, withdrawal workflow",
        version = "0.1.0"
    ),
    components(schemas(
        Tier,
        MethodKind,
        MethodDetails,
        MethodSummary,
        WithdrawalStatus,
        Withdrawal,
        TierLimits,
        CreateAccountRequest,
        CreditRequest,
        AddMethodRequest,
        CreateWithdrawalRequest,
        CancelWithdrawalRequest,
        AccountResponse,
        BalanceResponse,
        HealthResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("Payout Core API"));
        assert!(json.contains("MethodDetails"));
    }
}
