use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::wallet::error::WalletError;
use crate::wallet::limits::TierLimits;
use crate::wallet::types::{MethodSummary, Page, Withdrawal};

use super::state::AppState;
use super::types::{
    AccountQuery, AccountResponse, AddMethodRequest, ApiResponse, BalanceResponse,
    CancelWithdrawalRequest, CreateAccountRequest, CreateWithdrawalRequest, CreditRequest,
    HealthResponse, HistoryQuery, error_codes, error_mapping,
};

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn reject(e: WalletError) -> ApiError {
    let (status, code) = error_mapping(&e);
    (status, Json(ApiResponse::<()>::error(code, e.to_string())))
}

fn bad_request(msg: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            error_codes::INVALID_PARAMETER,
            msg,
        )),
    )
}

fn parse_amount(raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw).map_err(|_| bad_request("Invalid amount"))
}

/// GET /health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// Internal Mock Account Seed (Debug)
///
/// [SECURITY WARNING] This endpoint is for development/testing ONLY.
/// It creates accounts without any verification flow.
///
/// POST /internal/mock/account
#[cfg(feature = "mock-api")]
pub async fn mock_create_account(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    check_internal_secret(&headers)?;

    let account = state
        .store
        .create_account(req.tier)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(AccountResponse {
        account_id: account.account_id,
        tier: account.tier,
    })))
}

/// Internal Mock Credit (Debug/Top-up Trigger)
///
/// [SECURITY WARNING] This endpoint is for development/testing ONLY.
/// It injects funds into account balances without a real payment.
///
/// POST /internal/mock/credit
#[cfg(feature = "mock-api")]
pub async fn mock_credit(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(req): Json<CreditRequest>,
) -> Result<Json<ApiResponse<BalanceResponse>>, ApiError> {
    check_internal_secret(&headers)?;

    let amount = parse_amount(&req.amount)?;
    let ledger = state
        .withdrawals
        .credit(req.account_id, amount)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(BalanceResponse::from_ledger(
        &ledger,
    ))))
}

#[cfg(feature = "mock-api")]
fn check_internal_secret(headers: &axum::http::HeaderMap) -> Result<(), ApiError> {
    let secret = headers
        .get("X-Internal-Secret")
        .and_then(|v| v.to_str().ok());
    if secret != Some("dev-secret") {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::error(
                error_codes::AUTH_FAILED,
                "Access Denied: Missing or Invalid X-Internal-Secret",
            )),
        ));
    }
    Ok(())
}

/// GET /api/v1/wallet/balance
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<ApiResponse<BalanceResponse>>, ApiError> {
    let ledger = state
        .withdrawals
        .balance(query.account_id)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(BalanceResponse::from_ledger(
        &ledger,
    ))))
}

/// GET /api/v1/wallet/limits
pub async fn get_limits(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<ApiResponse<TierLimits>>, ApiError> {
    let limits = state
        .withdrawals
        .limits(query.account_id)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(limits)))
}

/// POST /api/v1/wallet/methods
pub async fn add_method(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddMethodRequest>,
) -> Result<Json<ApiResponse<MethodSummary>>, ApiError> {
    let summary = state
        .methods
        .add(req.account_id, req.details)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(summary)))
}

/// GET /api/v1/wallet/methods
pub async fn list_methods(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<ApiResponse<Vec<MethodSummary>>>, ApiError> {
    let methods = state
        .methods
        .list(query.account_id)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(methods)))
}

/// DELETE /api/v1/wallet/methods/{method_id}
pub async fn remove_method(
    State(state): State<Arc<AppState>>,
    Path(method_id): Path<Uuid>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .methods
        .remove(query.account_id, method_id)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(())))
}

/// POST /api/v1/wallet/withdrawals
pub async fn create_withdrawal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWithdrawalRequest>,
) -> Result<Json<ApiResponse<Withdrawal>>, ApiError> {
    let amount = parse_amount(&req.amount)?;
    let details = req.account_details.unwrap_or(serde_json::Value::Null);

    let withdrawal = state
        .withdrawals
        .create(req.account_id, amount, req.method_id, details)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// POST /api/v1/wallet/withdrawals/{request_id}/cancel
pub async fn cancel_withdrawal(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<CancelWithdrawalRequest>,
) -> Result<Json<ApiResponse<Withdrawal>>, ApiError> {
    let withdrawal = state
        .withdrawals
        .cancel(req.account_id, request_id)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// POST /api/v1/admin/withdrawals/{request_id}/approve
pub async fn approve_withdrawal(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Withdrawal>>, ApiError> {
    let withdrawal = state
        .withdrawals
        .approve(request_id)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// POST /api/v1/admin/withdrawals/{request_id}/reject
pub async fn reject_withdrawal(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Withdrawal>>, ApiError> {
    let withdrawal = state
        .withdrawals
        .reject(request_id)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// GET /api/v1/wallet/withdrawals/{request_id}
pub async fn get_withdrawal(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<ApiResponse<Withdrawal>>, ApiError> {
    let withdrawal = state
        .withdrawals
        .get(query.account_id, request_id)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(withdrawal)))
}

/// GET /api/v1/wallet/withdrawals
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<Withdrawal>>>, ApiError> {
    let page = Page::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(Page::DEFAULT_LIMIT),
    );
    let history = state
        .withdrawals
        .history(query.account_id, page)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::success(history)))
}
