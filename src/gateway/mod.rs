pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Json,
    Router,
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use state::AppState;

/// Build the full API router.
pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
        .route("/api/v1/wallet/balance", get(handlers::get_balance))
        .route("/api/v1/wallet/limits", get(handlers::get_limits))
        .route(
            "/api/v1/wallet/methods",
            post(handlers::add_method).get(handlers::list_methods),
        )
        .route(
            "/api/v1/wallet/methods/{method_id}",
            delete(handlers::remove_method),
        )
        .route(
            "/api/v1/wallet/withdrawals",
            post(handlers::create_withdrawal).get(handlers::get_history),
        )
        .route(
            "/api/v1/wallet/withdrawals/{request_id}",
            get(handlers::get_withdrawal),
        )
        .route(
            "/api/v1/wallet/withdrawals/{request_id}/cancel",
            post(handlers::cancel_withdrawal),
        )
        .route(
            "/api/v1/admin/withdrawals/{request_id}/approve",
            post(handlers::approve_withdrawal),
        )
        .route(
            "/api/v1/admin/withdrawals/{request_id}/reject",
            post(handlers::reject_withdrawal),
        );

    #[cfg(feature = "mock-api")]
    let router = router
        .route("/internal/mock/account", post(handlers::mock_create_account))
        .route("/internal/mock/credit", post(handlers::mock_credit));

    router.layer(CorsLayer::permissive()).with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!(%addr, "payout gateway listening");

    axum::serve(TcpListener::bind(&addr).await?, app.into_make_service()).await?;
    Ok(())
}
