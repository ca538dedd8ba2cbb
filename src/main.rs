//! Payout core - service entry point
//!
//! Wires config, logging, the store adapter and the domain services
//! together, then serves the gateway:
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│   Store   │───▶│ Services │───▶│ Gateway  │
//! │  (YAML)  │    │ (PG/mem)  │    │ (wallet) │    │  (axum)  │
//! └──────────┘    └───────────┘    └──────────┘    └──────────┘
//! ```

use std::sync::Arc;

use payout_core::config::AppConfig;
use payout_core::gateway::{self, state::AppState};
use payout_core::wallet::memory::MemoryStore;
use payout_core::wallet::method::MethodService;
use payout_core::wallet::notify::TracingNotifier;
use payout_core::wallet::pg::{Database, PgStore};
use payout_core::wallet::store::WalletStore;
use payout_core::wallet::withdraw::WithdrawService;
use payout_core::{logging, wallet::notify::Notifier};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = logging::init_logging(&config);

    tracing::info!(env = %env, git = env!("GIT_HASH"), "starting payout core");

    let store: Arc<dyn WalletStore> = match &config.postgres_url {
        Some(url) => {
            let db = Arc::new(Database::connect(url).await?);
            let pg = PgStore::new(db);
            pg.migrate().await?;
            Arc::new(pg)
        }
        None => {
            tracing::warn!("postgres_url not configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let state = Arc::new(AppState {
        store: store.clone(),
        withdrawals: WithdrawService::new(store.clone(), notifier),
        methods: MethodService::new(store),
    });

    let port = get_port_override().unwrap_or(config.gateway.port);
    gateway::serve(state, &config.gateway.host, port).await
}
