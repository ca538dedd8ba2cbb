//! Payout core - wallet and withdrawal back end
//!
//! Per-account ledger balances with reservation semantics, a
//! payment-method registry, tier-derived withdrawal limits, and the
//! pending -> approved/rejected/cancelled withdrawal state machine,
//! served by an axum gateway over a pluggable store.
//!
//! # Modules
//!
//! - [`ledger`] - Enforced balance type (available / pending_withdrawals)
//! - [`wallet`] - Domain core: limits, fees, payment methods, withdrawal
//!   workflow, store port + adapters, notification port
//! - [`gateway`] - HTTP layer (axum handlers, response envelope, OpenAPI)
//! - [`config`] - YAML application config
//! - [`logging`] - tracing setup (rolling file + stdout)

pub mod config;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod wallet;

// Convenient re-exports at crate root
pub use ledger::AccountLedger;
pub use wallet::error::WalletError;
pub use wallet::limits::{TierLimits, limits_for};
pub use wallet::memory::MemoryStore;
pub use wallet::method::MethodService;
pub use wallet::notify::{Notification, Notifier, NotifyTarget, RecordingNotifier, TracingNotifier};
pub use wallet::pg::{Database, PgStore};
pub use wallet::store::WalletStore;
pub use wallet::types::{
    Account, AccountId, MethodDetails, MethodKind, MethodSummary, Page, PaymentMethod, Tier,
    Withdrawal, WithdrawalStatus,
};
pub use wallet::withdraw::WithdrawService;
