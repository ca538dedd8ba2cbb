use std::sync::Arc;

use crate::wallet::method::MethodService;
use crate::wallet::store::WalletStore;
use crate::wallet::withdraw::WithdrawService;

/// Shared handler state.
///
/// Services are constructed once at startup and injected here; handlers
/// never reach for globals.
pub struct AppState {
    pub store: Arc<dyn WalletStore>,
    pub withdrawals: WithdrawService,
    pub methods: MethodService,
}
