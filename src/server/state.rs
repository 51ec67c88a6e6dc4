use axum::extract::FromRef;

use crate::catalog::CatalogService;
use crate::user::AccountManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogService = Arc<CatalogService>;
pub type GuardedAccountManager = Arc<AccountManager>;

/// Everything a handler may need, constructed once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog: GuardedCatalogService,
    pub account_manager: GuardedAccountManager,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        catalog: GuardedCatalogService,
        account_manager: GuardedAccountManager,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog,
            account_manager,
        }
    }
}

impl FromRef<ServerState> for GuardedCatalogService {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for GuardedAccountManager {
    fn from_ref(input: &ServerState) -> Self {
        input.account_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
