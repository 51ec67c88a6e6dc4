//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases. When dropped,
//! the server shuts down gracefully and the temporary directory is removed.

use super::constants::*;
use super::fixtures::{seed_accounts, seed_catalog};
use musica_catalog_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use musica_catalog_server::user::DEFAULT_SESSION_IDLE_DAYS;
use musica_catalog_server::{
    AccountManager, CatalogService, DeletePolicy, SqliteCatalogStore, SqliteUserStore,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Direct access to the catalog the server uses
    pub catalog: Arc<CatalogService>,

    /// Direct access to the accounts the server uses
    pub account_manager: Arc<AccountManager>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a seeded server with the default delete policy
    pub async fn spawn() -> Self {
        Self::spawn_with_policy(DeletePolicy::default()).await
    }

    /// Spawns a seeded server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the databases cannot be created, the port cannot be bound
    /// or the server doesn't become ready within the timeout.
    pub async fn spawn_with_policy(delete_policy: DeletePolicy) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");

        let catalog_store = Arc::new(
            SqliteCatalogStore::new(temp_db_dir.path().join("catalog.db"), delete_policy)
                .expect("Failed to open catalog store"),
        );
        let catalog = Arc::new(CatalogService::new(catalog_store));
        seed_catalog(&catalog).expect("Failed to seed catalog");

        let user_store = Arc::new(
            SqliteUserStore::new(temp_db_dir.path().join("user.db"))
                .expect("Failed to open user store"),
        );
        seed_accounts(&user_store).expect("Failed to seed accounts");
        let account_manager = Arc::new(AccountManager::new(
            user_store,
            DEFAULT_SESSION_IDLE_DAYS,
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            secure_cookies: false,
        };
        let app = make_app(config, catalog.clone(), account_manager.clone());

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            catalog,
            account_manager,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the login page
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/login", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
