use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use musica_catalog_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_PORT, DEFAULT_SESSION_PRUNE_INTERVAL_HOURS,
};
use musica_catalog_server::user::DEFAULT_SESSION_IDLE_DAYS;
use musica_catalog_server::{
    run_server, AccountManager, CatalogService, DeletePolicy, RequestsLoggingLevel,
    SqliteCatalogStore, SqliteUserStore,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Existing directory holding `catalog.db` and `user.db`.
    #[clap(value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// What deleting a referenced artist or album does to its dependents:
    /// allow-dangling, reject or cascade.
    #[clap(long, value_enum, default_value_t = DeletePolicy::AllowDangling)]
    pub delete_policy: DeletePolicy,

    /// Sessions unused for longer than this many days are expired.
    #[clap(long, default_value_t = DEFAULT_SESSION_IDLE_DAYS)]
    pub session_idle_days: u64,

    /// Interval in hours between expired session pruning runs.
    #[clap(long, default_value_t = DEFAULT_SESSION_PRUNE_INTERVAL_HOURS)]
    pub session_prune_interval_hours: u64,

    /// Mark the session cookie `Secure` (serve behind TLS).
    #[clap(long)]
    pub secure_cookies: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            delete_policy: self.delete_policy,
            session_idle_days: self.session_idle_days,
            session_prune_interval_hours: self.session_prune_interval_hours,
            secure_cookies: self.secure_cookies,
        }
    }
}

fn spawn_session_pruning(account_manager: Arc<AccountManager>, interval_hours: u64) {
    info!(
        "Expired sessions are pruned every {} hours",
        interval_hours
    );
    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_hours * 60 * 60);
        let mut ticker = tokio::time::interval(interval);

        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match account_manager.prune_idle_sessions() {
                Ok(count) => {
                    if count > 0 {
                        info!("Pruned {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to prune sessions: {}", e);
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    info!(
        "Delete policy: {}, session idle days: {}",
        app_config.delete_policy, app_config.session_idle_days
    );

    info!(
        "Opening SQLite catalog database at {:?}...",
        app_config.catalog_db_path()
    );
    let catalog_store = Arc::new(SqliteCatalogStore::new(
        app_config.catalog_db_path(),
        app_config.delete_policy,
    )?);
    let catalog = Arc::new(CatalogService::new(catalog_store));

    info!(
        "Opening SQLite user database at {:?}...",
        app_config.user_db_path()
    );
    let user_store = Arc::new(SqliteUserStore::new(app_config.user_db_path())?);
    let account_manager = Arc::new(AccountManager::new(
        user_store,
        app_config.session_idle_days,
    ));

    spawn_session_pruning(
        account_manager.clone(),
        app_config.session_prune_interval_hours,
    );

    run_server(app_config.server_config(), catalog, account_manager).await
}
