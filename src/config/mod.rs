mod file_config;

pub use file_config::{FileConfig, SessionsConfig};

use crate::catalog_store::DeletePolicy;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use crate::user::{DEFAULT_SESSION_IDLE_DAYS, USER_DB_FILE_NAME};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const CATALOG_DB_FILE_NAME: &str = "catalog.db";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SESSION_PRUNE_INTERVAL_HOURS: u64 = 24;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub delete_policy: DeletePolicy,
    pub session_idle_days: u64,
    pub session_prune_interval_hours: u64,
    pub secure_cookies: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            port: DEFAULT_PORT,
            logging_level: RequestsLoggingLevel::default(),
            delete_policy: DeletePolicy::default(),
            session_idle_days: DEFAULT_SESSION_IDLE_DAYS,
            session_prune_interval_hours: DEFAULT_SESSION_PRUNE_INTERVAL_HOURS,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub delete_policy: DeletePolicy,
    pub session_idle_days: u64,
    pub session_prune_interval_hours: u64,
    pub secure_cookies: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via the command line or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = match file.logging_level {
            Some(s) => match parse_logging_level(&s) {
                Some(level) => level,
                None => bail!("Unknown logging_level {:?}", s),
            },
            None => cli.logging_level.clone(),
        };

        let delete_policy = match file.delete_policy {
            Some(s) => match DeletePolicy::parse(&s) {
                Some(policy) => policy,
                None => bail!(
                    "Unknown delete_policy {:?}, expected allow-dangling, reject or cascade",
                    s
                ),
            },
            None => cli.delete_policy,
        };

        let sessions = file.sessions.unwrap_or_default();
        let session_idle_days = sessions.idle_days.unwrap_or(cli.session_idle_days);
        let session_prune_interval_hours = sessions
            .prune_interval_hours
            .unwrap_or(cli.session_prune_interval_hours);
        let secure_cookies = sessions.secure_cookies.unwrap_or(cli.secure_cookies);

        if session_idle_days == 0 {
            bail!("Session idle days must be at least 1");
        }
        if session_prune_interval_hours == 0 {
            bail!("Session prune interval must be at least 1 hour");
        }

        Ok(Self {
            db_dir,
            port,
            logging_level,
            delete_policy,
            session_idle_days,
            session_prune_interval_hours,
            secure_cookies,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join(CATALOG_DB_FILE_NAME)
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join(USER_DB_FILE_NAME)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            secure_cookies: self.secure_cookies,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_temp_db_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("headers"),
            Some(RequestsLoggingLevel::Headers)
        ));
        // Case insensitive
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            port: 3001,
            logging_level: RequestsLoggingLevel::Headers,
            delete_policy: DeletePolicy::Reject,
            session_idle_days: 7,
            session_prune_interval_hours: 12,
            secure_cookies: true,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.port, 3001);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.delete_policy, DeletePolicy::Reject);
        assert_eq!(config.session_idle_days, 7);
        assert_eq!(config.session_prune_interval_hours, 12);
        assert!(config.secure_cookies);
    }

    #[test]
    fn test_resolve_defaults() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.delete_policy, DeletePolicy::AllowDangling);
        assert_eq!(config.session_idle_days, 30);
        assert_eq!(config.session_prune_interval_hours, 24);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
            port: 3001,
            logging_level: RequestsLoggingLevel::Path,
            session_idle_days: 10,
            ..Default::default()
        };

        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            delete_policy: Some("cascade".to_string()),
            sessions: Some(SessionsConfig {
                prune_interval_hours: Some(1),
                ..Default::default()
            }),
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.delete_policy, DeletePolicy::Cascade);
        assert_eq!(config.session_prune_interval_hours, 1);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.session_idle_days, 10);
    }

    #[test]
    fn test_resolve_rejects_unknown_values() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let bad_policy = FileConfig {
            delete_policy: Some("sometimes".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, Some(bad_policy)).is_err());

        let bad_level = FileConfig {
            logging_level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, Some(bad_level)).is_err());
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let cli = CliConfig::default();
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_dir_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_db_path_helpers() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.catalog_db_path(), temp_dir.path().join("catalog.db"));
        assert_eq!(config.user_db_path(), temp_dir.path().join("user.db"));
        assert_eq!(config.server_config().port, DEFAULT_PORT);
    }
}
