use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub delete_policy: Option<String>,

    pub sessions: Option<SessionsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SessionsConfig {
    pub idle_days: Option<u64>,
    pub prune_interval_hours: Option<u64>,
    pub secure_cookies: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_file() {
        let config: FileConfig = toml::from_str(
            r#"
            db_dir = "/data/db"
            port = 8080
            logging_level = "headers"
            delete_policy = "cascade"

            [sessions]
            idle_days = 7
            prune_interval_hours = 6
            secure_cookies = true
            "#,
        )
        .unwrap();

        assert_eq!(config.db_dir.as_deref(), Some("/data/db"));
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.delete_policy.as_deref(), Some("cascade"));
        let sessions = config.sessions.unwrap();
        assert_eq!(sessions.idle_days, Some(7));
        assert_eq!(sessions.prune_interval_hours, Some(6));
        assert_eq!(sessions.secure_cookies, Some(true));
    }

    #[test]
    fn missing_keys_stay_unset() {
        let config: FileConfig = toml::from_str("port = 5000").unwrap();
        assert!(config.db_dir.is_none());
        assert!(config.sessions.is_none());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging_level = \"body\"").unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.logging_level.as_deref(), Some("body"));

        assert!(FileConfig::load(Path::new("/nonexistent/config.toml")).is_err());
    }
}
