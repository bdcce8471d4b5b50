//! Application settings loading from config.toml and the environment.
//!
//! Settings come from an optional TOML file merged with environment
//! variables. `DATABASE_URL` always wins over the file so deployments can
//! point the engine at a different store without editing config.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default store location when neither the file nor the environment says
/// otherwise.
const DEFAULT_DATABASE_URL: &str = "sqlite://data/envelope_ledger.sqlite";

/// How often the scheduler checks whether the weekly rollover is due, in
/// seconds. The rollover itself is guarded by a week marker, so a short
/// interval is safe.
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;

/// Top-level application settings, the shape of config.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Connection string for the backing store
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Settings for the rollover scheduler loop.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between rollover-due checks
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

const fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: default_database_url(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            check_interval_secs: default_check_interval(),
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the application configuration.
///
/// Reads `config.toml` from the working directory when present, falls back
/// to defaults otherwise, then applies the `DATABASE_URL` environment
/// override.
pub fn load_app_configuration() -> Result<AppConfig> {
    let mut config = if Path::new("config.toml").exists() {
        load_config("config.toml")?
    } else {
        AppConfig::default()
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = url;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            database_url = "sqlite://test.sqlite"

            [scheduler]
            check_interval_secs = 60
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_url, "sqlite://test.sqlite");
        assert_eq!(config.scheduler.check_interval_secs, 60);
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(
            config.scheduler.check_interval_secs,
            DEFAULT_CHECK_INTERVAL_SECS
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/config.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
