//! Configuration management for deliverylog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "deliverylog";

/// Default delivery log file name.
const LOG_FILE_NAME: &str = "deliveries.csv";

/// Default session file name.
const SESSION_FILE_NAME: &str = "sessions.json";

/// Shared admin secret used when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "audivolks";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DELIVERYLOG_`, `__` between
///    section and key, e.g. `DELIVERYLOG_ADMIN__PASSWORD`)
/// 2. TOML config file at `~/.config/deliverylog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Business rules.
    pub business: BusinessConfig,
    /// Admin dashboard access.
    pub admin: AdminConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the delivery log.
    /// Defaults to `~/.local/share/deliverylog/deliveries.csv`
    pub log_path: Option<PathBuf>,
    /// Path to the open-session file.
    /// Defaults to `~/.local/share/deliverylog/sessions.json`
    pub session_path: Option<PathBuf>,
    /// How long a parsed log may be reused, in seconds. 0 disables caching.
    pub cache_ttl_secs: u64,
}

/// Business rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    /// UTC offset of the business timezone, e.g. `-06:00`.
    pub utc_offset: String,
    /// Number of delivery slots per submission.
    pub max_slots: usize,
}

/// Admin dashboard access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared admin password.
    pub password: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            session_path: None,
            cache_ttl_secs: 60,
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            utc_offset: "-06:00".to_string(),
            max_slots: 5,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// `None` reads the default config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("DELIVERYLOG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.business_offset()?;

        if self.business.max_slots == 0 {
            return Err(Error::config_validation(
                "max_slots must be greater than 0",
            ));
        }

        if self.admin.password.is_empty() {
            return Err(Error::config_validation("admin password cannot be empty"));
        }

        Ok(())
    }

    /// Parse the business timezone offset.
    ///
    /// # Errors
    ///
    /// Returns an error if `utc_offset` is not a `±HH:MM` offset.
    pub fn business_offset(&self) -> Result<FixedOffset> {
        self.business
            .utc_offset
            .trim()
            .parse::<FixedOffset>()
            .map_err(|e| {
                Error::config_validation(format!(
                    "invalid utc_offset {:?}: {e}",
                    self.business.utc_offset
                ))
            })
    }

    /// Get the delivery log path, resolving defaults if not set.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.storage
            .log_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LOG_FILE_NAME))
    }

    /// Get the session file path, resolving defaults if not set.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.storage
            .session_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SESSION_FILE_NAME))
    }

    /// Get the cache freshness window as a Duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.storage.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.log_path.is_none());
        assert!(config.storage.session_path.is_none());
        assert_eq!(config.storage.cache_ttl_secs, 60);
        assert_eq!(config.business.utc_offset, "-06:00");
        assert_eq!(config.business.max_slots, 5);
        assert_eq!(config.admin.password, DEFAULT_ADMIN_PASSWORD);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_offset() {
        let mut config = Config::default();
        config.business.utc_offset = "Mexico City".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("utc_offset"));
    }

    #[test]
    fn test_validate_zero_slots() {
        let mut config = Config::default();
        config.business.max_slots = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_slots"));
    }

    #[test]
    fn test_validate_empty_password() {
        let mut config = Config::default();
        config.admin.password = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("password"));
    }

    #[test]
    fn test_business_offset() {
        let config = Config::default();
        assert_eq!(
            config.business_offset().unwrap(),
            FixedOffset::west_opt(6 * 3600).unwrap()
        );
    }

    #[test]
    fn test_log_path_default() {
        let path = Config::default().log_path();
        assert!(path.to_string_lossy().contains("deliveries.csv"));
    }

    #[test]
    fn test_log_path_custom() {
        let mut config = Config::default();
        config.storage.log_path = Some(PathBuf::from("/srv/entregas.csv"));
        assert_eq!(config.log_path(), PathBuf::from("/srv/entregas.csv"));
    }

    #[test]
    fn test_session_path_default() {
        let path = Config::default().session_path();
        assert!(path.to_string_lossy().contains("sessions.json"));
    }

    #[test]
    fn test_cache_ttl() {
        assert_eq!(Config::default().cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("deliverylog"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[storage]\nlog_path = \"/tmp/entregas.csv\"\ncache_ttl_secs = 0\n\n\
             [business]\nmax_slots = 3\n"
        )
        .unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.log_path(), PathBuf::from("/tmp/entregas.csv"));
        assert_eq!(config.storage.cache_ttl_secs, 0);
        assert_eq!(config.business.max_slots, 3);
        assert_eq!(config.business.utc_offset, "-06:00");
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[business]\nmax_slots = 0\n").unwrap();

        let result = Config::load_from(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("cache_ttl_secs"));
        assert!(json.contains("utc_offset"));
    }
}
