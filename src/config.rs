use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CallShieldError, Result};

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite storage settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Call history view settings
    pub history: HistoryConfig,
}

/// SQLite storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path or `sqlite:` URL of the database file
    pub url: String,
    /// Connection pool size
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "data/callshield.db".to_string(),
            max_connections: 10,
            connection_timeout_secs: 30,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level (trace, debug, info, warn, error)
    pub level: String,
    /// Optional log file; JSON lines, rotated daily
    pub file_path: Option<String>,
    /// Console format, "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

/// Call history view settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Call events loaded into the service snapshot
    pub load_limit: usize,
    /// Entries exposed by the recent-calls view
    pub view_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            load_limit: 100,
            view_limit: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment with precedence:
    /// built-in defaults, `config/default`, `config/local`, then
    /// `CALLSHIELD_*` environment variables (`__` as section separator).
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("CALLSHIELD").separator("__"))
            .build()
            .map_err(|e| CallShieldError::InvalidConfig(format!("failed to load: {e}")))?;

        let app_config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| CallShieldError::InvalidConfig(format!("failed to deserialize: {e}")))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(CallShieldError::InvalidConfig(
                "database.url must not be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(CallShieldError::InvalidConfig(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(CallShieldError::InvalidConfig(
                "database.connection_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(CallShieldError::InvalidConfig(format!(
                "invalid log level: {}. Must be one of: {valid_levels:?}",
                self.logging.level
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(CallShieldError::InvalidConfig(format!(
                "invalid log format: {}. Must be one of: {valid_formats:?}",
                self.logging.format
            )));
        }

        if self.history.load_limit == 0 {
            return Err(CallShieldError::InvalidConfig(
                "history.load_limit must be greater than 0".to_string(),
            ));
        }
        if self.history.view_limit > self.history.load_limit {
            return Err(CallShieldError::InvalidConfig(
                "history.view_limit must not exceed history.load_limit".to_string(),
            ));
        }

        Ok(())
    }

    /// Get database URL from environment or config
    #[must_use]
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, "data/callshield.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.history.load_limit, 100);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_pool_size() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_view_limit_bounded_by_load_limit() {
        let mut config = AppConfig::default();
        config.history.view_limit = config.history.load_limit + 1;
        assert!(config.validate().is_err());
    }
}
