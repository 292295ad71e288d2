//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from multiple sources:
//!
//! 1. Environment variables (ROOMWATCH_*)
//! 2. TOML config file (if ROOMWATCH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ROOMWATCH_*)
/// 2. TOML config file (if ROOMWATCH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite snapshot cache database.
    ///
    /// Set via ROOMWATCH_DB_PATH.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string sent with every platform request.
    ///
    /// Set via ROOMWATCH_USER_AGENT. Platforms serve different markup to
    /// non-browser agents, so the default imitates desktop Chrome.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via ROOMWATCH_TIMEOUT_MS.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Cache entry time-to-live in hours.
    ///
    /// Set via ROOMWATCH_CACHE_TTL_HOURS. Entries older than this are
    /// treated as absent.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Base URL of the third-party mirror serving douyin room data.
    ///
    /// Set via ROOMWATCH_DOUYIN_API_BASE. The platform's own API is not
    /// reachable server-side, so this endpoint is user-swappable.
    #[serde(default = "default_douyin_api_base")]
    pub douyin_api_base: String,

    /// Maximum rooms fetched concurrently during a batch update.
    ///
    /// Set via ROOMWATCH_MAX_CONCURRENCY. 1 restores strictly sequential
    /// polling.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./roomwatch.sqlite")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_douyin_api_base() -> String {
    "https://douyin.wtf".into()
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            cache_ttl_hours: default_cache_ttl_hours(),
            douyin_api_base: default_douyin_api_base(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl AppConfig {
    /// Request timeout as a Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 3600)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, environment
    /// variables cannot be parsed, or validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ROOMWATCH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ROOMWATCH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./roomwatch.sqlite"));
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.douyin_api_base, "https://douyin.wtf");
        assert_eq!(config.max_concurrency, 4);
        assert!(config.user_agent.contains("Mozilla"));
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert_eq!(config.cache_ttl(), Duration::from_secs(24 * 3600));
    }
}
