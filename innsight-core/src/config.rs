//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/innsight/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/innsight/` (~/.config/innsight/)
//! - State/Logs: `$XDG_STATE_HOME/innsight/` (~/.local/state/innsight/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Forecast/model cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Forecasting configuration
    #[serde(default)]
    pub forecasting: ForecastingConfig,

    /// History provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Shared analytics cache configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Entry time-to-live in milliseconds
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,

    /// Maximum number of entries before FIFO eviction
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_cache_ttl_ms(),
            max_size: default_cache_max_size(),
        }
    }
}

fn default_cache_ttl_ms() -> u64 {
    3_600_000
}

fn default_cache_max_size() -> usize {
    10_000
}

/// Forecasting engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ForecastingConfig {
    /// Minimum valid observations required before a series is forecastable
    #[serde(default = "default_min_data_points")]
    pub min_data_points: usize,

    /// Confidence level used for prediction intervals
    #[serde(default = "default_confidence_level")]
    pub default_confidence_level: f64,

    /// Upper bound on the forecast horizon
    #[serde(default = "default_max_forecast_periods")]
    pub max_forecast_periods: usize,
}

impl Default for ForecastingConfig {
    fn default() -> Self {
        Self {
            min_data_points: default_min_data_points(),
            default_confidence_level: default_confidence_level(),
            max_forecast_periods: default_max_forecast_periods(),
        }
    }
}

fn default_min_data_points() -> usize {
    10
}

fn default_confidence_level() -> f64 {
    0.95
}

fn default_max_forecast_periods() -> usize {
    365
}

/// History provider configuration
///
/// The external history fetch is the only blocking call in the engine,
/// so it carries an explicit timeout. A timeout degrades to an empty
/// series rather than failing the caller.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Fetch timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_provider_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning an error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.forecasting.min_data_points == 0 {
            return Err(Error::Config(
                "forecasting.min_data_points must be at least 1".to_string(),
            ));
        }
        let level = self.forecasting.default_confidence_level;
        if !(level > 0.0 && level <= 1.0) {
            return Err(Error::Config(
                "forecasting.default_confidence_level must be in (0, 1]".to_string(),
            ));
        }
        if self.forecasting.max_forecast_periods == 0 {
            return Err(Error::Config(
                "forecasting.max_forecast_periods must be at least 1".to_string(),
            ));
        }
        if self.cache.max_size == 0 {
            return Err(Error::Config(
                "cache.max_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/innsight/config.toml` (~/.config/innsight/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("innsight").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/innsight/` (~/.local/state/innsight/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("innsight")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("innsight.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_ms, 3_600_000);
        assert_eq!(config.cache.max_size, 10_000);
        assert_eq!(config.forecasting.min_data_points, 10);
        assert_eq!(config.forecasting.default_confidence_level, 0.95);
        assert_eq!(config.forecasting.max_forecast_periods, 365);
        assert_eq!(config.provider.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[cache]
ttl_ms = 60000
max_size = 500

[forecasting]
min_data_points = 14
default_confidence_level = 0.9

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.cache.ttl_ms, 60_000);
        assert_eq!(config.cache.max_size, 500);
        assert_eq!(config.forecasting.min_data_points, 14);
        assert_eq!(config.forecasting.default_confidence_level, 0.9);
        // Unspecified options keep their defaults
        assert_eq!(config.forecasting.max_forecast_periods, 365);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_confidence_level_rejected() {
        let toml = r#"
[forecasting]
default_confidence_level = 1.5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nttl_ms = 1000\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache.ttl_ms, 1000);
    }

    #[test]
    fn test_load_from_missing_file_is_config_error() {
        let path = PathBuf::from("/nonexistent/innsight/config.toml");
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::error::Error::Config(_))
        ));
    }
}
