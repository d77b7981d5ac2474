//! Configuration module for the order tracker.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for the tracker and its observability stack.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_tracker::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! println!("cache capacity: {}", config.tracker.cache_capacity);
//! ```
//!
//! # Example
//!
//! ```yaml
//! tracker:
//!   cache_capacity: 1000
//!   cache_ttl_secs: 30
//!   sweep_interval_secs: 5
//!   terminal_event_policy: ONCE
//! observability:
//!   logging:
//!     level: ${LOG_LEVEL:-info}
//!     format: json
//!   metrics:
//!     enabled: false
//!     listen_addr: 0.0.0.0:9090
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::order_tracking::TerminalEventPolicy;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tracker configuration.
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Order tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Maximum number of retired orders kept for late updates.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Seconds a retired order stays reachable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: f64,
    /// Seconds between background sweeps of expired cache entries.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Whether a changed retired order republishes its terminal event.
    #[serde(default)]
    pub terminal_event_policy: TerminalEventPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            terminal_event_policy: TerminalEventPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Cache TTL as a duration. Values too large to represent saturate.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::try_from_secs_f64(self.cache_ttl_secs).unwrap_or(Duration::MAX)
    }

    /// Sweep interval as a duration.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

const fn default_cache_capacity() -> usize {
    1000
}
const fn default_cache_ttl_secs() -> f64 {
    30.0
}
const fn default_sweep_interval_secs() -> u64 {
    5
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (overridden by `RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: `json` or `pretty`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Start the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,
    /// Exporter listen address.
    #[serde(default = "default_metrics_listen_addr")]
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_listen_addr(),
        }
    }
}

fn default_metrics_listen_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// Load configuration from a YAML file.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let tracker = &config.tracker;

    if tracker.cache_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "tracker.cache_capacity must be positive".to_string(),
        ));
    }

    if !tracker.cache_ttl_secs.is_finite() || tracker.cache_ttl_secs <= 0.0 {
        return Err(ConfigError::ValidationError(
            "tracker.cache_ttl_secs must be a positive number".to_string(),
        ));
    }

    if Duration::try_from_secs_f64(tracker.cache_ttl_secs).is_err() {
        return Err(ConfigError::ValidationError(format!(
            "tracker.cache_ttl_secs {} is too large",
            tracker.cache_ttl_secs
        )));
    }

    if tracker.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "tracker.sweep_interval_secs must be positive".to_string(),
        ));
    }

    let logging = &config.observability.logging;
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.level must be one of: {valid_levels:?}"
        )));
    }

    let valid_formats = ["json", "pretty"];
    if !valid_formats.contains(&logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.format must be one of: {valid_formats:?}"
        )));
    }

    let metrics = &config.observability.metrics;
    if metrics.enabled && metrics.listen_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(ConfigError::ValidationError(format!(
            "metrics.listen_addr '{}' is not a valid socket address",
            metrics.listen_addr
        )));
    }

    Ok(())
}
