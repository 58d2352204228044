//! CLI configuration management
//!
//! Settings come from a TOML file, `BETACALC_*` environment variables and
//! command-line flags, in increasing order of precedence.

use betacalc::data::Lookback;
use betacalc::estimation::{DEFAULT_FALLBACK_BENCHMARK, SuffixBenchmark};
use betacalc::{BenchmarkResolver, EstimationMethod, EstimatorConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown log level name
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// A setting is out of range
    #[error("Invalid setting {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// The config file could not be read or parsed
    #[error("Configuration file error: {0}")]
    FileError(String),

    /// An environment variable could not be parsed
    #[error("Environment variable {var}: {reason}")]
    EnvError { var: &'static str, reason: String },
}

/// Log levels accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub const fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Default history window
    pub lookback: Lookback,
    /// Estimator settings
    pub estimator: EstimatorConfig,
    /// Per-request timeout for quote downloads
    pub request_timeout_secs: u64,
    /// Pause after each quote download
    pub rate_limit_ms: u64,
    /// Maximum concurrent analyses in a batch
    pub concurrency: usize,
    /// Replacement suffix table, in match order
    pub benchmarks: Option<Vec<SuffixBenchmark>>,
    /// Benchmark when no suffix matches
    pub fallback_benchmark: Option<String>,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            lookback: Lookback::default(),
            estimator: EstimatorConfig::default(),
            request_timeout_secs: 30,
            rate_limit_ms: 250,
            concurrency: 4,
            benchmarks: None,
            fallback_benchmark: None,
        }
    }
}

const ENV_LOG_LEVEL: &str = "BETACALC_LOG_LEVEL";
const ENV_LOOKBACK: &str = "BETACALC_LOOKBACK";
const ENV_METHOD: &str = "BETACALC_METHOD";
const ENV_TIMEOUT: &str = "BETACALC_REQUEST_TIMEOUT_SECS";
const ENV_RATE_LIMIT: &str = "BETACALC_RATE_LIMIT_MS";
const ENV_CONCURRENCY: &str = "BETACALC_CONCURRENCY";
const ENV_FALLBACK: &str = "BETACALC_FALLBACK_BENCHMARK";

fn parse_env<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvError {
        var,
        reason: e.to_string(),
    })
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields whose `BETACALC_*` variable is set.
    ///
    /// `lookup` returns the variable's value, if any.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_LOG_LEVEL) {
            self.log_level = parse_env(ENV_LOG_LEVEL, &v)?;
        }
        if let Some(v) = lookup(ENV_LOOKBACK) {
            self.lookback = parse_env(ENV_LOOKBACK, &v)?;
        }
        if let Some(v) = lookup(ENV_METHOD) {
            self.estimator.method = parse_env(ENV_METHOD, &v)?;
        }
        if let Some(v) = lookup(ENV_TIMEOUT) {
            self.request_timeout_secs = parse_env(ENV_TIMEOUT, &v)?;
        }
        if let Some(v) = lookup(ENV_RATE_LIMIT) {
            self.rate_limit_ms = parse_env(ENV_RATE_LIMIT, &v)?;
        }
        if let Some(v) = lookup(ENV_CONCURRENCY) {
            self.concurrency = parse_env(ENV_CONCURRENCY, &v)?;
        }
        if let Some(v) = lookup(ENV_FALLBACK) {
            self.fallback_benchmark = Some(v.trim().to_string());
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if let Some(lookback) = cli.lookback {
            self.lookback = lookback;
        }
        if let Some(method) = cli.method {
            self.estimator.method = method;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        let floor = self.estimator.variance_floor;
        if !floor.is_finite() || floor < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "estimator.variance_floor",
                reason: format!("{floor} is not a non-negative number"),
            });
        }
        if self
            .fallback_benchmark
            .as_deref()
            .is_some_and(|b| b.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                key: "fallback_benchmark",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Benchmark resolver honouring the configured table and fallback.
    pub fn resolver(&self) -> BenchmarkResolver {
        match (&self.benchmarks, &self.fallback_benchmark) {
            (None, None) => BenchmarkResolver::new(),
            (table, fallback) => {
                let entries = table.clone().unwrap_or_else(|| {
                    BenchmarkResolver::new().entries().to_vec()
                });
                let fallback = fallback
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FALLBACK_BENCHMARK.to_string());
                BenchmarkResolver::with_table(entries, fallback)
            }
        }
    }

    /// Per-request timeout
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay between quote downloads
    pub const fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

/// Overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<String>,
    /// Lookback override
    pub lookback: Option<Lookback>,
    /// Estimation method override
    pub method: Option<EstimationMethod>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<AppConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config_file {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::default()
    };

    config.apply_env(|var| std::env::var(var).ok())?;
    config.merge_with_cli(cli)?;
    config.validate()?;

    Ok(config)
}
