//! Error types for the harness

use std::path::PathBuf;

use ea_client::ClientError;
use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading the harness configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("token file {path} is missing or empty")]
    TokenFile { path: PathBuf },

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors raised by helpers, preflight and scenarios
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no emergency alerts found; configure at least one test alert in Home Assistant")]
    NoAlerts,

    #[error("assertion failed: {0}")]
    Assertion(String),
}
