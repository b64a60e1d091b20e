//! Core error types for redmoon-core.
//!
//! Foreground queries never surface here: every query failure collapses to
//! the "unknown" identifier inside the monitor. These types cover the paths
//! that do report failure to a caller (configuration and timer registration).

use std::path::PathBuf;
use thiserror::Error;

use crate::alarm::TimerTier;

/// Core error type for redmoon-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timer registration errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Dot-path key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse a configuration fragment
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors reported by a [`TimerService`](crate::alarm::TimerService).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The service was asked for a tier it does not provide
    #[error("timer tier {0:?} is not supported by this service")]
    Unsupported(TimerTier),

    /// The platform refused the registration
    #[error("timer registration rejected: {0}")]
    Rejected(String),

    /// The service can no longer deliver fires
    #[error("timer service is shut down")]
    ServiceClosed,
}

/// Errors a [`ProcessQuery`](crate::monitor::ProcessQuery) may return.
///
/// These are swallowed by the foreground sources and turned into the
/// unknown identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The capability is missing or permission was withheld
    #[error("process query unavailable: {0}")]
    Unavailable(String),

    /// A transient platform failure
    #[error("process query failed: {0}")]
    Failed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
