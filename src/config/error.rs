//! Configuration errors
//!
//! This module defines error types for the configuration module.

use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The settings table or a lookup request is malformed
    #[error("Invalid configuration for '{key}': {reason}")]
    InvalidConfiguration { key: String, reason: String },

    /// A host:port value could not be parsed
    #[error("Invalid value for '{key}': \"{value}\" is not a valid \"<host>:<port>\" address")]
    InvalidEndpoint { key: String, value: String },

    /// A path setting names a file or directory that cannot be read
    #[error("{key} file \"{path}\" does not exist or is not accessible")]
    FileNotFound { key: String, path: String },

    /// A value is outside the set accepted by the setting
    #[error("Invalid value for '{key}': {msg}")]
    InvalidValue { key: String, msg: String },

    /// The property file could not be read or parsed
    #[error("Error loading property file {path}: {msg}")]
    FileLoad { path: String, msg: String },

    /// No setting with this name or key exists
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
