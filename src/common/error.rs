//! Error handling module
//!
//! This module defines the application-level error type used by the binary
//! and by callers that mix configuration errors with I/O.

use thiserror::Error;
use std::io;

use crate::config::ConfigError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid command line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
