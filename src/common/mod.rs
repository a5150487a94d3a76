//! Common module
//!
//! This module contains shared errors and utility functions used throughout the crate.

pub mod error;
pub mod fs;
pub mod log;

// Re-export commonly used types and functions
pub use error::{AppError, Result};
pub use fs::ResourceLocator;
pub use log::{apply_log_level, init_logger};
