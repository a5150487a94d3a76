//! MockServer Config: layered runtime configuration for a mock HTTP server
//!
//! Every tunable of the server is a named setting with a property key, an
//! environment variable alias and a default. Reads walk the sources in
//! precedence order and parse the first non-blank value; a small set of
//! hot-path settings is cached and refreshed only by writes and reset.
//!
//! # Example
//!
//! ```no_run
//! use mockserver_config::config::{settings, ConfigBuilder};
//!
//! fn main() -> mockserver_config::common::Result<()> {
//!     let config = ConfigBuilder::new()
//!         .with_property_file("mockserver.properties")
//!         .build()?;
//!
//!     config.set(&settings::MAX_EXPECTATIONS, 250)?;
//!     assert_eq!(config.get(&settings::MAX_EXPECTATIONS), 250);
//!
//!     config.reset_all();
//!     println!("log level: {}", config.log_level());
//!     Ok(())
//! }
//! ```

// Public modules
pub mod common;
pub mod config;

// Re-export commonly used structures and functions for convenience
pub use common::{AppError, Result};
pub use config::{ConfigBuilder, ConfigError, ConfigManager};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
