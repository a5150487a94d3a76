//! Configuration module
//!
//! This module resolves every runtime setting from layered sources: runtime
//! overrides, extra sources, a Java-style property file, environment
//! variables and built-in defaults. Values are parsed into typed settings,
//! validated on write and optionally cached for the hot path.

// Submodules
pub mod builder;
pub mod cache;
pub mod defaults;
pub mod diagnostics;
pub mod error;
pub mod manager;
pub mod parser;
pub mod properties;
pub mod resolved;
pub mod resolver;
pub mod settings;
pub mod source;
pub mod types;
pub mod validator;

// Re-export types and traits
pub use self::builder::ConfigBuilder;
pub use self::defaults::{MemoryLimits, RuntimeFacts, PROPERTY_PREFIX};
pub use self::diagnostics::{Diagnostics, LogDiagnostics, ParseFailure};
pub use self::error::{ConfigError, Result};
pub use self::manager::{ConfigChangeEvent, ConfigChangeListener, ConfigManager};
pub use self::resolved::ResolvedSetting;
pub use self::resolver::{ResolvedValue, Resolver};
pub use self::settings::{Policy, Setting, SettingDef};
pub use self::source::{ConfigSource, EnvSource, FileSource, MapSource, OverrideStore};
pub use self::types::{Endpoint, LogLevel, SettingValue, TrustManagerType, Value, ValueKind, ValueSource};
pub use self::validator::Validator;
