//! Diagnostics sink
//!
//! Parse failures and property file events are reported here rather than
//! returned as errors. The default sink writes to the `log` facade and counts
//! parse failures.

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, error, info};

use crate::config::defaults::MASK;
use crate::config::error::ConfigError;
use crate::config::settings;
use crate::config::types::ValueKind;

/// A raw value that could not be parsed into its setting's kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub key: &'static str,
    pub raw: String,
    pub expected: ValueKind,
    pub reason: String,
}

/// Receiver for configuration diagnostics
#[cfg_attr(test, mockall::automock)]
pub trait Diagnostics: Send + Sync {
    /// A resolved value failed to parse and a fallback was used
    fn parse_failure(&self, failure: &ParseFailure);

    /// A non-empty property file was loaded
    fn property_file_loaded(&self, path: &Path, properties: &BTreeMap<String, String>);

    /// The property file exists but could not be read or parsed
    fn property_file_failed(&self, path: &Path, error: &ConfigError);

    /// No property file was found at the configured location
    fn property_file_missing(&self, location: &str);
}

/// Diagnostics sink backed by `log` and `metrics`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn parse_failure(&self, failure: &ParseFailure) {
        error!(
            "Invalid value \"{}\" for {}, expected {}: {}",
            masked(failure.key, &failure.raw),
            failure.key,
            failure.expected,
            failure.reason
        );
        metrics::counter!("config_parse_failures_total", "key" => failure.key).increment(1);
    }

    fn property_file_loaded(&self, path: &Path, properties: &BTreeMap<String, String>) {
        let mut dump = format!("Reading properties from property file [{}]:", path.display());
        for (key, value) in properties {
            dump.push_str(&format!("\n  {} = {}", key, masked(key, value)));
        }
        info!("{}", dump);
    }

    fn property_file_failed(&self, path: &Path, error: &ConfigError) {
        error!("Exception loading property file [{}]: {}", path.display(), error);
    }

    fn property_file_missing(&self, location: &str) {
        debug!("Property file not found using path [{}]", location);
    }
}

/// `value`, or the mask if `key` names a sensitive setting
fn masked<'a>(key: &str, value: &'a str) -> &'a str {
    if settings::find(key).map_or(false, |def| def.sensitive) {
        MASK
    } else {
        value
    }
}
