//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mockserver_config::config::{ConfigBuilder, ConfigError, Diagnostics, ParseFailure};

/// Diagnostics sink that records every event
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    pub failures: Mutex<Vec<ParseFailure>>,
    pub loaded: Mutex<Vec<(PathBuf, BTreeMap<String, String>)>>,
    pub failed: Mutex<Vec<ConfigError>>,
    pub missing: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn failure_keys(&self) -> Vec<&'static str> {
        self.failures.lock().unwrap().iter().map(|f| f.key).collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn parse_failure(&self, failure: &ParseFailure) {
        self.failures.lock().unwrap().push(failure.clone());
    }

    fn property_file_loaded(&self, path: &Path, properties: &BTreeMap<String, String>) {
        self.loaded.lock().unwrap().push((path.to_path_buf(), properties.clone()));
    }

    fn property_file_failed(&self, _path: &Path, error: &ConfigError) {
        self.failed.lock().unwrap().push(error.clone());
    }

    fn property_file_missing(&self, location: &str) {
        self.missing.lock().unwrap().push(location.to_string());
    }
}

/// Builder isolated from the process environment and the working directory
pub fn isolated() -> ConfigBuilder {
    ConfigBuilder::new()
        .with_env_vars(Vec::<(String, String)>::new())
        .with_property_file("no-such-mockserver.properties")
}

/// Isolated builder recording into a fresh sink
pub fn recorded() -> (ConfigBuilder, Arc<RecordingDiagnostics>) {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let builder = isolated().with_diagnostics(diagnostics.clone());
    (builder, diagnostics)
}
