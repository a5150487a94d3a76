//! Configuration sources
//!
//! This module defines the `ConfigSource` trait and the built-in sources the
//! resolver consults: the runtime override store, the property file snapshot
//! and the process environment.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use log::debug;

use crate::common::ResourceLocator;
use crate::config::diagnostics::Diagnostics;
use crate::config::error::ConfigError;
use crate::config::properties::{decode, parse_properties};
use crate::config::types::ValueSource;

/// Configuration source trait
///
/// A source answers raw string lookups. Blank answers are treated as absent
/// by the resolver.
pub trait ConfigSource: Send + Sync {
    /// Look up a setting by its key or environment alias
    fn lookup(&self, key: &str, env_alias: &str) -> Option<String>;

    /// Get the source type
    fn source_type(&self) -> ValueSource;
}

/// Runtime override store
///
/// Every write is visible to all readers as soon as it returns.
#[derive(Debug, Default)]
pub struct OverrideStore {
    values: DashMap<String, String>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.remove(key).map(|(_, value)| value)
    }

    /// Keep only the overrides for which `keep` returns true
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        self.values.retain(|key, value| keep(key, value));
    }

    /// Copy of all current overrides, sorted by key
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for OverrideStore {
    fn lookup(&self, key: &str, _env_alias: &str) -> Option<String> {
        self.get(key)
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Override
    }
}

/// Snapshot of the property file, read once
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl FileSource {
    pub fn new(path: Option<PathBuf>, values: BTreeMap<String, String>) -> Self {
        Self { path, values }
    }

    /// Load the property file at `location`
    ///
    /// Resource roots are searched before the file system. A missing,
    /// unreadable or malformed file yields an empty snapshot after reporting
    /// to `diagnostics`.
    pub fn load(locator: &ResourceLocator, location: &str, diagnostics: &dyn Diagnostics) -> Self {
        debug!("Loading property file: {}", location);

        let (path, bytes) = match locator.read(location) {
            Ok(Some(found)) => found,
            Ok(None) => {
                diagnostics.property_file_missing(location);
                return Self::default();
            }
            Err(e) => {
                let path = PathBuf::from(location);
                let error = ConfigError::FileLoad {
                    path: location.to_string(),
                    msg: e.to_string(),
                };
                diagnostics.property_file_failed(&path, &error);
                return Self::default();
            }
        };

        match parse_properties(&decode(&bytes)) {
            Ok(values) => {
                if !values.is_empty() {
                    diagnostics.property_file_loaded(&path, &values);
                }
                Self::new(Some(path), values)
            }
            Err(e) => {
                let error = ConfigError::FileLoad {
                    path: path.display().to_string(),
                    msg: e.to_string(),
                };
                diagnostics.property_file_failed(&path, &error);
                Self::default()
            }
        }
    }

    /// Path the snapshot was read from, if a file was found
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

impl ConfigSource for FileSource {
    fn lookup(&self, key: &str, _env_alias: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::File
    }
}

/// Environment variable source
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// Read the process environment on every lookup
    #[default]
    Process,
    /// Read from a fixed set of variables
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvSource::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn var(&self, name: &str) -> Option<String> {
        match self {
            EnvSource::Process => env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

impl ConfigSource for EnvSource {
    fn lookup(&self, _key: &str, env_alias: &str) -> Option<String> {
        self.var(env_alias)
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Environment
    }
}

/// Fixed key/value source, registered on the builder as an extra layer
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl ConfigSource for MapSource {
    fn lookup(&self, key: &str, _env_alias: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::External
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::diagnostics::MockDiagnostics;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_override_store() {
        let store = OverrideStore::new();
        assert!(store.is_empty());

        store.set("mockserver.logLevel", "DEBUG");
        store.set("excludeFromPropertyReset", "mockserver.logLevel");
        assert_eq!(store.lookup("mockserver.logLevel", "MOCKSERVER_LOG_LEVEL"), Some("DEBUG".to_string()));
        assert_eq!(store.len(), 2);

        store.retain(|key, _| !key.starts_with("mockserver"));
        assert_eq!(store.get("mockserver.logLevel"), None);
        assert_eq!(store.snapshot().len(), 1);

        assert_eq!(store.remove("excludeFromPropertyReset"), Some("mockserver.logLevel".to_string()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_env_source_reads_alias() {
        let env = EnvSource::fixed([("MOCKSERVER_MAX_EXPECTATIONS", "42")]);
        assert_eq!(env.lookup("mockserver.maxExpectations", "MOCKSERVER_MAX_EXPECTATIONS"), Some("42".to_string()));
        assert_eq!(env.lookup("MOCKSERVER_MAX_EXPECTATIONS", "OTHER"), None);
        assert_eq!(env.source_type(), ValueSource::Environment);
    }

    #[test]
    fn test_file_source_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mockserver.properties");
        fs::write(&path, "mockserver.logLevel=WARN\n").unwrap();

        let mut diagnostics = MockDiagnostics::new();
        diagnostics
            .expect_property_file_loaded()
            .withf(|_, props| props.get("mockserver.logLevel").map(String::as_str) == Some("WARN"))
            .times(1)
            .return_const(());

        let source = FileSource::load(&ResourceLocator::default(), path.to_str().unwrap(), &diagnostics);
        assert_eq!(source.path(), Some(path.as_path()));
        assert_eq!(source.lookup("mockserver.logLevel", "MOCKSERVER_LOG_LEVEL"), Some("WARN".to_string()));
    }

    #[test]
    fn test_file_source_missing_and_malformed() {
        let mut diagnostics = MockDiagnostics::new();
        diagnostics
            .expect_property_file_missing()
            .withf(|location| location == "does-not-exist.properties")
            .times(1)
            .return_const(());
        let source = FileSource::load(&ResourceLocator::default(), "does-not-exist.properties", &diagnostics);
        assert!(source.values().is_empty());
        assert!(source.path().is_none());

        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.properties");
        fs::write(&path, "key=\\uXYZW\n").unwrap();

        let mut diagnostics = MockDiagnostics::new();
        diagnostics
            .expect_property_file_failed()
            .withf(|_, error| matches!(error, ConfigError::FileLoad { .. }))
            .times(1)
            .return_const(());
        let source = FileSource::load(&ResourceLocator::default(), path.to_str().unwrap(), &diagnostics);
        assert!(source.values().is_empty());
    }

    #[test]
    fn test_map_source_is_external() {
        let source = MapSource::new([("mockserver.maxExpectations", "7")]);
        assert_eq!(source.lookup("mockserver.maxExpectations", "MOCKSERVER_MAX_EXPECTATIONS"), Some("7".to_string()));
        assert_eq!(source.source_type(), ValueSource::External);
    }
}
