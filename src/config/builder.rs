//! Configuration builder
//!
//! This module provides a builder pattern for constructing the configuration
//! engine from its sources.

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::common::ResourceLocator;
use crate::config::defaults::{MemoryLimits, RuntimeFacts, CONTAINER_PROPERTY_FILE, DEFAULT_PROPERTY_FILE};
use crate::config::diagnostics::{Diagnostics, LogDiagnostics};
use crate::config::error::Result;
use crate::config::manager::ConfigManager;
use crate::config::resolver::{is_blank, Resolver};
use crate::config::settings::{self, PROPERTY_FILE};
use crate::config::source::{ConfigSource, EnvSource, FileSource, OverrideStore};

/// Configuration builder
///
/// Provides a fluent API for building a `ConfigManager`. Sources are
/// consulted in this order: overrides, extra sources in registration order,
/// the property file, then the environment.
pub struct ConfigBuilder {
    overrides: Vec<(String, String)>,
    property_file: Option<String>,
    resource_roots: Vec<PathBuf>,
    env: EnvSource,
    sources: Vec<Arc<dyn ConfigSource>>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
    memory: MemoryLimits,
    available_processors: Option<usize>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            overrides: Vec::new(),
            property_file: None,
            resource_roots: Vec::new(),
            env: EnvSource::Process,
            sources: Vec::new(),
            diagnostics: None,
            memory: MemoryLimits::default(),
            available_processors: None,
        }
    }

    /// Add an initial override
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Add several initial overrides
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Read the property file from `location` instead of the default
    ///
    /// The location is only used to find the file; it is not an override.
    pub fn with_property_file(mut self, location: impl Into<String>) -> Self {
        self.property_file = Some(location.into());
        self
    }

    /// Search `root` for resources before the file system
    pub fn with_resource_dir(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!("Adding resource directory: {}", root.display());
        self.resource_roots.push(root);
        self
    }

    /// Replace the environment provider
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// Read environment variables from a fixed map
    pub fn with_env_vars<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_env(EnvSource::fixed(vars))
    }

    /// Add a source consulted after overrides and before the property file
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        debug!("Adding configuration source: {}", source.source_type());
        self.sources.push(Arc::new(source));
        self
    }

    /// Report parse failures and property file events to `diagnostics`
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Derive memory limits from this heap budget instead of the default
    pub fn with_heap_bytes(mut self, heap_bytes: u64) -> Self {
        self.memory = MemoryLimits::from_heap_bytes(heap_bytes);
        self
    }

    pub fn with_memory_limits(mut self, memory: MemoryLimits) -> Self {
        self.memory = memory;
        self
    }

    /// Use this processor count instead of detecting it
    pub fn with_available_processors(mut self, count: usize) -> Self {
        self.available_processors = Some(count);
        self
    }

    /// Build the configuration engine
    ///
    /// Fails only if the settings table itself is malformed. A missing or
    /// unreadable property file is reported to the diagnostics sink and
    /// treated as empty.
    pub fn build(self) -> Result<ConfigManager> {
        settings::validate_table(settings::ALL)?;

        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(LogDiagnostics));

        let overrides = Arc::new(OverrideStore::new());
        for (key, value) in self.overrides {
            overrides.set(key, value);
        }

        let locator = ResourceLocator::new(self.resource_roots);
        let explicit = self
            .property_file
            .or_else(|| overrides.get(PROPERTY_FILE.def.key));
        let location = property_file_location(explicit.as_deref(), &self.env);
        let file = FileSource::load(&locator, &location, diagnostics.as_ref());
        let property_file = file.path().map(PathBuf::from);

        let mut layers: Vec<Arc<dyn ConfigSource>> = Vec::with_capacity(self.sources.len() + 3);
        layers.push(overrides.clone());
        layers.extend(self.sources);
        layers.push(Arc::new(file));
        layers.push(Arc::new(self.env));
        debug!("Building configuration from {} sources", layers.len());

        let mut facts = RuntimeFacts::detect(self.memory);
        if let Some(count) = self.available_processors {
            facts.available_processors = count;
        }

        Ok(ConfigManager::new(
            Resolver::new(layers),
            overrides,
            locator,
            facts,
            diagnostics,
            property_file,
        ))
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Location of the property file
///
/// `explicit` comes from the builder or an initial override. The container
/// location given explicitly yields to a non-blank environment value.
fn property_file_location(explicit: Option<&str>, env: &EnvSource) -> String {
    let explicit = explicit.filter(|value| !is_blank(value));
    let from_env = env
        .var(PROPERTY_FILE.def.env)
        .filter(|value| !is_blank(value));

    match explicit {
        Some(location) if location == CONTAINER_PROPERTY_FILE => {
            from_env.unwrap_or_else(|| location.to_string())
        }
        Some(location) => location.to_string(),
        None => from_env.unwrap_or_else(|| DEFAULT_PROPERTY_FILE.to_string()),
    }
}
