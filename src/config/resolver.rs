//! Layered resolver
//!
//! Asks each source in precedence order for a setting and returns the first
//! non-blank answer, falling back to the default.

use std::sync::Arc;

use crate::config::error::{ConfigError, Result};
use crate::config::source::ConfigSource;
use crate::config::types::ValueSource;

/// A raw value together with the layer that supplied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    pub raw: String,
    pub source: ValueSource,
}

/// Ordered list of sources, highest precedence first
#[derive(Clone, Default)]
pub struct Resolver {
    layers: Vec<Arc<dyn ConfigSource>>,
}

impl Resolver {
    pub fn new(layers: Vec<Arc<dyn ConfigSource>>) -> Self {
        Self { layers }
    }

    /// Resolve the effective raw string for a setting
    pub fn resolve(&self, key: &str, env_alias: &str, default: &str) -> Result<String> {
        self.resolve_with_source(key, env_alias, default)
            .map(|resolved| resolved.raw)
    }

    /// Resolve the effective raw string and report which layer supplied it
    pub fn resolve_with_source(&self, key: &str, env_alias: &str, default: &str) -> Result<ResolvedValue> {
        if is_blank(key) {
            return Err(ConfigError::InvalidConfiguration {
                key: key.to_string(),
                reason: "setting key cannot be blank".to_string(),
            });
        }
        if is_blank(env_alias) {
            return Err(ConfigError::InvalidConfiguration {
                key: key.to_string(),
                reason: "environment property name cannot be blank".to_string(),
            });
        }

        let found = self.layers.iter().find_map(|layer| {
            layer
                .lookup(key, env_alias)
                .filter(|value| !is_blank(value))
                .map(|value| (value, layer.source_type()))
        });

        let (raw, source) = found.unwrap_or_else(|| (default.to_string(), ValueSource::Default));
        Ok(ResolvedValue {
            raw: strip_quotes(&raw).to_string(),
            source,
        })
    }

    pub fn layers(&self) -> &[Arc<dyn ConfigSource>] {
        &self.layers
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|layer| layer.source_type()))
            .finish()
    }
}

/// Empty or whitespace-only
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Remove one pair of enclosing double quotes
pub fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
