//! Configuration manager
//!
//! The runtime engine: typed reads through the layered resolver or the cell
//! cache, validated writes to the override store, change listeners and reset.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, error, info};

use crate::common::ResourceLocator;
use crate::config::cache::CellCache;
use crate::config::defaults::{RuntimeFacts, MASK, PROPERTY_PREFIX};
use crate::config::diagnostics::Diagnostics;
use crate::config::error::{ConfigError, Result};
use crate::config::parser::parse_value;
use crate::config::resolver::{is_blank, ResolvedValue, Resolver};
use crate::config::settings::{self, Setting, SettingDef};
use crate::config::source::OverrideStore;
use crate::config::types::{LogLevel, SettingValue, Value};
use crate::config::validator::validate;

/// Configuration change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChangeEvent {
    /// An override was written for the setting with this key
    Updated(&'static str),
    /// The override for the setting with this key was removed
    Cleared(&'static str),
    /// Overrides were reset and every cell recomputed
    Reset,
}

/// Configuration change listener type
pub type ConfigChangeListener = Arc<dyn Fn(ConfigChangeEvent) + Send + Sync>;

/// Runtime configuration engine
///
/// Built by `ConfigBuilder` and shared by reference or `Arc`. Reads hold the
/// shared side of an engine-wide guard; mutators and `reset_all` hold it
/// exclusively, so no read sees an override without its refreshed cell or a
/// partially applied reset.
pub struct ConfigManager {
    resolver: Resolver,
    overrides: Arc<OverrideStore>,
    cells: CellCache,
    locator: ResourceLocator,
    facts: RuntimeFacts,
    diagnostics: Arc<dyn Diagnostics>,
    property_file: Option<PathBuf>,
    listeners: RwLock<Vec<ConfigChangeListener>>,
    guard: RwLock<()>,
}

impl ConfigManager {
    pub(crate) fn new(
        resolver: Resolver,
        overrides: Arc<OverrideStore>,
        locator: ResourceLocator,
        facts: RuntimeFacts,
        diagnostics: Arc<dyn Diagnostics>,
        property_file: Option<PathBuf>,
    ) -> Self {
        let mut manager = Self {
            resolver,
            overrides,
            cells: CellCache::default(),
            locator,
            facts,
            diagnostics,
            property_file,
            listeners: RwLock::new(Vec::new()),
            guard: RwLock::new(()),
        };

        manager.cells = CellCache::build(
            settings::ALL.iter().copied().filter(|def| def.is_cached()),
            |def| manager.compute_or_default(def, None),
        );
        debug!("Created ConfigManager with {} cached settings", manager.cells.len());

        manager
    }

    /// Read a setting, falling back to its default if it cannot be resolved
    pub fn get<T: SettingValue>(&self, setting: &Setting<T>) -> T {
        match self.try_get(setting) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to resolve {}: {}", setting.def.key, e);
                T::from_value(self.default_value(&setting.def)).unwrap_or_default()
            }
        }
    }

    /// Read a setting, surfacing resolution errors
    pub fn try_get<T: SettingValue>(&self, setting: &Setting<T>) -> Result<T> {
        let value = self.value(&setting.def)?;
        Ok(T::from_value(value).unwrap_or_default())
    }

    /// Current value of a setting
    ///
    /// Cached settings are served from their cell; all others are resolved.
    pub fn value(&self, def: &SettingDef) -> Result<Value> {
        let _guard = self.guard.read().unwrap_or_else(PoisonError::into_inner);
        self.current_value(def)
    }

    /// Effective raw string and the source that supplied it
    pub fn raw_value(&self, def: &SettingDef) -> Result<ResolvedValue> {
        let _guard = self.guard.read().unwrap_or_else(PoisonError::into_inner);
        self.resolver
            .resolve_with_source(def.key, def.env, &def.default_raw(&self.facts))
    }

    /// Raw string, source and typed value read under one guard
    pub(crate) fn read_consistent(&self, def: &SettingDef) -> Result<(ResolvedValue, Value)> {
        let _guard = self.guard.read().unwrap_or_else(PoisonError::into_inner);
        let raw = self
            .resolver
            .resolve_with_source(def.key, def.env, &def.default_raw(&self.facts))?;
        Ok((raw, self.current_value(def)?))
    }

    /// Like `value`, for callers already holding the guard
    fn current_value(&self, def: &SettingDef) -> Result<Value> {
        if def.is_cached() {
            if let Some(value) = self.cells.load(def.key) {
                return Ok(value.as_ref().clone());
            }
        }
        self.compute(def, None)
    }

    /// Write a typed value
    pub fn set<T: SettingValue>(&self, setting: &Setting<T>, value: T) -> Result<()> {
        self.set_raw(&setting.def, &value.to_raw())
    }

    /// Write a raw string
    ///
    /// Blank input clears the override. Otherwise the value is validated
    /// first and nothing is written if validation fails.
    pub fn set_raw(&self, def: &SettingDef, raw: &str) -> Result<()> {
        let def = settings::require(def.key)?;
        let stored = if is_blank(raw) {
            None
        } else {
            Some(validate(def, raw, &self.locator)?)
        };

        let event = {
            let _guard = self.guard.write().unwrap_or_else(PoisonError::into_inner);

            match stored {
                None => {
                    self.overrides.remove(def.key);
                    self.refresh(def);
                    ConfigChangeEvent::Cleared(def.key)
                }
                Some(stored) => {
                    debug!("Setting {} to {}", def.key, if def.sensitive { MASK } else { stored.as_str() });
                    self.overrides.set(def.key, stored);
                    self.refresh(def);
                    ConfigChangeEvent::Updated(def.key)
                }
            }
        };

        self.notify_listeners(event);
        Ok(())
    }

    /// Remove the override for a setting
    pub fn clear<T: SettingValue>(&self, setting: &Setting<T>) -> Result<()> {
        self.set_raw(&setting.def, "")
    }

    /// Clear overrides and recompute every cell
    ///
    /// Overrides whose key starts with `mockserver` are removed unless they
    /// are blank or listed in `excludeFromPropertyReset`.
    pub fn reset_all(&self) {
        {
            let _guard = self.guard.write().unwrap_or_else(PoisonError::into_inner);

            let exclusions = &settings::EXCLUDE_FROM_PROPERTY_RESET;
            let excluded: HashSet<String> = self
                .current_value(&exclusions.def)
                .ok()
                .and_then(Vec::<String>::from_value)
                .unwrap_or_default()
                .into_iter()
                .collect();

            let before = self.overrides.len();
            self.overrides.retain(|key, value| {
                !(key.starts_with(PROPERTY_PREFIX) && !excluded.contains(key) && !is_blank(value))
            });
            debug!("Reset cleared {} overrides", before - self.overrides.len());

            for def in settings::ALL.iter().copied().filter(|def| def.is_cached()) {
                self.refresh(def);
            }
        }

        info!("Configuration reset to file, environment and default values");
        self.notify_listeners(ConfigChangeEvent::Reset);
    }

    /// Add a configuration change listener
    ///
    /// Listeners run after the change is visible, on the mutating thread.
    /// They may read, write or register further listeners.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(ConfigChangeEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners.push(Arc::new(listener));
    }

    /// Re-run validators over the values currently in effect
    pub fn check(&self) -> Vec<ConfigError> {
        settings::ALL
            .iter()
            .copied()
            .filter(|def| def.validator.is_some())
            .filter_map(|def| match self.raw_value(def) {
                Ok(resolved) if is_blank(&resolved.raw) => None,
                Ok(resolved) => validate(def, &resolved.raw, &self.locator).err(),
                Err(e) => Some(e),
            })
            .collect()
    }

    /// Copy of the override store
    pub fn overrides(&self) -> BTreeMap<String, String> {
        self.overrides.snapshot()
    }

    /// Property file the engine was built with, if one was found
    pub fn property_file(&self) -> Option<&Path> {
        self.property_file.as_deref()
    }

    pub fn resource_locator(&self) -> &ResourceLocator {
        &self.locator
    }

    pub fn runtime_facts(&self) -> &RuntimeFacts {
        &self.facts
    }

    /// Current log level as a Java logger level name
    pub fn java_logger_log_level(&self) -> &'static str {
        self.get(&settings::LOG_LEVEL).java_logger_level()
    }

    pub fn log_level(&self) -> LogLevel {
        self.get(&settings::LOG_LEVEL)
    }

    fn compute(&self, def: &SettingDef, previous: Option<&Value>) -> Result<Value> {
        let default = def.default_raw(&self.facts);
        let resolved = self.resolver.resolve(def.key, def.env, &default)?;
        Ok(parse_value(def, &resolved, &default, previous, self.diagnostics.as_ref()))
    }

    fn compute_or_default(&self, def: &SettingDef, previous: Option<&Value>) -> Value {
        self.compute(def, previous).unwrap_or_else(|e| {
            error!("Failed to resolve {}: {}", def.key, e);
            self.default_value(def)
        })
    }

    fn default_value(&self, def: &SettingDef) -> Value {
        let default = def.default_raw(&self.facts);
        parse_value(def, &default, &default, None, self.diagnostics.as_ref())
    }

    /// Recompute the cell of a cached setting from the current sources
    fn refresh(&self, def: &SettingDef) {
        if !def.is_cached() {
            return;
        }
        let previous = self.cells.load(def.key);
        let value = self.compute_or_default(def, previous.as_deref());
        self.cells.store(def.key, value);
    }

    fn notify_listeners(&self, event: ConfigChangeEvent) {
        // run outside the lock so listeners can register listeners
        let listeners: Vec<ConfigChangeListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("resolver", &self.resolver)
            .field("overrides", &self.overrides.len())
            .field("cells", &self.cells.len())
            .field("property_file", &self.property_file)
            .finish()
    }
}
