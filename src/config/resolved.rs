//! Resolved configuration report
//!
//! Flattens the engine's current state into a serializable list, one entry
//! per setting, naming where each value came from.

use log::warn;
use serde::Serialize;

use crate::config::defaults::MASK;
use crate::config::manager::ConfigManager;
use crate::config::settings::{self, Policy, SettingDef};
use crate::config::types::{Value, ValueKind, ValueSource};

/// One setting as currently in effect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSetting {
    pub name: &'static str,
    pub key: &'static str,
    pub env: &'static str,
    pub kind: ValueKind,
    pub value: Value,
    pub source: ValueSource,
    pub policy: Policy,
}

impl ResolvedSetting {
    pub fn is_cached(&self) -> bool {
        self.policy == Policy::Cached
    }
}

impl ConfigManager {
    /// Resolve every setting into a report
    ///
    /// Sensitive values are masked unless blank.
    pub fn resolved(&self) -> Vec<ResolvedSetting> {
        settings::ALL
            .iter()
            .copied()
            .filter_map(|def| match self.resolve_setting(def) {
                Ok(setting) => Some(setting),
                Err(e) => {
                    warn!("Skipping {} in resolved configuration: {}", def.key, e);
                    None
                }
            })
            .collect()
    }

    /// Report entry for a single setting
    pub fn resolve_setting(&self, def: &'static SettingDef) -> crate::config::Result<ResolvedSetting> {
        let (raw, value) = self.read_consistent(def)?;
        let source = raw.source;
        let value = if def.sensitive && !value.to_string().trim().is_empty() {
            Value::Text(MASK.to_string())
        } else {
            value
        };

        Ok(ResolvedSetting {
            name: def.name,
            key: def.key,
            env: def.env,
            kind: def.kind,
            value,
            source,
            policy: def.policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builder::ConfigBuilder;
    use crate::config::settings::{LOG_LEVEL, MAX_EXPECTATIONS, PROXY_AUTHENTICATION_PASSWORD};
    use crate::config::types::LogLevel;

    #[test]
    fn test_resolved_report() {
        let config = ConfigBuilder::new()
            .with_env_vars([("MOCKSERVER_LOG_LEVEL", "DEBUG")])
            .with_property_file("missing.properties")
            .with_override("mockserver.maxExpectations", "100")
            .build()
            .unwrap();
        config.set(&PROXY_AUTHENTICATION_PASSWORD, "secret".to_string()).unwrap();

        let report = config.resolved();
        assert_eq!(report.len(), settings::ALL.len());

        let level = report.iter().find(|s| s.key == LOG_LEVEL.def.key).unwrap();
        assert_eq!(level.value, Value::LogLevel(LogLevel::Debug));
        assert_eq!(level.source, ValueSource::Environment);
        assert!(level.is_cached());

        let max = report.iter().find(|s| s.key == MAX_EXPECTATIONS.def.key).unwrap();
        assert_eq!(max.value, Value::Int(100));
        assert_eq!(max.source, ValueSource::Override);

        let password = report.iter().find(|s| s.key == PROXY_AUTHENTICATION_PASSWORD.def.key).unwrap();
        assert_eq!(password.value, Value::Text(MASK.to_string()));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json[0]["name"], "logLevel");
        assert_eq!(json[0]["value"], "DEBUG");
        assert_eq!(json[0]["source"], "environment");
        assert_eq!(json[0]["policy"], "cached");
    }
}
