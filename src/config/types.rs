//! Configuration value types
//!
//! Typed values produced by parsing resolved strings, the enums that some
//! settings are restricted to, and the `SettingValue` trait that ties a Rust
//! type to its value kind.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::LevelFilter;
use serde::{Serialize, Serializer};

use crate::config::error::ConfigError;

/// Source of a resolved value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Runtime override written by a mutator
    Override,
    /// Loaded property file
    File,
    /// Process environment variable
    Environment,
    /// Additional source registered on the builder
    External,
    /// Hard-coded default
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Override => write!(f, "override"),
            ValueSource::File => write!(f, "file"),
            ValueSource::Environment => write!(f, "environment"),
            ValueSource::External => write!(f, "external"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// Kind of value a setting parses to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Long,
    Text,
    OptionalText,
    List,
    Endpoint,
    Map,
    TrustManager,
    LogLevel,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "boolean",
            ValueKind::Int => "integer",
            ValueKind::Long => "long",
            ValueKind::Text => "string",
            ValueKind::OptionalText => "optional string",
            ValueKind::List => "comma separated list",
            ValueKind::Endpoint => "<host>:<port>",
            ValueKind::Map => "comma separated key=value pairs",
            ValueKind::TrustManager => "trust manager type",
            ValueKind::LogLevel => "log level",
        };
        f.write_str(name)
    }
}

/// Host and port pair, as used by the forward proxy settings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // IPv6 literals are bracketed so the port stays unambiguous
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Trust manager used when forwarding TLS requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrustManagerType {
    /// Trust any certificate
    #[default]
    Any,
    /// Trust the platform trust store
    Jvm,
    /// Trust the configured custom certificates
    Custom,
}

impl TrustManagerType {
    /// All accepted names
    pub const NAMES: [&'static str; 3] = ["ANY", "JVM", "CUSTOM"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::Jvm => "JVM",
            Self::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for TrustManagerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustManagerType {
    type Err = ConfigError;

    /// Names are matched exactly
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ANY" => Ok(Self::Any),
            "JVM" => Ok(Self::Jvm),
            "CUSTOM" => Ok(Self::Custom),
            _ => Err(ConfigError::InvalidValue {
                key: "forwardProxyTLSX509CertificatesTrustManagerType".to_string(),
                msg: format!(
                    "\"{}\" the only supported values are: {}",
                    s,
                    Self::NAMES.join(", ")
                ),
            }),
        }
    }
}

/// Log level
///
/// Accepts both the standard names and the Java logger names
/// (`FINEST`, `FINE`, `WARNING`, `SEVERE`), case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Off => "OFF",
        }
    }

    /// Equivalent Java logger level name
    pub fn java_logger_level(&self) -> &'static str {
        match self {
            Self::Trace => "FINEST",
            Self::Debug => "FINE",
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "SEVERE",
            Self::Off => "OFF",
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Self::Trace => LevelFilter::Trace,
            Self::Debug => LevelFilter::Debug,
            Self::Info => LevelFilter::Info,
            Self::Warn => LevelFilter::Warn,
            Self::Error => LevelFilter::Error,
            Self::Off => LevelFilter::Off,
        }
    }

    /// Filter string understood by `env_logger`
    pub fn filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" | "FINEST" => Ok(Self::Trace),
            "DEBUG" | "FINE" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" | "SEVERE" => Ok(Self::Error),
            "OFF" => Ok(Self::Off),
            _ => Err(ConfigError::InvalidValue {
                key: "logLevel".to_string(),
                msg: format!(
                    "\"{}\" is not a valid log level, expected one of TRACE, DEBUG, INFO, WARN, ERROR, OFF, FINEST, FINE, WARNING, SEVERE",
                    s
                ),
            }),
        }
    }
}

/// A parsed configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Text(String),
    OptionalText(Option<String>),
    List(Vec<String>),
    Endpoint(Option<Endpoint>),
    Map(BTreeMap<String, String>),
    TrustManager(TrustManagerType),
    LogLevel(LogLevel),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Text(_) => ValueKind::Text,
            Value::OptionalText(_) => ValueKind::OptionalText,
            Value::List(_) => ValueKind::List,
            Value::Endpoint(_) => ValueKind::Endpoint,
            Value::Map(_) => ValueKind::Map,
            Value::TrustManager(_) => ValueKind::TrustManager,
            Value::LogLevel(_) => ValueKind::LogLevel,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::OptionalText(v) => f.write_str(v.as_deref().unwrap_or("")),
            Value::List(v) => f.write_str(&v.join(",")),
            Value::Endpoint(Some(v)) => write!(f, "{}", v),
            Value::Endpoint(None) => Ok(()),
            Value::Map(v) => f.write_str(&join_map(v)),
            Value::TrustManager(v) => write!(f, "{}", v),
            Value::LogLevel(v) => write!(f, "{}", v),
        }
    }
}

fn join_map(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Rust type a setting resolves to
///
/// `to_raw` produces the string form written to the override store, which
/// parses back to an equal value.
pub trait SettingValue: Sized + Default {
    const KIND: ValueKind;

    fn from_value(value: Value) -> Option<Self>;

    fn to_raw(&self) -> String;
}

impl SettingValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for i64 {
    const KIND: ValueKind = ValueKind::Long;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.clone()
    }
}

impl SettingValue for Option<String> {
    const KIND: ValueKind = ValueKind::OptionalText;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::OptionalText(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.clone().unwrap_or_default()
    }
}

impl SettingValue for Vec<String> {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.join(",")
    }
}

impl SettingValue for Option<Endpoint> {
    const KIND: ValueKind = ValueKind::Endpoint;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Endpoint(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.as_ref().map(Endpoint::to_string).unwrap_or_default()
    }
}

impl SettingValue for BTreeMap<String, String> {
    const KIND: ValueKind = ValueKind::Map;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        join_map(self)
    }
}

impl SettingValue for TrustManagerType {
    const KIND: ValueKind = ValueKind::TrustManager;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::TrustManager(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.as_str().to_string()
    }
}

impl SettingValue for LogLevel {
    const KIND: ValueKind = ValueKind::LogLevel;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::LogLevel(v) => Some(v),
            _ => None,
        }
    }

    fn to_raw(&self) -> String {
        self.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("WARNING").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("finest").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("Severe").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("OFF").unwrap(), LogLevel::Off);
        assert!(LogLevel::from_str("LOUD").is_err());
    }

    #[test]
    fn test_java_logger_level() {
        assert_eq!(LogLevel::Trace.java_logger_level(), "FINEST");
        assert_eq!(LogLevel::Debug.java_logger_level(), "FINE");
        assert_eq!(LogLevel::Info.java_logger_level(), "INFO");
        assert_eq!(LogLevel::Warn.java_logger_level(), "WARNING");
        assert_eq!(LogLevel::Error.java_logger_level(), "SEVERE");
        assert_eq!(LogLevel::Off.java_logger_level(), "OFF");
    }

    #[test]
    fn test_trust_manager_is_case_sensitive() {
        assert_eq!(TrustManagerType::from_str("JVM").unwrap(), TrustManagerType::Jvm);
        assert!(TrustManagerType::from_str("jvm").is_err());
        assert!(TrustManagerType::from_str("BOGUS").is_err());
        assert_eq!(TrustManagerType::default(), TrustManagerType::Any);
    }

    #[test]
    fn test_value_display_and_json() {
        let endpoint = Value::Endpoint(Some(Endpoint::new("proxy.local", 3128)));
        assert_eq!(endpoint.to_string(), "proxy.local:3128");
        assert_eq!(serde_json::to_string(&endpoint).unwrap(), "\"proxy.local:3128\"");

        let list = Value::List(vec!["localhost".to_string(), "mock.local".to_string()]);
        assert_eq!(list.to_string(), "localhost,mock.local");

        let level = Value::LogLevel(LogLevel::Warn);
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"WARN\"");

        let none = Value::OptionalText(None);
        assert_eq!(none.to_string(), "");
        assert_eq!(serde_json::to_string(&none).unwrap(), "null");
    }

    #[test]
    fn test_map_to_raw() {
        let mut claims = BTreeMap::new();
        claims.insert("scope".to_string(), "internal".to_string());
        claims.insert("aud".to_string(), "mock".to_string());
        assert_eq!(claims.to_raw(), "aud=mock,scope=internal");
    }
}
