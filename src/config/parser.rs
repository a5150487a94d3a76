//! Typed parsers
//!
//! Turns resolved strings into typed values. Parsing never fails: a value
//! that does not parse is reported to the diagnostics sink and replaced by a
//! fallback.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::diagnostics::{Diagnostics, ParseFailure};
use crate::config::resolver::is_blank;
use crate::config::settings::SettingDef;
use crate::config::types::{Endpoint, LogLevel, TrustManagerType, Value, ValueKind};

/// Parse `raw` as the kind of `def`
///
/// `default` is the setting's raw default, used when a number does not
/// parse. `previous` is the value currently held for the setting; enum
/// settings keep it when `raw` is not a valid name.
pub fn parse_value(
    def: &SettingDef,
    raw: &str,
    default: &str,
    previous: Option<&Value>,
    diagnostics: &dyn Diagnostics,
) -> Value {
    let report = |reason: String| {
        diagnostics.parse_failure(&ParseFailure {
            key: def.key,
            raw: raw.to_string(),
            expected: def.kind,
            reason,
        })
    };

    match def.kind {
        ValueKind::Bool => Value::Bool(parse_bool(raw)),
        ValueKind::Int => Value::Int(parse_number(raw, default, report)),
        ValueKind::Long => Value::Long(parse_number(raw, default, report)),
        ValueKind::Text => Value::Text(raw.to_string()),
        ValueKind::OptionalText => Value::OptionalText(if is_blank(raw) {
            None
        } else {
            Some(raw.to_string())
        }),
        ValueKind::List => Value::List(parse_list(raw)),
        ValueKind::Endpoint => Value::Endpoint(match parse_endpoint(raw) {
            Ok(endpoint) => endpoint,
            Err(reason) => {
                report(reason);
                None
            }
        }),
        ValueKind::Map => Value::Map(parse_map(raw).unwrap_or_else(|reason| {
            report(reason);
            BTreeMap::new()
        })),
        ValueKind::TrustManager => match TrustManagerType::from_str(raw) {
            Ok(trust) => Value::TrustManager(trust),
            Err(e) => {
                report(e.to_string());
                keep_previous(previous, ValueKind::TrustManager)
                    .unwrap_or(Value::TrustManager(TrustManagerType::default()))
            }
        },
        ValueKind::LogLevel => match LogLevel::from_str(raw) {
            Ok(level) => Value::LogLevel(level),
            Err(e) => {
                report(e.to_string());
                keep_previous(previous, ValueKind::LogLevel)
                    .unwrap_or(Value::LogLevel(LogLevel::default()))
            }
        },
    }
}

fn keep_previous(previous: Option<&Value>, kind: ValueKind) -> Option<Value> {
    previous.filter(|value| value.kind() == kind).cloned()
}

/// Case-insensitive `true`; anything else is false
pub fn parse_bool(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn parse_number<T, F>(raw: &str, default: &str, report: F) -> T
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
    F: Fn(String),
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(e) => {
            report(e.to_string());
            default.trim().parse::<T>().unwrap_or_default()
        }
    }
}

/// Comma separated entries, trimmed, empty entries dropped
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// `<host>:<port>`, with IPv6 hosts in brackets; blank is `Ok(None)`
pub fn parse_endpoint(raw: &str) -> Result<Option<Endpoint>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let Some((host, port)) = raw.rsplit_once(':') else {
        return Err("expected \"<host>:<port>\"".to_string());
    };
    let host = match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        Some(inner) if inner.contains(':') => inner,
        Some(_) => return Err(format!("unexpected brackets around host \"{}\"", host)),
        None if host.contains(':') => {
            return Err(format!("IPv6 host \"{}\" must be enclosed in brackets", host))
        }
        None => host,
    };
    if host.is_empty() || host.contains('@') {
        return Err(format!("invalid host \"{}\"", host));
    }

    port.parse::<u16>()
        .map(|port| Some(Endpoint::new(host, port)))
        .map_err(|e| format!("invalid port \"{}\": {}", port, e))
}

/// `k1=v1,k2=v2`; blank is an empty map
pub fn parse_map(raw: &str) -> Result<BTreeMap<String, String>, String> {
    let mut map = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => return Err(format!("entry \"{}\" is not of the form key=value", entry)),
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::diagnostics::MockDiagnostics;
    use crate::config::settings;

    fn silent() -> MockDiagnostics {
        let mut diagnostics = MockDiagnostics::new();
        diagnostics.expect_parse_failure().never();
        diagnostics
    }

    fn expecting_failure(key: &'static str) -> MockDiagnostics {
        let mut diagnostics = MockDiagnostics::new();
        diagnostics
            .expect_parse_failure()
            .withf(move |failure| failure.key == key)
            .times(1)
            .return_const(());
        diagnostics
    }

    #[test]
    fn test_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" True "));
        assert!(!parse_bool("yes"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_integer_fallback_reports_failure() {
        let def = &settings::MAX_WEB_SOCKET_EXPECTATIONS.def;
        let diagnostics = expecting_failure(def.key);
        assert_eq!(parse_value(def, "abc", "1500", None, &diagnostics), Value::Int(1500));

        let diagnostics = silent();
        assert_eq!(parse_value(def, " 42 ", "1500", None, &diagnostics), Value::Int(42));
    }

    #[test]
    fn test_long() {
        let def = &settings::MAX_SOCKET_TIMEOUT.def;
        let diagnostics = silent();
        assert_eq!(parse_value(def, "120000", "20000", None, &diagnostics), Value::Long(120_000));

        let diagnostics = expecting_failure(def.key);
        assert_eq!(parse_value(def, "2m", "20000", None, &diagnostics), Value::Long(20_000));
    }

    #[test]
    fn test_list() {
        assert_eq!(parse_list("a, b,,c ,"), vec!["a", "b", "c"]);
        assert!(parse_list("  ").is_empty());
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(parse_endpoint("proxy:3128").unwrap(), Some(Endpoint::new("proxy", 3128)));
        assert_eq!(parse_endpoint("").unwrap(), None);
        assert!(parse_endpoint("proxy").is_err());
        assert!(parse_endpoint("proxy:port").is_err());
        assert!(parse_endpoint("a:1:2").is_err());
        assert!(parse_endpoint(":3128").is_err());
        assert!(parse_endpoint("user@proxy:3128").is_err());
        assert!(parse_endpoint("::1:8080").is_err());
        assert_eq!(parse_endpoint("[::1]:8080").unwrap(), Some(Endpoint::new("::1", 8080)));
        assert_eq!(Endpoint::new("::1", 8080).to_string(), "[::1]:8080");

        let def = &settings::FORWARD_HTTP_PROXY.def;
        let diagnostics = expecting_failure(def.key);
        assert_eq!(parse_value(def, "no-port", "", None, &diagnostics), Value::Endpoint(None));
    }

    #[test]
    fn test_map() {
        let map = parse_map("scope=internal, aud = mock").unwrap();
        assert_eq!(map.get("scope").map(String::as_str), Some("internal"));
        assert_eq!(map.get("aud").map(String::as_str), Some("mock"));
        assert!(parse_map("").unwrap().is_empty());
        assert!(parse_map("scope").is_err());
        assert!(parse_map("=value").is_err());

        let def = &settings::CONTROL_PLANE_JWT_AUTHENTICATION_MATCHING_CLAIMS.def;
        let diagnostics = expecting_failure(def.key);
        assert_eq!(parse_value(def, "a=1,broken", "", None, &diagnostics), Value::Map(BTreeMap::new()));
    }

    #[test]
    fn test_enum_keeps_previous_value() {
        let def = &settings::FORWARD_PROXY_TLS_X509_CERTIFICATES_TRUST_MANAGER_TYPE.def;
        let previous = Value::TrustManager(TrustManagerType::Custom);

        let diagnostics = expecting_failure(def.key);
        assert_eq!(
            parse_value(def, "BOGUS", "ANY", Some(&previous), &diagnostics),
            previous
        );

        let diagnostics = expecting_failure(def.key);
        assert_eq!(
            parse_value(def, "BOGUS", "ANY", None, &diagnostics),
            Value::TrustManager(TrustManagerType::Any)
        );

        let level = &settings::LOG_LEVEL.def;
        let diagnostics = silent();
        assert_eq!(
            parse_value(level, "warning", "INFO", None, &diagnostics),
            Value::LogLevel(LogLevel::Warn)
        );
    }

    #[test]
    fn test_optional_text() {
        let def = &settings::FORWARD_PROXY_AUTHENTICATION_USERNAME.def;
        let diagnostics = silent();
        assert_eq!(parse_value(def, " ", "", None, &diagnostics), Value::OptionalText(None));
        assert_eq!(
            parse_value(def, "admin", "", None, &diagnostics),
            Value::OptionalText(Some("admin".to_string()))
        );
    }
}
