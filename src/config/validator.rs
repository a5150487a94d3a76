//! Mutator validation
//!
//! Validators run when a value is written, never when it is read. A failed
//! validation leaves the override store untouched.

use std::net::IpAddr;

use log::debug;
use url::Url;

use crate::common::ResourceLocator;
use crate::config::error::{ConfigError, Result};
use crate::config::parser::parse_endpoint;
use crate::config::settings::SettingDef;
use crate::config::types::{LogLevel, TrustManagerType};

/// Check applied to values passed to a mutator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Value names a readable resource or file system path
    PathExists,
    /// Value is a `<host>:<port>` address
    HostPort,
    /// Value is one of the trust manager names
    TrustManager,
    /// Value is a log level name
    LogLevel,
    /// Value is an IPv4 or IPv6 literal
    IpAddress,
}

/// Validate `raw` for `def`, returning the string to store
///
/// `raw` must be non-blank; blank input clears the override instead.
pub fn validate(def: &SettingDef, raw: &str, locator: &ResourceLocator) -> Result<String> {
    let Some(validator) = def.validator else {
        return Ok(raw.to_string());
    };

    debug!("Validating {} with {:?}", def.key, validator);

    match validator {
        Validator::PathExists => {
            if locator.exists(raw) {
                Ok(raw.to_string())
            } else {
                Err(ConfigError::FileNotFound {
                    key: def.name.to_string(),
                    path: raw.to_string(),
                })
            }
        }
        Validator::HostPort => normalize_host_port(raw).ok_or_else(|| ConfigError::InvalidEndpoint {
            key: def.name.to_string(),
            value: raw.to_string(),
        }),
        Validator::TrustManager => raw
            .parse::<TrustManagerType>()
            .map(|_| raw.to_string())
            .map_err(|e| rekey(e, def)),
        Validator::LogLevel => raw
            .parse::<LogLevel>()
            .map(|_| raw.to_string())
            .map_err(|e| rekey(e, def)),
        Validator::IpAddress => raw
            .trim()
            .parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|e| ConfigError::InvalidValue {
                key: def.name.to_string(),
                msg: format!("\"{}\" is not a valid IP address: {}", raw, e),
            }),
    }
}

/// Host and explicit port, checked as the authority of a `tcp://` URL
pub fn is_host_port(value: &str) -> bool {
    normalize_host_port(value).is_some()
}

/// `<host>:<port>` rebuilt from the parsed authority, without user info
///
/// The result always reads back through `parse_endpoint` as the same host
/// and port.
pub fn normalize_host_port(value: &str) -> Option<String> {
    let url = Url::parse(&format!("tcp://{}", value.trim())).ok()?;
    if !url.path().is_empty() || url.query().is_some() || url.fragment().is_some() {
        return None;
    }
    let host = url.host_str().filter(|host| !host.is_empty())?;
    let normalized = format!("{}:{}", host, url.port()?);
    match parse_endpoint(&normalized) {
        Ok(Some(_)) => Some(normalized),
        _ => None,
    }
}

fn rekey(error: ConfigError, def: &SettingDef) -> ConfigError {
    match error {
        ConfigError::InvalidValue { msg, .. } => ConfigError::InvalidValue {
            key: def.name.to_string(),
            msg,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_host_port() {
        assert!(is_host_port("localhost:1080"));
        assert!(is_host_port("127.0.0.1:3128"));
        assert!(is_host_port("[::1]:8080"));
        assert!(!is_host_port("localhost"));
        assert!(!is_host_port("localhost:"));
        assert!(!is_host_port(":1080"));
        assert!(!is_host_port("localhost:99999"));
        assert!(!is_host_port("localhost:80/path"));
    }

    #[test]
    fn test_host_port_is_normalised() {
        let locator = ResourceLocator::default();
        let def = &settings::FORWARD_HTTP_PROXY.def;
        assert_eq!(validate(def, "[::1]:8080", &locator).unwrap(), "[::1]:8080");
        assert_eq!(validate(def, "user@proxy:3128", &locator).unwrap(), "proxy:3128");
        assert_eq!(validate(def, " proxy:3128 ", &locator).unwrap(), "proxy:3128");
        assert!(validate(def, "proxy", &locator).is_err());
    }

    #[test]
    fn test_path_exists() {
        let locator = ResourceLocator::default();
        let err = validate(&settings::X509_CERTIFICATE_PATH.def, "/non/existent/cert.pem", &locator).unwrap_err();
        assert_eq!(
            err,
            ConfigError::FileNotFound {
                key: "x509CertificatePath".to_string(),
                path: "/non/existent/cert.pem".to_string(),
            }
        );

        let dir = tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        fs::write(&cert, "pem").unwrap();
        let location = cert.to_str().unwrap();
        assert_eq!(
            validate(&settings::X509_CERTIFICATE_PATH.def, location, &locator).unwrap(),
            location
        );
    }

    #[test]
    fn test_enum_validators() {
        let locator = ResourceLocator::default();
        let trust = &settings::FORWARD_PROXY_TLS_X509_CERTIFICATES_TRUST_MANAGER_TYPE.def;
        assert_eq!(validate(trust, "JVM", &locator).unwrap(), "JVM");
        match validate(trust, "BOGUS", &locator) {
            Err(ConfigError::InvalidValue { key, msg }) => {
                assert_eq!(key, "forwardProxyTLSX509CertificatesTrustManagerType");
                assert!(msg.contains("ANY, JVM, CUSTOM"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(validate(&settings::LOG_LEVEL.def, "fine", &locator).unwrap(), "fine");
        assert!(validate(&settings::LOG_LEVEL.def, "CHATTY", &locator).is_err());
    }

    #[test]
    fn test_ip_address_is_normalised() {
        let locator = ResourceLocator::default();
        let def = &settings::LOCAL_BOUND_IP.def;
        assert_eq!(validate(def, "0:0:0:0:0:0:0:1", &locator).unwrap(), "::1");
        assert_eq!(validate(def, " 10.0.0.1 ", &locator).unwrap(), "10.0.0.1");
        assert!(validate(def, "not-an-ip", &locator).is_err());
    }

    #[test]
    fn test_unvalidated_setting_passes_through() {
        let locator = ResourceLocator::default();
        assert_eq!(validate(&settings::MAX_EXPECTATIONS.def, "abc", &locator).unwrap(), "abc");
    }
}
