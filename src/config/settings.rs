//! Settings table
//!
//! Every setting is declared once here as a typed static handle. Keys are
//! `mockserver.<name>`; each setting also carries the environment variable
//! consulted when neither an override nor the property file supplies a value.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::marker::PhantomData;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::config::defaults::{self, DefaultValue, RuntimeFacts};
use crate::config::error::{ConfigError, Result};
use crate::config::resolver::is_blank;
use crate::config::types::{Endpoint, LogLevel, SettingValue, TrustManagerType, ValueKind};
use crate::config::validator::Validator;

use DefaultValue::{Computed, Literal};

/// How reads of a setting are served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Resolve through every source on each read
    Resolve,
    /// Serve from a cell refreshed by mutators and reset
    Cached,
}

/// Untyped description of a setting
#[derive(Debug, Clone, Copy)]
pub struct SettingDef {
    /// Accessor name, e.g. `maxExpectations`
    pub name: &'static str,
    /// Key used by overrides and the property file
    pub key: &'static str,
    /// Environment variable alias
    pub env: &'static str,
    pub default: DefaultValue,
    pub kind: ValueKind,
    pub policy: Policy,
    pub validator: Option<Validator>,
    /// Value is masked in reports
    pub sensitive: bool,
}

impl SettingDef {
    pub fn is_cached(&self) -> bool {
        self.policy == Policy::Cached
    }

    /// Raw default for this process
    pub fn default_raw(&self, facts: &RuntimeFacts) -> String {
        self.default.render(facts)
    }
}

/// Typed handle to a setting
///
/// The type parameter fixes what `ConfigManager::get` returns.
#[derive(Debug)]
pub struct Setting<T> {
    pub def: SettingDef,
    _type: PhantomData<fn() -> T>,
}

impl<T: SettingValue> Setting<T> {
    pub const fn new(
        name: &'static str,
        key: &'static str,
        env: &'static str,
        default: DefaultValue,
    ) -> Self {
        Self {
            def: SettingDef {
                name,
                key,
                env,
                default,
                kind: T::KIND,
                policy: Policy::Resolve,
                validator: None,
                sensitive: false,
            },
            _type: PhantomData,
        }
    }

    pub const fn cached(mut self) -> Self {
        self.def.policy = Policy::Cached;
        self
    }

    pub const fn validated(mut self, validator: Validator) -> Self {
        self.def.validator = Some(validator);
        self
    }

    pub const fn sensitive(mut self) -> Self {
        self.def.sensitive = true;
        self
    }

    /// Use a key without the `mockserver.` prefix
    pub const fn with_key(mut self, key: &'static str) -> Self {
        self.def.key = key;
        self
    }
}

macro_rules! settings {
    ($(
        $(#[$meta:meta])*
        $ident:ident: $ty:ty = ($name:literal, $env:literal, $default:expr) $(.$modifier:ident($($arg:expr),*))*;
    )*) => {
        $(
            $(#[$meta])*
            pub static $ident: Setting<$ty> =
                Setting::<$ty>::new($name, concat!("mockserver.", $name), $env, $default) $(.$modifier($($arg),*))*;
        )*

        /// Every setting, in declaration order
        pub static ALL: &[&SettingDef] = &[$(&$ident.def),*];
    };
}

settings! {
    // Logging

    /// Minimum level of log messages
    LOG_LEVEL: LogLevel = ("logLevel", "MOCKSERVER_LOG_LEVEL", Literal(defaults::LOG_LEVEL_STR))
        .cached()
        .validated(Validator::LogLevel);
    METRICS_ENABLED: bool = ("metricsEnabled", "MOCKSERVER_METRICS_ENABLED", Literal("false")).cached();
    DISABLE_SYSTEM_OUT: bool = ("disableSystemOut", "MOCKSERVER_DISABLE_SYSTEM_OUT", Literal("false")).cached();
    DISABLE_LOGGING: bool = ("disableLogging", "MOCKSERVER_DISABLE_LOGGING", Literal("false")).cached();
    /// Include the reason a request did not match in match failure logs
    DETAILED_MATCH_FAILURES: bool = ("detailedMatchFailures", "MOCKSERVER_DETAILED_MATCH_FAILURES", Literal("true")).cached();
    LAUNCH_UI_FOR_LOG_LEVEL_DEBUG: bool = ("launchUIForLogLevelDebug", "MOCKSERVER_LAUNCH_UI_FOR_LOG_LEVEL_DEBUG", Literal("false"));
    MATCHERS_FAIL_FAST: bool = ("matchersFailFast", "MOCKSERVER_MATCHERS_FAIL_FAST", Literal("true")).cached();

    // Memory usage

    /// Maximum expectations held in memory; defaults from the heap budget
    MAX_EXPECTATIONS: i32 = ("maxExpectations", "MOCKSERVER_MAX_EXPECTATIONS", Computed(defaults::max_expectations));
    /// Maximum log entries held in memory; defaults from the heap budget
    MAX_LOG_ENTRIES: i32 = ("maxLogEntries", "MOCKSERVER_MAX_LOG_ENTRIES", Computed(defaults::max_log_entries));
    MAX_WEB_SOCKET_EXPECTATIONS: i32 = ("maxWebSocketExpectations", "MOCKSERVER_MAX_WEB_SOCKET_EXPECTATIONS", Literal("1500"));
    OUTPUT_MEMORY_USAGE_CSV: bool = ("outputMemoryUsageCsv", "MOCKSERVER_OUTPUT_MEMORY_USAGE_CSV", Literal("false"));
    MEMORY_USAGE_CSV_DIRECTORY: String = ("memoryUsageCsvDirectory", "MOCKSERVER_MEMORY_USAGE_CSV_DIRECTORY", Literal("."))
        .validated(Validator::PathExists);

    // Non-blocking I/O and request decoding

    MAX_INITIAL_LINE_LENGTH: i32 = ("maxInitialLineLength", "MOCKSERVER_MAX_INITIAL_LINE_LENGTH", Literal(defaults::MAX_INT_STR)).cached();
    MAX_HEADER_SIZE: i32 = ("maxHeaderSize", "MOCKSERVER_MAX_HEADER_SIZE", Literal(defaults::MAX_INT_STR)).cached();
    MAX_CHUNK_SIZE: i32 = ("maxChunkSize", "MOCKSERVER_MAX_CHUNK_SIZE", Literal(defaults::MAX_INT_STR)).cached();
    NIO_EVENT_LOOP_THREAD_COUNT: i32 = ("nioEventLoopThreadCount", "MOCKSERVER_NIO_EVENT_LOOP_THREAD_COUNT", Literal(defaults::THREAD_COUNT_STR));
    CLIENT_NIO_EVENT_LOOP_THREAD_COUNT: i32 = ("clientNioEventLoopThreadCount", "MOCKSERVER_CLIENT_NIO_EVENT_LOOP_THREAD_COUNT", Literal(defaults::THREAD_COUNT_STR));
    /// Threads handling actions; at least one per available processor
    ACTION_HANDLER_THREAD_COUNT: i32 = ("actionHandlerThreadCount", "MOCKSERVER_ACTION_HANDLER_THREAD_COUNT", Computed(defaults::action_handler_thread_count));
    WEB_SOCKET_CLIENT_EVENT_LOOP_THREAD_COUNT: i32 = ("webSocketClientEventLoopThreadCount", "MOCKSERVER_WEB_SOCKET_CLIENT_EVENT_LOOP_THREAD_COUNT", Literal(defaults::THREAD_COUNT_STR));
    /// Milliseconds
    MAX_SOCKET_TIMEOUT: i64 = ("maxSocketTimeout", "MOCKSERVER_MAX_SOCKET_TIMEOUT", Literal("20000"));
    /// Milliseconds
    MAX_FUTURE_TIMEOUT: i64 = ("maxFutureTimeout", "MOCKSERVER_MAX_FUTURE_TIMEOUT", Literal("60000"));
    /// Milliseconds
    SOCKET_CONNECTION_TIMEOUT: i32 = ("socketConnectionTimeout", "MOCKSERVER_SOCKET_CONNECTION_TIMEOUT", Literal("20000"));
    ALWAYS_CLOSE_SOCKET_CONNECTIONS: bool = ("alwaysCloseSocketConnections", "MOCKSERVER_ALWAYS_CLOSE_SOCKET_CONNECTIONS", Literal("false")).cached();
    USE_SEMICOLON_AS_QUERY_PARAMETER_SEPARATOR: bool = ("useSemicolonAsQueryParameterSeparator", "MOCKSERVER_USE_SEMICOLON_AS_QUERY_PARAMETER_SEPARATOR", Literal("true")).cached();
    /// Local address outbound connections bind to; blank means any
    LOCAL_BOUND_IP: String = ("localBoundIP", "MOCKSERVER_LOCAL_BOUND_IP", Literal(""))
        .validated(Validator::IpAddress);

    // Proxying

    ATTEMPT_TO_PROXY_IF_NO_MATCHING_EXPECTATION: bool = ("attemptToProxyIfNoMatchingExpectation", "MOCKSERVER_ATTEMPT_TO_PROXY_IF_NO_MATCHING_EXPECTATION", Literal("true")).cached();
    FORWARD_HTTP_PROXY: Option<Endpoint> = ("forwardHttpProxy", "MOCKSERVER_FORWARD_HTTP_PROXY", Literal(""))
        .validated(Validator::HostPort);
    FORWARD_HTTPS_PROXY: Option<Endpoint> = ("forwardHttpsProxy", "MOCKSERVER_FORWARD_HTTPS_PROXY", Literal(""))
        .validated(Validator::HostPort);
    FORWARD_SOCKS_PROXY: Option<Endpoint> = ("forwardSocksProxy", "MOCKSERVER_FORWARD_SOCKS_PROXY", Literal(""))
        .validated(Validator::HostPort);
    FORWARD_PROXY_AUTHENTICATION_USERNAME: Option<String> = ("forwardProxyAuthenticationUsername", "MOCKSERVER_FORWARD_PROXY_AUTHENTICATION_USERNAME", Literal(""));
    FORWARD_PROXY_AUTHENTICATION_PASSWORD: Option<String> = ("forwardProxyAuthenticationPassword", "MOCKSERVER_FORWARD_PROXY_AUTHENTICATION_PASSWORD", Literal(""))
        .sensitive();
    PROXY_AUTHENTICATION_REALM: String = ("proxyAuthenticationRealm", "MOCKSERVER_PROXY_SERVER_REALM", Literal(defaults::PROXY_AUTHENTICATION_REALM));
    PROXY_AUTHENTICATION_USERNAME: String = ("proxyAuthenticationUsername", "MOCKSERVER_PROXY_AUTHENTICATION_USERNAME", Literal(""));
    PROXY_AUTHENTICATION_PASSWORD: String = ("proxyAuthenticationPassword", "MOCKSERVER_PROXY_AUTHENTICATION_PASSWORD", Literal(""))
        .sensitive();

    // TLS

    SSL_CERTIFICATE_DOMAIN_NAME: String = ("sslCertificateDomainName", "MOCKSERVER_SSL_CERTIFICATE_DOMAIN_NAME", Literal("localhost"));
    SSL_SUBJECT_ALTERNATIVE_NAME_DOMAINS: Vec<String> = ("sslSubjectAlternativeNameDomains", "MOCKSERVER_SSL_SUBJECT_ALTERNATIVE_NAME_DOMAINS", Literal("localhost"));
    SSL_SUBJECT_ALTERNATIVE_NAME_IPS: Vec<String> = ("sslSubjectAlternativeNameIps", "MOCKSERVER_SSL_SUBJECT_ALTERNATIVE_NAME_IPS", Literal("127.0.0.1,0.0.0.0"));
    PREVENT_CERTIFICATE_DYNAMIC_UPDATE: bool = ("preventCertificateDynamicUpdate", "MOCKSERVER_PREVENT_CERTIFICATE_DYNAMIC_UPDATE", Literal("false")).cached();
    PROACTIVELY_INITIALISE_TLS: bool = ("proactivelyInitialiseTLS", "MOCKSERVER_PROACTIVELY_INITIALISE_TLS", Literal("false"));
    CERTIFICATE_AUTHORITY_PRIVATE_KEY: String = ("certificateAuthorityPrivateKey", "MOCKSERVER_CERTIFICATE_AUTHORITY_PRIVATE_KEY", Literal(defaults::CERTIFICATE_AUTHORITY_PRIVATE_KEY))
        .validated(Validator::PathExists);
    CERTIFICATE_AUTHORITY_CERTIFICATE: String = ("certificateAuthorityCertificate", "MOCKSERVER_CERTIFICATE_AUTHORITY_X509_CERTIFICATE", Literal(defaults::CERTIFICATE_AUTHORITY_CERTIFICATE))
        .validated(Validator::PathExists);
    DYNAMICALLY_CREATE_CERTIFICATE_AUTHORITY_CERTIFICATE: bool = ("dynamicallyCreateCertificateAuthorityCertificate", "MOCKSERVER_DYNAMICALLY_CREATE_CERTIFICATE_AUTHORITY_CERTIFICATE", Literal("false"));
    DIRECTORY_TO_SAVE_DYNAMIC_SSL_CERTIFICATE: String = ("directoryToSaveDynamicSSLCertificate", "MOCKSERVER_CERTIFICATE_DIRECTORY_TO_SAVE_DYNAMIC_SSL_CERTIFICATE", Literal("."))
        .validated(Validator::PathExists);
    PRIVATE_KEY_PATH: String = ("privateKeyPath", "MOCKSERVER_TLS_PRIVATE_KEY_PATH", Literal(""))
        .validated(Validator::PathExists);
    X509_CERTIFICATE_PATH: String = ("x509CertificatePath", "MOCKSERVER_TLS_X509_CERTIFICATE_PATH", Literal(""))
        .validated(Validator::PathExists);
    TLS_MUTUAL_AUTHENTICATION_REQUIRED: bool = ("tlsMutualAuthenticationRequired", "MOCKSERVER_TLS_MUTUAL_AUTHENTICATION_REQUIRED", Literal("false")).cached();
    TLS_MUTUAL_AUTHENTICATION_CERTIFICATE_CHAIN: String = ("tlsMutualAuthenticationCertificateChain", "MOCKSERVER_TLS_MUTUAL_AUTHENTICATION_CERTIFICATE_CHAIN", Literal(""))
        .cached()
        .validated(Validator::PathExists);
    /// Which certificates are trusted when forwarding over TLS
    FORWARD_PROXY_TLS_X509_CERTIFICATES_TRUST_MANAGER_TYPE: TrustManagerType = ("forwardProxyTLSX509CertificatesTrustManagerType", "MOCKSERVER_FORWARD_PROXY_TLS_X509_CERTIFICATES_TRUST_MANAGER_TYPE", Literal("ANY"))
        .cached()
        .validated(Validator::TrustManager);
    FORWARD_PROXY_TLS_CUSTOM_TRUST_X509_CERTIFICATES: String = ("forwardProxyTLSCustomTrustX509Certificates", "MOCKSERVER_FORWARD_PROXY_TLS_CUSTOM_TRUST_X509_CERTIFICATES", Literal(""))
        .cached()
        .validated(Validator::PathExists);
    FORWARD_PROXY_PRIVATE_KEY: String = ("forwardProxyPrivateKey", "MOCKSERVER_FORWARD_PROXY_TLS_PRIVATE_KEY", Literal(""))
        .cached()
        .validated(Validator::PathExists);
    FORWARD_PROXY_CERTIFICATE_CHAIN: String = ("forwardProxyCertificateChain", "MOCKSERVER_FORWARD_PROXY_TLS_X509_CERTIFICATE_CHAIN", Literal(""))
        .cached()
        .validated(Validator::PathExists);

    // Control plane authentication

    CONTROL_PLANE_TLS_MUTUAL_AUTHENTICATION_REQUIRED: bool = ("controlPlaneTLSMutualAuthenticationRequired", "MOCKSERVER_CONTROL_PLANE_TLS_MUTUAL_AUTHENTICATION_REQUIRED", Literal("false")).cached();
    CONTROL_PLANE_TLS_MUTUAL_AUTHENTICATION_CA_CHAIN: String = ("controlPlaneTLSMutualAuthenticationCAChain", "MOCKSERVER_CONTROL_PLANE_TLS_MUTUAL_AUTHENTICATION_CERTIFICATE_CHAIN", Literal(""))
        .cached()
        .validated(Validator::PathExists);
    CONTROL_PLANE_PRIVATE_KEY_PATH: String = ("controlPlanePrivateKeyPath", "MOCKSERVER_CONTROL_PLANE_TLS_PRIVATE_KEY_PATH", Literal(""))
        .validated(Validator::PathExists);
    CONTROL_PLANE_X509_CERTIFICATE_PATH: String = ("controlPlaneX509CertificatePath", "MOCKSERVER_CONTROL_PLANE_TLS_X509_CERTIFICATE_PATH", Literal(""))
        .validated(Validator::PathExists);
    CONTROL_PLANE_JWT_AUTHENTICATION_REQUIRED: bool = ("controlPlaneJWTAuthenticationRequired", "MOCKSERVER_CONTROL_PLANE_JWT_AUTHENTICATION_REQUIRED", Literal("false")).cached();
    CONTROL_PLANE_JWT_AUTHENTICATION_JWK_SOURCE: String = ("controlPlaneJWTAuthenticationJWKSource", "MOCKSERVER_CONTROL_PLANE_JWT_AUTHENTICATION_JWK_SOURCE", Literal(""));
    CONTROL_PLANE_JWT_AUTHENTICATION_EXPECTED_AUDIENCE: String = ("controlPlaneJWTAuthenticationExpectedAudience", "MOCKSERVER_CONTROL_PLANE_JWT_AUTHENTICATION_EXPECTED_AUDIENCE", Literal(""));
    /// Claims a token must carry with exactly these values, as `claim=value` pairs
    CONTROL_PLANE_JWT_AUTHENTICATION_MATCHING_CLAIMS: BTreeMap<String, String> = ("controlPlaneJWTAuthenticationMatchingClaims", "MOCKSERVER_CONTROL_PLANE_JWT_AUTHENTICATION_MATCHING_CLAIMS", Literal(""));
    CONTROL_PLANE_JWT_AUTHENTICATION_REQUIRED_CLAIMS: Vec<String> = ("controlPlaneJWTAuthenticationRequiredClaims", "MOCKSERVER_CONTROL_PLANE_JWT_AUTHENTICATION_REQUIRED_CLAIMS", Literal(""));

    // Initialization and persistence

    INITIALIZATION_CLASS: String = ("initializationClass", "MOCKSERVER_INITIALIZATION_CLASS", Literal(""));
    INITIALIZATION_JSON_PATH: String = ("initializationJsonPath", "MOCKSERVER_INITIALIZATION_JSON_PATH", Literal(""));
    WATCH_INITIALIZATION_JSON: bool = ("watchInitializationJson", "MOCKSERVER_WATCH_INITIALIZATION_JSON", Literal("false"));
    PERSIST_EXPECTATIONS: bool = ("persistExpectations", "MOCKSERVER_PERSIST_EXPECTATIONS", Literal("false"));
    PERSISTED_EXPECTATIONS_PATH: String = ("persistedExpectationsPath", "MOCKSERVER_PERSISTED_EXPECTATIONS_PATH", Literal(defaults::PERSISTED_EXPECTATIONS_PATH));

    // Verification

    MAXIMUM_NUMBER_OF_REQUEST_TO_RETURN_IN_VERIFICATION_FAILURE: i32 = ("maximumNumberOfRequestToReturnInVerificationFailure", "MOCKSERVER_MAXIMUM_NUMBER_OF_REQUESTS_TO_RETURN_IN_VERIFICATION_FAILURE", Literal("10"));

    // CORS

    ENABLE_CORS_FOR_API: bool = ("enableCORSForAPI", "MOCKSERVER_ENABLE_CORS_FOR_API", Literal("false")).cached();
    ENABLE_CORS_FOR_ALL_RESPONSES: bool = ("enableCORSForAllResponses", "MOCKSERVER_ENABLE_CORS_FOR_ALL_RESPONSES", Literal("false")).cached();
    CORS_ALLOW_HEADERS: String = ("corsAllowHeaders", "MOCKSERVER_CORS_ALLOW_HEADERS", Literal(defaults::CORS_ALLOW_HEADERS));
    CORS_ALLOW_METHODS: String = ("corsAllowMethods", "MOCKSERVER_CORS_ALLOW_METHODS", Literal(defaults::CORS_ALLOW_METHODS));
    CORS_ALLOW_CREDENTIALS: bool = ("corsAllowCredentials", "MOCKSERVER_CORS_ALLOW_CREDENTIALS", Literal("true"));
    CORS_MAX_AGE_IN_SECONDS: i32 = ("corsMaxAgeInSeconds", "MOCKSERVER_CORS_MAX_AGE_IN_SECONDS", Literal("300"));

    // Liveness

    LIVENESS_HTTP_GET_PATH: String = ("livenessHttpGetPath", "MOCKSERVER_LIVENESS_HTTP_GET_PATH", Literal("")).cached();

    // Engine

    /// Property file read once when the engine is built
    PROPERTY_FILE: String = ("propertyFile", "MOCKSERVER_PROPERTY_FILE", Literal(defaults::DEFAULT_PROPERTY_FILE));
    /// Override keys left alone by `reset_all`
    EXCLUDE_FROM_PROPERTY_RESET: Vec<String> = ("excludeFromPropertyReset", "MOCKSERVER_EXCLUDE_FROM_PROPERTY_RESET", Literal(""))
        .with_key("excludeFromPropertyReset");
}

static INDEX: Lazy<HashMap<&'static str, &'static SettingDef>> = Lazy::new(|| {
    let mut index = HashMap::with_capacity(ALL.len() * 3);
    for def in ALL.iter().copied() {
        index.insert(def.env, def);
        index.insert(def.name, def);
        index.insert(def.key, def);
    }
    index
});

/// Look up a setting by accessor name, key or environment alias
pub fn find(name: &str) -> Option<&'static SettingDef> {
    INDEX.get(name.trim()).copied()
}

/// Like `find`, failing with `UnknownSetting`
pub fn require(name: &str) -> Result<&'static SettingDef> {
    find(name).ok_or_else(|| ConfigError::UnknownSetting(name.to_string()))
}

/// Check that every definition has a key and alias and that keys are unique
pub fn validate_table(defs: &[&SettingDef]) -> Result<()> {
    let mut seen = HashSet::with_capacity(defs.len());
    for def in defs {
        if is_blank(def.key) || is_blank(def.name) {
            return Err(ConfigError::InvalidConfiguration {
                key: def.key.to_string(),
                reason: "setting name and key cannot be blank".to_string(),
            });
        }
        if is_blank(def.env) {
            return Err(ConfigError::InvalidConfiguration {
                key: def.key.to_string(),
                reason: "environment property name cannot be blank".to_string(),
            });
        }
        if !seen.insert(def.key) {
            return Err(ConfigError::InvalidConfiguration {
                key: def.key.to_string(),
                reason: "setting key is declared more than once".to_string(),
            });
        }
    }
    Ok(())
}
