//! Default configuration values
//!
//! This module is the single source of truth for defaults. Most defaults are
//! string literals parsed like any other resolved value; a few are computed
//! from facts about the running process.

/// Prefix carried by every setting key, and by every override cleared on reset
pub const PROPERTY_PREFIX: &str = "mockserver";

/// Property file read when nothing else is configured
pub const DEFAULT_PROPERTY_FILE: &str = "mockserver.properties";

/// Property file location used by the container image
///
/// When an override names this location, a non-blank environment value wins.
pub const CONTAINER_PROPERTY_FILE: &str = "/config/mockserver.properties";

/// Heap budget assumed when the builder is not told otherwise
pub const DEFAULT_HEAP_BYTES: u64 = 1024 * 1024 * 1024;

const MAX_EXPECTATIONS_CEILING: u64 = 5_000;
const MAX_LOG_ENTRIES_CEILING: u64 = 60_000;
const BYTES_PER_EXPECTATION: u64 = 100 * 1024;
const BYTES_PER_LOG_ENTRY: u64 = 8 * 1024;
const MIN_ACTION_HANDLER_THREADS: usize = 5;

/// Shown in place of sensitive values in reports and logs
pub const MASK: &str = "********";

// Literal defaults

pub const LOG_LEVEL_STR: &str = "INFO";
pub const MAX_INT_STR: &str = "2147483647";
pub const THREAD_COUNT_STR: &str = "5";
pub const CERTIFICATE_AUTHORITY_PRIVATE_KEY: &str = "org/mockserver/socket/PKCS8CertificateAuthorityPrivateKey.pem";
pub const CERTIFICATE_AUTHORITY_CERTIFICATE: &str = "org/mockserver/socket/CertificateAuthorityCertificate.pem";
pub const CORS_ALLOW_HEADERS: &str = "Allow, Content-Encoding, Content-Length, Content-Type, ETag, Expires, Last-Modified, Location, Server, Vary, Authorization";
pub const CORS_ALLOW_METHODS: &str = "CONNECT, DELETE, GET, HEAD, OPTIONS, POST, PUT, PATCH, TRACE";
pub const PROXY_AUTHENTICATION_REALM: &str = "MockServer HTTP Proxy";
pub const PERSISTED_EXPECTATIONS_PATH: &str = "persistedExpectations.json";

/// In-memory limits derived from the heap budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimits {
    pub max_expectations: i32,
    pub max_log_entries: i32,
}

impl MemoryLimits {
    /// Split half of `heap_bytes` between expectations and log entries
    pub fn from_heap_bytes(heap_bytes: u64) -> Self {
        let budget = heap_bytes / 2;
        Self {
            max_expectations: (budget / BYTES_PER_EXPECTATION).min(MAX_EXPECTATIONS_CEILING) as i32,
            max_log_entries: (budget / BYTES_PER_LOG_ENTRY).min(MAX_LOG_ENTRIES_CEILING) as i32,
        }
    }
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self::from_heap_bytes(DEFAULT_HEAP_BYTES)
    }
}

/// Facts about the process that computed defaults depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeFacts {
    pub memory: MemoryLimits,
    pub available_processors: usize,
}

impl RuntimeFacts {
    /// Capture facts from the running process
    pub fn detect(memory: MemoryLimits) -> Self {
        let available_processors = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            memory,
            available_processors,
        }
    }
}

impl Default for RuntimeFacts {
    fn default() -> Self {
        Self::detect(MemoryLimits::default())
    }
}

/// Default of a setting, rendered as the raw string the resolver falls back to
#[derive(Clone, Copy)]
pub enum DefaultValue {
    Literal(&'static str),
    Computed(fn(&RuntimeFacts) -> String),
}

impl DefaultValue {
    pub fn render(&self, facts: &RuntimeFacts) -> String {
        match self {
            DefaultValue::Literal(value) => (*value).to_string(),
            DefaultValue::Computed(compute) => compute(facts),
        }
    }
}

impl std::fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Literal(value) => write!(f, "Literal({:?})", value),
            DefaultValue::Computed(_) => f.write_str("Computed"),
        }
    }
}

pub fn max_expectations(facts: &RuntimeFacts) -> String {
    facts.memory.max_expectations.to_string()
}

pub fn max_log_entries(facts: &RuntimeFacts) -> String {
    facts.memory.max_log_entries.to_string()
}

pub fn action_handler_thread_count(facts: &RuntimeFacts) -> String {
    facts.available_processors.max(MIN_ACTION_HANDLER_THREADS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_limits() {
        let limits = MemoryLimits::default();
        assert_eq!(limits.max_expectations, 5_000);
        assert_eq!(limits.max_log_entries, 60_000);

        // 64 MiB: 32 MiB budget
        let limits = MemoryLimits::from_heap_bytes(64 * 1024 * 1024);
        assert_eq!(limits.max_expectations, 327);
        assert_eq!(limits.max_log_entries, 4_096);

        let limits = MemoryLimits::from_heap_bytes(0);
        assert_eq!(limits.max_expectations, 0);
        assert_eq!(limits.max_log_entries, 0);
    }

    #[test]
    fn test_computed_defaults() {
        let facts = RuntimeFacts {
            memory: MemoryLimits::from_heap_bytes(64 * 1024 * 1024),
            available_processors: 2,
        };
        assert_eq!(DefaultValue::Computed(max_expectations).render(&facts), "327");
        assert_eq!(DefaultValue::Computed(max_log_entries).render(&facts), "4096");
        assert_eq!(action_handler_thread_count(&facts), "5");

        let facts = RuntimeFacts { available_processors: 16, ..facts };
        assert_eq!(action_handler_thread_count(&facts), "16");
        assert_eq!(DefaultValue::Literal("INFO").render(&facts), "INFO");
    }
}
