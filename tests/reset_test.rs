//! Override and reset tests

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use mockserver_config::config::{settings, Value, ValueSource};

use common::isolated;

#[test]
fn test_override_then_reset() {
    let config = isolated().build().unwrap();
    assert_eq!(config.get(&settings::MAX_EXPECTATIONS), 5000);

    config.set(&settings::MAX_EXPECTATIONS, 250).unwrap();
    assert_eq!(config.get(&settings::MAX_EXPECTATIONS), 250);
    assert_eq!(
        config.overrides().get("mockserver.maxExpectations").map(String::as_str),
        Some("250")
    );

    config.reset_all();
    assert_eq!(config.get(&settings::MAX_EXPECTATIONS), 5000);
    assert_eq!(
        config.raw_value(&settings::MAX_EXPECTATIONS.def).unwrap().source,
        ValueSource::Default
    );
}

#[test]
fn test_reset_recomputes_cached_cells() {
    let config = isolated()
        .with_env_vars([("MOCKSERVER_METRICS_ENABLED", "true")])
        .build()
        .unwrap();
    assert!(config.get(&settings::METRICS_ENABLED));

    config.set(&settings::METRICS_ENABLED, false).unwrap();
    config.set(&settings::ENABLE_CORS_FOR_API, true).unwrap();
    assert!(!config.get(&settings::METRICS_ENABLED));
    assert!(config.get(&settings::ENABLE_CORS_FOR_API));

    config.reset_all();
    assert!(config.get(&settings::METRICS_ENABLED));
    assert!(!config.get(&settings::ENABLE_CORS_FOR_API));
}

#[test]
fn test_reset_is_idempotent() {
    let config = isolated().build().unwrap();
    config.set(&settings::MAX_LOG_ENTRIES, 12).unwrap();

    config.reset_all();
    let first = config.resolved();
    config.reset_all();
    assert_eq!(config.resolved(), first);
    assert!(config.overrides().is_empty());
}

#[test]
fn test_reset_keeps_excluded_and_foreign_keys() {
    let config = isolated()
        .with_override("other.setting", "kept")
        .build()
        .unwrap();

    config
        .set(&settings::EXCLUDE_FROM_PROPERTY_RESET, vec!["mockserver.maxLogEntries".to_string()])
        .unwrap();
    config.set(&settings::MAX_LOG_ENTRIES, 10).unwrap();
    config.set(&settings::MAX_EXPECTATIONS, 20).unwrap();

    config.reset_all();

    assert_eq!(config.get(&settings::MAX_LOG_ENTRIES), 10);
    assert_eq!(config.get(&settings::MAX_EXPECTATIONS), 5000);

    let overrides = config.overrides();
    assert_eq!(overrides.get("other.setting").map(String::as_str), Some("kept"));
    assert!(overrides.contains_key("excludeFromPropertyReset"));
    assert!(!overrides.contains_key("mockserver.maxExpectations"));
}

#[test]
fn test_blank_write_clears_override() {
    let config = isolated()
        .with_env_vars([("MOCKSERVER_SSL_CERTIFICATE_DOMAIN_NAME", "env.example")])
        .build()
        .unwrap();

    config.set(&settings::SSL_CERTIFICATE_DOMAIN_NAME, "override.example".to_string()).unwrap();
    assert_eq!(config.get(&settings::SSL_CERTIFICATE_DOMAIN_NAME), "override.example");

    config.set_raw(&settings::SSL_CERTIFICATE_DOMAIN_NAME.def, "   ").unwrap();
    assert_eq!(config.get(&settings::SSL_CERTIFICATE_DOMAIN_NAME), "env.example");
    assert!(config.overrides().is_empty());
}

#[test]
fn test_concurrent_reads_writes_and_resets() {
    let config = Arc::new(isolated().build().unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let config = config.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let max = config.get(&settings::MAX_EXPECTATIONS);
                    assert!(max == 5000 || (1..=100).contains(&max), "unexpected value {}", max);
                    let _ = config.get(&settings::METRICS_ENABLED);
                }
            })
        })
        .collect();

    let writers: Vec<_> = (0..2)
        .map(|_| {
            let config = config.clone();
            thread::spawn(move || {
                for i in 1..=100 {
                    config.set(&settings::MAX_EXPECTATIONS, i).unwrap();
                    config.set(&settings::METRICS_ENABLED, i % 2 == 0).unwrap();
                    if i % 10 == 0 {
                        config.reset_all();
                    }
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }

    config.reset_all();
    assert_eq!(config.get(&settings::MAX_EXPECTATIONS), 5000);
    assert!(!config.get(&settings::METRICS_ENABLED));
}

#[test]
fn test_reads_never_see_a_partial_update() {
    let config = Arc::new(isolated().build().unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let config = config.clone();
        let done = done.clone();
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                let setting = config.resolve_setting(&settings::METRICS_ENABLED.def).unwrap();
                let overridden = setting.source == ValueSource::Override;
                assert_eq!(setting.value, Value::Bool(overridden));
            }
        })
    };

    for _ in 0..200 {
        config.set(&settings::METRICS_ENABLED, true).unwrap();
        config.reset_all();
    }
    done.store(true, Ordering::Relaxed);
    reader.join().unwrap();
}
