//! Logging helpers
//!
//! Wires the `log` facade to `env_logger` using the configured log level.

use crate::config::LogLevel;

/// Initialize the logging system
///
/// `RUST_LOG` takes priority over `level` when it is set. Calling this more
/// than once is harmless; later calls only adjust the maximum level.
pub fn init_logger(level: LogLevel) {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level.filter_str());

    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::set_max_level(level.level_filter());
    }
}

/// Apply a log level change to the running logger
pub fn apply_log_level(level: LogLevel) {
    let filter = level.level_filter();
    if log::max_level() != filter {
        log::debug!("Changing maximum log level from {} to {}", log::max_level(), filter);
    }
    log::set_max_level(filter);
}
