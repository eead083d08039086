//! Logging utilities for dtimer
//!
//! Provides helpers for initializing tracing subscribers. The scheduler
//! itself only emits `tracing` events; installing a subscriber is up to
//! the embedding process.

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging with default settings
///
/// # Environment Variables
/// - `RUST_LOG` - Log level filter (default: "info")
///
/// # Example
/// ```rust
/// dtimer_core::logging::init();
/// ```
#[cfg(feature = "logging")]
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific level
///
/// # Arguments
/// * `level` - Log level (trace, debug, info, warn, error)
///
/// # Example
/// ```rust
/// // 스케줄 전이(예약, 발화, 취소)는 debug 레벨로 기록됩니다
/// dtimer_core::logging::init_with_level("dtimer_core=debug");
/// ```
#[cfg(feature = "logging")]
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .try_init();
}

/// Initialize logging for tests
///
/// Scheduler transitions are logged at debug level.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("dtimer_core=debug"))
        .with_test_writer()
        .try_init();
}

/// Initialize logging from a loaded [`TimerConfig`](crate::config::TimerConfig).
///
/// # Example
/// ```rust
/// let config = dtimer_core::TimerConfig::in_memory();
/// dtimer_core::logging::init_from_config(&config);
/// ```
pub fn init_from_config(config: &crate::config::TimerConfig) {
    init_with_level(&config.log_level)
}

// Stub implementations when logging feature is disabled
#[cfg(not(feature = "logging"))]
pub fn init() {}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(_level: &str) {}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}
