//! Error types for the dtimer service.
//!
//! All public APIs return `TimerResult<T>` — no panics in library code.

use thiserror::Error;

/// Unified error type for all timer operations.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Storage layer error (corrupt record, missing table, etc.)
    #[error("storage error: {0}")]
    Storage(String),

    /// sled embedded database error
    #[error("sled error: {source}")]
    Sled {
        #[from]
        source: sled::Error,
    },

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Arithmetic between values of two different clocks
    #[error("timer brand mismatch: {left} vs {right}")]
    BrandMismatch { left: String, right: String },

    /// Overflow or negative result in time arithmetic
    #[error("time arithmetic error: {0}")]
    Arithmetic(String),

    /// Invalid argument (non-positive interval, zero delay, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `unregister` called without a concrete cancel token
    #[error("cancel token must be provided")]
    MissingCancelToken,

    /// `Repeater::schedule` called on an active repeater
    #[error("repeater already scheduled")]
    RepeaterAlreadyActive,

    /// Repeater record does not exist
    #[error("repeater {0} not found")]
    RepeaterNotFound(u64),

    /// The wakeup was cancelled before it fired
    #[error("timer cancelled")]
    Cancelled,

    /// The resolver went away (service dropped or restarted)
    #[error("timer service disconnected")]
    Disconnected,

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for all timer operations.
pub type TimerResult<T> = Result<T, TimerError>;

// From 구현들
impl From<bincode::Error> for TimerError {
    fn from(err: bincode::Error) -> Self {
        TimerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for TimerError {
    fn from(err: serde_json::Error) -> Self {
        TimerError::Serialization(err.to_string())
    }
}
