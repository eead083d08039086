//! Storage module — the durable substrate under the scheduler.
//!
//! All storage engines implement the [`StorageBackend`] trait.
//! The scheduler depends only on this trait and on [`StoreVariant`].

pub mod memory_wos;
pub mod variant;
pub mod wos;

pub use memory_wos::InMemoryWosBackend;
pub use variant::StoreVariant;
pub use wos::WosBackend;

use crate::error::TimerResult;
use std::ops::RangeBounds;

/// Core storage interface — sorted byte-keyed tables.
///
/// # Contract
///
/// - `insert`: Upsert semantics — overwrites existing key.
/// - `get`: Returns `None` for non-existent keys, never errors.
/// - `delete`: Returns `true` if key existed, `false` otherwise.
/// - `scan`: Returns key-value pairs in ascending key order within range.
/// - `scan_one`: Returns the first pair in range without walking the rest.
/// - `flush`: Persists buffered data to durable storage.
/// - `count`: Returns the number of keys in a table.
pub trait StorageBackend: Send + Sync {
    /// Insert a key-value pair.
    fn insert(&self, table: &str, key: &[u8], value: &[u8]) -> TimerResult<()>;

    /// Get a value by key.
    fn get(&self, table: &str, key: &[u8]) -> TimerResult<Option<Vec<u8>>>;

    /// Delete a key-value pair.
    fn delete(&self, table: &str, key: &[u8]) -> TimerResult<bool>;

    /// Scan a range of keys.
    fn scan<R: RangeBounds<Vec<u8>> + Clone>(
        &self,
        table: &str,
        range: R,
    ) -> TimerResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Scan a single key-value pair in a range.
    fn scan_one<R: RangeBounds<Vec<u8>> + Clone>(
        &self,
        table: &str,
        range: R,
    ) -> TimerResult<Option<(Vec<u8>, Vec<u8>)>>;

    /// Flush any buffered data to durable storage.
    fn flush(&self) -> TimerResult<()>;

    /// Return the number of keys in the given table.
    fn count(&self, table: &str) -> TimerResult<usize>;
}

/// Encode a `u64` as a big-endian key so byte order matches numeric order.
pub fn u64_key(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode a key written by [`u64_key`].
pub fn decode_u64_key(key: &[u8]) -> TimerResult<u64> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| {
        crate::error::TimerError::Storage(format!("expected 8-byte key, got {}", key.len()))
    })?;
    Ok(u64::from_be_bytes(bytes))
}
