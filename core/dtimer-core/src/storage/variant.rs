//! Store variant — sled-backed or in-memory tables behind one handle.

use crate::config::StoreConfig;
use crate::error::TimerResult;
use crate::storage::StorageBackend;
use crate::storage::memory_wos::InMemoryWosBackend;
use crate::storage::wos::WosBackend;
use std::ops::RangeBounds;
use std::sync::Arc;

/// Store variant shared by the schedule, cancel index and event table.
///
/// Note: `StorageBackend::scan` has a generic parameter `R: RangeBounds`
/// which prevents dyn compatibility.
#[derive(Clone)]
pub enum StoreVariant {
    Plain(Arc<WosBackend>),
    InMemory(Arc<InMemoryWosBackend>),
}

impl StoreVariant {
    /// Open the store described by `config`.
    pub fn open(config: &StoreConfig) -> TimerResult<Self> {
        match config {
            StoreConfig::InMemory => Ok(Self::in_memory()),
            StoreConfig::Path(path) => {
                std::fs::create_dir_all(path)?;
                Ok(Self::Plain(Arc::new(WosBackend::open(path)?)))
            }
        }
    }

    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryWosBackend::new()))
    }

    pub fn insert(&self, table: &str, key: &[u8], value: &[u8]) -> TimerResult<()> {
        match self {
            Self::Plain(wos) => wos.as_ref().insert(table, key, value),
            Self::InMemory(wos) => wos.as_ref().insert(table, key, value),
        }
    }

    pub fn get(&self, table: &str, key: &[u8]) -> TimerResult<Option<Vec<u8>>> {
        match self {
            Self::Plain(wos) => wos.as_ref().get(table, key),
            Self::InMemory(wos) => wos.as_ref().get(table, key),
        }
    }

    pub fn delete(&self, table: &str, key: &[u8]) -> TimerResult<bool> {
        match self {
            Self::Plain(wos) => wos.as_ref().delete(table, key),
            Self::InMemory(wos) => wos.as_ref().delete(table, key),
        }
    }

    pub fn scan<R: RangeBounds<Vec<u8>> + Clone>(
        &self,
        table: &str,
        range: R,
    ) -> TimerResult<Vec<(Vec<u8>, Vec<u8>)>> {
        match self {
            Self::Plain(wos) => wos.as_ref().scan(table, range),
            Self::InMemory(wos) => wos.as_ref().scan(table, range),
        }
    }

    pub fn scan_one<R: RangeBounds<Vec<u8>> + Clone>(
        &self,
        table: &str,
        range: R,
    ) -> TimerResult<Option<(Vec<u8>, Vec<u8>)>> {
        match self {
            Self::Plain(wos) => wos.as_ref().scan_one(table, range),
            Self::InMemory(wos) => wos.as_ref().scan_one(table, range),
        }
    }

    pub fn flush(&self) -> TimerResult<()> {
        match self {
            Self::Plain(wos) => wos.as_ref().flush(),
            Self::InMemory(wos) => wos.as_ref().flush(),
        }
    }

    pub fn count(&self, table: &str) -> TimerResult<usize> {
        match self {
            Self::Plain(wos) => wos.as_ref().count(table),
            Self::InMemory(wos) => wos.as_ref().count(table),
        }
    }

    /// Read a big-endian `u64` value, or `None` if the key is absent.
    pub fn get_u64(&self, table: &str, key: &[u8]) -> TimerResult<Option<u64>> {
        self.get(table, key)?
            .map(|bytes| crate::storage::decode_u64_key(&bytes))
            .transpose()
    }

    pub fn put_u64(&self, table: &str, key: &[u8], value: u64) -> TimerResult<()> {
        self.insert(table, key, &value.to_be_bytes())
    }
}
