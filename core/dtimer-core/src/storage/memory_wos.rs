//! In-memory WOS backend using BTreeMap
//!
//! Same ordering contract as the sled backend, without durability.
//! Used for ephemeral services and unit tests.

use crate::error::TimerResult;
use crate::storage::StorageBackend;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeBounds;

/// In-memory WOS backend using BTreeMap
pub struct InMemoryWosBackend {
    tables: RwLock<HashMap<String, BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryWosBackend {
    /// Create a new in-memory WOS backend
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryWosBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryWosBackend {
    fn insert(&self, table: &str, key: &[u8], value: &[u8]) -> TimerResult<()> {
        let mut tables = self.tables.write();
        tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, table: &str, key: &[u8]) -> TimerResult<Option<Vec<u8>>> {
        let tables = self.tables.read();
        Ok(tables.get(table).and_then(|map| map.get(key).cloned()))
    }

    fn delete(&self, table: &str, key: &[u8]) -> TimerResult<bool> {
        let mut tables = self.tables.write();
        Ok(tables
            .get_mut(table)
            .is_some_and(|map| map.remove(key).is_some()))
    }

    fn scan<R: RangeBounds<Vec<u8>> + Clone>(
        &self,
        table: &str,
        range: R,
    ) -> TimerResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .map(|map| {
                map.range(range)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn scan_one<R: RangeBounds<Vec<u8>> + Clone>(
        &self,
        table: &str,
        range: R,
    ) -> TimerResult<Option<(Vec<u8>, Vec<u8>)>> {
        let tables = self.tables.read();
        Ok(tables.get(table).and_then(|map| {
            map.range(range)
                .next()
                .map(|(k, v)| (k.clone(), v.clone()))
        }))
    }

    fn flush(&self) -> TimerResult<()> {
        Ok(())
    }

    fn count(&self, table: &str) -> TimerResult<usize> {
        let tables = self.tables.read();
        Ok(tables.get(table).map_or(0, |map| map.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_is_empty() {
        let wos = InMemoryWosBackend::new();
        assert_eq!(wos.get("nope", b"k").unwrap(), None);
        assert!(wos.scan("nope", ..).unwrap().is_empty());
        assert_eq!(wos.scan_one("nope", ..).unwrap(), None);
        assert_eq!(wos.count("nope").unwrap(), 0);
        assert!(!wos.delete("nope", b"k").unwrap());
    }

    #[test]
    fn range_scan_in_key_order() {
        let wos = InMemoryWosBackend::new();
        wos.insert("t", b"c", b"3").unwrap();
        wos.insert("t", b"a", b"1").unwrap();
        wos.insert("t", b"b", b"2").unwrap();

        let first_two = wos.scan("t", ..=b"b".to_vec()).unwrap();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[0].0, b"a");
        assert_eq!(first_two[1].0, b"b");

        let (k, _) = wos.scan_one("t", b"b".to_vec()..).unwrap().unwrap();
        assert_eq!(k, b"b");
    }
}
