//! WOS (Write-Optimized Store) — sled-backed durable tables.
//!
//! Each logical table (`schedule`, `cancels`, `events`, ...) maps to a
//! separate sled `Tree`. sled keeps keys sorted, so range scans over
//! big-endian keys return entries in time order.

use crate::error::TimerResult;
use crate::storage::StorageBackend;
use std::ops::RangeBounds;
use std::path::Path;

/// sled-backed persistent storage with B+Tree indexing.
pub struct WosBackend {
    db: sled::Db,
}

impl WosBackend {
    /// Open WOS at the given directory path.
    pub fn open(path: &Path) -> TimerResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open a temporary WOS (for testing). Data is deleted on drop.
    pub fn open_temporary() -> TimerResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Ok(Self { db })
    }

    /// Get or create a sled Tree for the given table name.
    fn tree(&self, table: &str) -> TimerResult<sled::Tree> {
        Ok(self.db.open_tree(table)?)
    }
}

impl StorageBackend for WosBackend {
    fn insert(&self, table: &str, key: &[u8], value: &[u8]) -> TimerResult<()> {
        let tree = self.tree(table)?;
        tree.insert(key, value)?;
        Ok(())
    }

    fn get(&self, table: &str, key: &[u8]) -> TimerResult<Option<Vec<u8>>> {
        let tree = self.tree(table)?;
        Ok(tree.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn delete(&self, table: &str, key: &[u8]) -> TimerResult<bool> {
        let tree = self.tree(table)?;
        Ok(tree.remove(key)?.is_some())
    }

    fn scan<R: RangeBounds<Vec<u8>> + Clone>(
        &self,
        table: &str,
        range: R,
    ) -> TimerResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let tree = self.tree(table)?;
        let mut result = Vec::new();
        for item in tree.range(range) {
            let (k, v) = item?;
            result.push((k.to_vec(), v.to_vec()));
        }
        Ok(result)
    }

    fn scan_one<R: RangeBounds<Vec<u8>> + Clone>(
        &self,
        table: &str,
        range: R,
    ) -> TimerResult<Option<(Vec<u8>, Vec<u8>)>> {
        let tree = self.tree(table)?;
        match tree.range(range).next() {
            Some(item) => {
                let (k, v) = item?;
                Ok(Some((k.to_vec(), v.to_vec())))
            }
            None => Ok(None),
        }
    }

    fn flush(&self) -> TimerResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn count(&self, table: &str) -> TimerResult<usize> {
        let tree = self.tree(table)?;
        Ok(tree.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::u64_key;

    fn temp_wos() -> WosBackend {
        WosBackend::open_temporary().unwrap()
    }

    #[test]
    fn insert_and_get() {
        let wos = temp_wos();
        wos.insert("events", b"key1", b"value1").unwrap();
        let result = wos.get("events", b"key1").unwrap();
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[test]
    fn delete_nonexistent() {
        let wos = temp_wos();
        assert!(!wos.delete("events", b"missing").unwrap());
    }

    #[test]
    fn upsert_overwrites() {
        let wos = temp_wos();
        wos.insert("t", b"k", b"v1").unwrap();
        wos.insert("t", b"k", b"v2").unwrap();
        assert_eq!(wos.get("t", b"k").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn scan_inclusive_upper_bound_in_numeric_order() {
        let wos = temp_wos();
        for t in [30u64, 10, 256, 20] {
            wos.insert("schedule", &u64_key(t), b"x").unwrap();
        }

        let due = wos.scan("schedule", ..=u64_key(30)).unwrap();
        let keys: Vec<Vec<u8>> = due.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![u64_key(10), u64_key(20), u64_key(30)]);
    }

    #[test]
    fn scan_one_returns_minimum() {
        let wos = temp_wos();
        assert_eq!(wos.scan_one("schedule", ..).unwrap(), None);
        wos.insert("schedule", &u64_key(70), b"b").unwrap();
        wos.insert("schedule", &u64_key(5), b"a").unwrap();
        let (k, v) = wos.scan_one("schedule", ..).unwrap().unwrap();
        assert_eq!(k, u64_key(5));
        assert_eq!(v, b"a".to_vec());
    }

    #[test]
    fn count_and_table_isolation() {
        let wos = temp_wos();
        wos.insert("t1", b"k", b"v1").unwrap();
        wos.insert("t2", b"k", b"v2").unwrap();
        wos.insert("t2", b"j", b"v3").unwrap();
        assert_eq!(wos.count("t1").unwrap(), 1);
        assert_eq!(wos.count("t2").unwrap(), 2);
        assert_eq!(wos.get("t1", b"k").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let wos = WosBackend::open(dir.path()).unwrap();
            wos.insert("meta", b"next_event_id", &u64_key(9)).unwrap();
            wos.flush().unwrap();
        }
        let wos = WosBackend::open(dir.path()).unwrap();
        assert_eq!(
            wos.get("meta", b"next_event_id").unwrap(),
            Some(u64_key(9))
        );
    }
}
