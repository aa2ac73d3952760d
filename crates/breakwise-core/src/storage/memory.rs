//! In-process key-value store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::KeyValueStore;
use crate::error::StorageError;

/// Volatile store for tests and embedders that handle durability themselves.
///
/// Reads and writes can be made to fail on demand to exercise the engine's
/// recovery paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("reads disabled".into()));
        }
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".into()));
        }
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_toggles() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();

        store.set_fail_writes(true);
        assert!(store.set("a", "2").is_err());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.set_fail_reads(true);
        assert!(store.get("a").is_err());
    }
}
