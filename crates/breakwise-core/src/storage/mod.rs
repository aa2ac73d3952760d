mod config;
pub mod database;
pub mod memory;
pub mod stores;

pub use config::{Config, ContentConfig, EngineConfig, LoggingConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use stores::{SettingsStore, StatsStore, SETTINGS_KEY, STATS_KEY};

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Durable string key-value store.
///
/// `set` must be durable before it returns, or report the failure.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Read `key` as JSON, falling back to `default` when it was never written.
///
/// # Errors
/// Returns an error if the store fails or the stored value does not decode.
pub fn get_or<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    default: T,
) -> Result<T, StorageError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Write `value` as JSON under `key`.
///
/// # Errors
/// Returns an error if encoding fails or the store rejects the write.
pub fn put<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Returns the data directory, creating it if needed.
///
/// `BREAKWISE_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/breakwise[-dev]/`, with `BREAKWISE_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("BREAKWISE_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("BREAKWISE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("breakwise-dev")
            } else {
                base_dir.join("breakwise")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_returns_default_for_missing_key() {
        let store = MemoryStore::new();
        let value: u32 = get_or(&store, "missing", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn get_or_reports_corrupt_payload() {
        let store = MemoryStore::new();
        store.set("n", "{not json").unwrap();
        let err = get_or::<u32>(&store, "n", 0).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "n"));
    }

    #[test]
    fn put_then_get_roundtrips_json() {
        let store = MemoryStore::new();
        put(&store, "list", &vec![1, 2, 3]).unwrap();
        let back: Vec<u32> = get_or(&store, "list", Vec::new()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
