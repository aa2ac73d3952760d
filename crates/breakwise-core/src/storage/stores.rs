//! Typed views over the key-value store for the two persisted documents.

use std::sync::Arc;

use super::{get_or, put, KeyValueStore};
use crate::error::StorageError;
use crate::settings::Settings;
use crate::stats::Stats;

pub const SETTINGS_KEY: &str = "settings";
pub const STATS_KEY: &str = "stats";

/// Persisted user settings.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read settings, with defaults for a store that was never written.
    ///
    /// # Errors
    /// Returns an error if the store fails or the document is corrupt.
    pub fn get(&self) -> Result<Settings, StorageError> {
        get_or(self.store.as_ref(), SETTINGS_KEY, Settings::default()).map(Settings::normalized)
    }

    /// Read settings, falling back to compiled-in defaults on any failure.
    pub fn load(&self) -> Settings {
        self.get().unwrap_or_else(|e| {
            tracing::warn!("Failed to read settings, using defaults: {e}");
            Settings::default()
        })
    }

    /// # Errors
    /// Returns an error if the write is not durable.
    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        put(self.store.as_ref(), SETTINGS_KEY, settings)
    }
}

/// Persisted statistics.
#[derive(Clone)]
pub struct StatsStore {
    store: Arc<dyn KeyValueStore>,
}

impl StatsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// # Errors
    /// Returns an error if the store fails or the document is corrupt.
    pub fn get(&self) -> Result<Stats, StorageError> {
        get_or(self.store.as_ref(), STATS_KEY, Stats::default())
    }

    /// Read stats, starting from zero on any failure.
    pub fn load(&self) -> Stats {
        self.get().unwrap_or_else(|e| {
            tracing::warn!("Failed to read stats, starting from zero: {e}");
            Stats::default()
        })
    }

    /// # Errors
    /// Returns an error if the write is not durable.
    pub fn save(&self, stats: &Stats) -> Result<(), StorageError> {
        put(self.store.as_ref(), STATS_KEY, stats)
    }
}
