//! Core error types for breakwise-core.
//!
//! This module defines the error hierarchy using thiserror. Storage and
//! configuration failures are surfaced to the caller of the store; the
//! engine itself recovers from them and keeps running on in-memory state.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breakwise-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value could not be decoded
    #[error("Stored value for '{key}' is corrupt: {message}")]
    Corrupt { key: String, message: String },

    /// A value could not be encoded for storage
    #[error("Failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The store is locked or otherwise not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Failed to resolve or create the data directory
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg)
                if matches!(
                    inner.code,
                    rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
                ) =>
            {
                StorageError::Unavailable(err.to_string())
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
