//! TOML-based application configuration.
//!
//! Holds engine tunables that are not user preferences:
//! - Smart-mode growth step and ceiling
//! - Motivational tip cadence
//! - Host tick interval and next-morning resume hour
//! - Exercise library location
//! - Default log level
//!
//! Configuration is stored at `~/.config/breakwise/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Reminder engine tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minutes added to the effective interval after a skipped reminder.
    #[serde(default = "default_smart_step")]
    pub smart_step_minutes: u32,
    /// Upper bound for the effective interval under smart mode.
    #[serde(default = "default_max_interval")]
    pub max_interval_minutes: u32,
    #[serde(default = "default_motivational_interval")]
    pub motivational_interval_minutes: u32,
    /// How often the host checks the timer table.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Local hour at which "pause until tomorrow" resumes.
    #[serde(default = "default_resume_hour")]
    pub resume_hour: u32,
}

/// Content provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContentConfig {
    /// JSON exercise library. Falls back to `<data_dir>/exercises.json`.
    #[serde(default)]
    pub exercises_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breakwise/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_smart_step() -> u32 {
    15
}
fn default_max_interval() -> u32 {
    120
}
fn default_motivational_interval() -> u32 {
    30
}
fn default_tick_interval() -> u64 {
    1000
}
fn default_resume_hour() -> u32 {
    9
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smart_step_minutes: default_smart_step(),
            max_interval_minutes: default_max_interval(),
            motivational_interval_minutes: default_motivational_interval(),
            tick_interval_ms: default_tick_interval(),
            resume_hour: default_resume_hour(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(String::new()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                    // Optional fields serialize as null; treat them as strings.
                    serde_json::Value::Null | serde_json::Value::String(_) => {
                        serde_json::Value::String(value.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by key in memory. Returns error if key is unknown or the
    /// value does not fit the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.validate()
    }

    /// # Errors
    ///
    /// Returns an error when a tunable would break engine invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if engine.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.tick_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if engine.motivational_interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.motivational_interval_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }
        if engine.max_interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.max_interval_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }
        if engine.resume_hour > 23 {
            return Err(ConfigError::InvalidValue {
                key: "engine.resume_hour".into(),
                message: "must be an hour between 0 and 23".into(),
            });
        }
        Ok(())
    }

    /// Exercise library path, defaulting to `<data_dir>/exercises.json`.
    pub fn exercises_path(&self) -> Option<PathBuf> {
        match &self.content.exercises_path {
            Some(p) => Some(PathBuf::from(p)),
            None => data_dir().ok().map(|d| d.join("exercises.json")),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {e}");
            Self::default()
        })
    }
}
