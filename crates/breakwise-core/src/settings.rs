//! User preferences.
//!
//! Settings are the user-facing knobs (interval, smart mode, presentation
//! flags). They are persisted as camelCase JSON under the `"settings"` key of
//! the key-value store. Engine tunables live in [`crate::storage::Config`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Smallest accepted baseline interval.
pub const MIN_INTERVAL_MINUTES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Text,
    Audio,
    Video,
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioStyle {
    None,
    #[default]
    Voice,
    Chime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Baseline reminder period in minutes.
    #[serde(
        default = "default_interval",
        alias = "interval",
        deserialize_with = "deserialize_interval"
    )]
    pub interval_minutes: u32,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smart_mode: bool,
    #[serde(default)]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub audio_style: AudioStyle,
    #[serde(default)]
    pub show_widget: bool,
    #[serde(default)]
    pub motivational_tips_enabled: bool,
    #[serde(default)]
    pub auto_launch: bool,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_interval() -> u32 {
    45
}

/// Interval as it may arrive from a surface or an older settings file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawInterval {
    Whole(i64),
    Fraction(f64),
    Text(String),
}

/// Accept any signed or numeric-string interval and clamp it to at least one
/// minute.
fn deserialize_interval<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match RawInterval::deserialize(deserializer)? {
        RawInterval::Whole(n) => n,
        RawInterval::Fraction(f) => f as i64,
        RawInterval::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("invalid interval: {text:?}")))?,
    };
    Ok(Settings::clamp_interval(raw))
}

fn default_language() -> String {
    "en".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval(),
            enabled: false,
            smart_mode: false,
            notification_type: NotificationType::default(),
            audio_style: AudioStyle::default(),
            show_widget: false,
            motivational_tips_enabled: false,
            auto_launch: false,
            theme: Theme::default(),
            language: default_language(),
        }
    }
}

impl Settings {
    /// Clamp values that would break engine invariants.
    pub fn normalized(mut self) -> Self {
        self.interval_minutes = self.interval_minutes.max(MIN_INTERVAL_MINUTES);
        self
    }

    /// Interval from an untrusted signed source, clamped to at least one minute.
    pub fn clamp_interval(raw: i64) -> u32 {
        raw.clamp(MIN_INTERVAL_MINUTES as i64, u32::MAX as i64) as u32
    }

    /// Whether moving from `self` to `next` must re-arm the countdown.
    ///
    /// Restart happens exactly when reminders were switched on, or when the
    /// interval or smart-mode flag changed.
    pub fn requires_restart(&self, next: &Settings) -> bool {
        (!self.enabled && next.enabled)
            || self.interval_minutes != next.interval_minutes
            || self.smart_mode != next.smart_mode
    }
}
