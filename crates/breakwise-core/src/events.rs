use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::Exercise;
use crate::settings::Settings;
use crate::stats::Stats;

/// Every observable state change produces an Event.
/// Surfaces subscribe through the [`crate::NotificationDispatcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Event {
    /// Countdown armed; fires at `target`.
    TimerArmed {
        target: DateTime<Utc>,
        interval_minutes: u32,
    },
    TimerStopped,
    /// Reminders suspended until `resume_at`.
    TimerPaused {
        duration_ms: u64,
        resume_at: DateTime<Utc>,
    },
    ReminderShown {
        exercise: Exercise,
        settings: Settings,
    },
    StatsUpdated {
        stats: Stats,
    },
    SettingsUpdated {
        settings: Settings,
    },
    /// A pause elapsed and reminders are running again.
    RemindersEnabled {
        at: DateTime<Utc>,
    },
    MotivationalTip {
        message: String,
        at: DateTime<Utc>,
    },
    /// The countdown widget was shown or hidden. Carries the live target so
    /// a freshly shown widget can render immediately.
    WidgetToggled {
        visible: bool,
        target: Option<DateTime<Utc>>,
    },
}

impl Event {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerArmed { .. } => "timer-armed",
            Event::TimerStopped => "timer-stopped",
            Event::TimerPaused { .. } => "timer-paused",
            Event::ReminderShown { .. } => "reminder-shown",
            Event::StatsUpdated { .. } => "stats-updated",
            Event::SettingsUpdated { .. } => "settings-updated",
            Event::RemindersEnabled { .. } => "reminders-enabled",
            Event::MotivationalTip { .. } => "motivational-tip",
            Event::WidgetToggled { .. } => "widget-toggled",
        }
    }

    /// Countdown events rendered only by the widget surface.
    pub fn is_widget_event(&self) -> bool {
        matches!(self, Event::TimerArmed { .. } | Event::TimerStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_tag_matches_name() {
        let events = [
            Event::TimerStopped,
            Event::RemindersEnabled { at: Utc::now() },
            Event::StatsUpdated {
                stats: Stats::default(),
            },
            Event::WidgetToggled {
                visible: true,
                target: None,
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn payload_fields_are_camel_case() {
        let json = serde_json::to_value(Event::TimerPaused {
            duration_ms: 60_000,
            resume_at: Utc::now(),
        })
        .unwrap();
        assert_eq!(json["durationMs"], 60_000);
        assert!(json.get("resumeAt").is_some());
    }

    #[test]
    fn widget_events() {
        assert!(Event::TimerStopped.is_widget_event());
        assert!(!Event::SettingsUpdated {
            settings: Settings::default()
        }
        .is_widget_event());
    }
}
