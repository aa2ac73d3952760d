//! Purpose-keyed timer table.
//!
//! One slot per purpose. Scheduling a purpose overwrites its slot, which is
//! what makes a replaced timer impossible to fire.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerPurpose {
    Reminder,
    PauseResume,
    Motivational,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    due: DateTime<Utc>,
    every: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct TimerTable {
    slots: BTreeMap<TimerPurpose, Slot>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, purpose: TimerPurpose, due: DateTime<Utc>) {
        tracing::debug!(?purpose, %due, "Scheduling one-shot timer");
        self.slots.insert(purpose, Slot { due, every: None });
    }

    /// First fires at `first`, then every `every` after that.
    pub fn schedule_repeating(&mut self, purpose: TimerPurpose, first: DateTime<Utc>, every: Duration) {
        tracing::debug!(?purpose, %first, "Scheduling repeating timer");
        self.slots.insert(
            purpose,
            Slot {
                due: first,
                every: Some(every),
            },
        );
    }

    /// Returns whether a timer was pending.
    pub fn cancel(&mut self, purpose: TimerPurpose) -> bool {
        let removed = self.slots.remove(&purpose).is_some();
        if removed {
            tracing::debug!(?purpose, "Cancelled timer");
        }
        removed
    }

    pub fn deadline(&self, purpose: TimerPurpose) -> Option<DateTime<Utc>> {
        self.slots.get(&purpose).map(|slot| slot.due)
    }

    pub fn is_pending(&self, purpose: TimerPurpose) -> bool {
        self.slots.contains_key(&purpose)
    }

    pub fn pending(&self) -> Vec<TimerPurpose> {
        self.slots.keys().copied().collect()
    }

    /// Remove and return every timer due at `now`, earliest first.
    ///
    /// One-shot timers are dropped; repeating timers move to their next
    /// deadline after `now`, so missed periods collapse into a single fire.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<TimerPurpose> {
        let mut due: Vec<(DateTime<Utc>, TimerPurpose)> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.due <= now)
            .map(|(purpose, slot)| (slot.due, *purpose))
            .collect();
        due.sort();

        for (_, purpose) in &due {
            match self.slots.get(purpose).and_then(|slot| slot.every) {
                Some(every) if every > Duration::zero() => {
                    if let Some(slot) = self.slots.get_mut(purpose) {
                        while slot.due <= now {
                            slot.due += every;
                        }
                    }
                }
                _ => {
                    self.slots.remove(purpose);
                }
            }
        }

        due.into_iter().map(|(_, purpose)| purpose).collect()
    }
}
