//! Statistics for break reminders.
//!
//! Cumulative totals plus one bucket per local calendar day. The totals are
//! always the sum of the buckets; [`StatsAggregator`] is the only writer.

mod aggregator;

pub use aggregator::{AdaptivePolicy, Rearm, StatsAggregator};

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Format of the `dailyHistory` keys.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Longest span [`Stats::recent_days`] reports.
pub const MAX_HISTORY_DAYS: u32 = 3660;

/// Outcome reported for a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Shown,
    #[serde(alias = "complete")]
    Completed,
    Skipped,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutcomeKind::Shown => "shown",
            OutcomeKind::Completed => "completed",
            OutcomeKind::Skipped => "skipped",
        })
    }
}

/// Per-day aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DayBucket {
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub skipped: u64,
    /// Completed break time in minutes.
    #[serde(default)]
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub total_reminders: u64,
    #[serde(default)]
    pub total_completed: u64,
    #[serde(default)]
    pub total_skipped: u64,
    #[serde(default)]
    pub total_minutes: f64,
    #[serde(default)]
    pub daily_history: BTreeMap<String, DayBucket>,
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

impl Stats {
    pub fn day(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.daily_history.get(&date_key(date))
    }

    /// Bucket for `date`, created on first touch.
    pub(crate) fn day_mut(&mut self, date: NaiveDate) -> &mut DayBucket {
        self.daily_history.entry(date_key(date)).or_default()
    }

    /// Percentage of answered reminders that were completed, rounded.
    pub fn completion_rate(&self) -> u32 {
        let answered = self.total_completed + self.total_skipped;
        if answered == 0 {
            return 0;
        }
        ((self.total_completed as f64 / answered as f64) * 100.0).round() as u32
    }

    /// The `days` calendar days ending at `today`, oldest first.
    ///
    /// Days without activity are reported with an empty bucket. `days` is
    /// capped at [`MAX_HISTORY_DAYS`], and days before the earliest
    /// representable date are left out.
    pub fn recent_days(&self, today: NaiveDate, days: u32) -> Vec<(NaiveDate, DayBucket)> {
        (0..days.min(MAX_HISTORY_DAYS) as i64)
            .rev()
            .filter_map(|back| today.checked_sub_signed(Duration::days(back)))
            .map(|date| (date, self.day(date).copied().unwrap_or_default()))
            .collect()
    }

    /// Whether the totals agree with the daily buckets.
    pub fn is_consistent(&self) -> bool {
        let (completed, skipped, minutes) = self.daily_history.values().fold(
            (0u64, 0u64, 0.0f64),
            |(c, s, m), day| (c + day.completed, s + day.skipped, m + day.minutes),
        );
        completed == self.total_completed
            && skipped == self.total_skipped
            && (minutes - self.total_minutes).abs() < 1e-6
    }
}
