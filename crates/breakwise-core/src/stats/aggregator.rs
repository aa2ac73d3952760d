//! Outcome recording and the smart-mode feedback signal.
//!
//! A skipped reminder pushes the next one further out by a fixed step, up to
//! a ceiling. A completed reminder snaps the interval back to the baseline.

use chrono::NaiveDate;

use super::{OutcomeKind, Stats};
use crate::settings::Settings;
use crate::storage::{EngineConfig, StatsStore};

/// How the countdown should be re-armed after an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rearm {
    /// Re-arm with the engine's own interval rules.
    Unchanged,
    /// Re-arm with this many minutes as an explicit override.
    At(u32),
}

/// Smart-mode growth parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptivePolicy {
    pub step_minutes: u32,
    pub max_interval_minutes: u32,
}

impl Default for AdaptivePolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl AdaptivePolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            step_minutes: config.smart_step_minutes,
            max_interval_minutes: config.max_interval_minutes,
        }
    }

    /// Clamp a remembered interval to at least the baseline and at most the
    /// configured maximum. The maximum wins when the baseline exceeds it.
    pub fn clamp(&self, baseline: u32, current: u32) -> u32 {
        current.max(baseline).min(self.max_interval_minutes)
    }

    /// Re-arm decision for an outcome, or `None` when the outcome does not
    /// re-arm the countdown at all.
    pub fn feedback(&self, kind: OutcomeKind, settings: &Settings, current: u32) -> Option<Rearm> {
        let baseline = settings.interval_minutes;
        match kind {
            OutcomeKind::Shown => None,
            OutcomeKind::Completed if settings.smart_mode && current > baseline => {
                Some(Rearm::At(self.clamp(baseline, baseline)))
            }
            OutcomeKind::Skipped if settings.smart_mode => {
                let grown = current.saturating_add(self.step_minutes);
                Some(Rearm::At(self.clamp(baseline, grown)))
            }
            OutcomeKind::Completed | OutcomeKind::Skipped => Some(Rearm::Unchanged),
        }
    }
}

/// Sole writer of [`Stats`].
pub struct StatsAggregator {
    store: StatsStore,
    stats: Stats,
    policy: AdaptivePolicy,
}

impl StatsAggregator {
    /// Load persisted stats, starting from zero if they cannot be read.
    pub fn new(store: StatsStore, policy: AdaptivePolicy) -> Self {
        let stats = store.load();
        Self {
            store,
            stats,
            policy,
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn policy(&self) -> AdaptivePolicy {
        self.policy
    }

    /// Record an outcome against `today`'s bucket and persist.
    ///
    /// Returns the updated snapshot. A failed write is logged and the
    /// in-memory totals stay authoritative until the next successful write.
    pub fn record(&mut self, kind: OutcomeKind, duration_seconds: u32, today: NaiveDate) -> Stats {
        let stats = &mut self.stats;
        match kind {
            OutcomeKind::Shown => {
                stats.total_reminders += 1;
            }
            OutcomeKind::Completed => {
                let minutes = duration_seconds as f64 / 60.0;
                stats.total_completed += 1;
                stats.total_minutes += minutes;
                let day = stats.day_mut(today);
                day.completed += 1;
                day.minutes += minutes;
            }
            OutcomeKind::Skipped => {
                stats.total_skipped += 1;
                stats.day_mut(today).skipped += 1;
            }
        }
        tracing::debug!(%kind, duration_seconds, %today, "Recorded reminder outcome");
        self.persist();
        self.stats.clone()
    }

    /// Interval feedback for an outcome under the current settings.
    pub fn feedback(&self, kind: OutcomeKind, settings: &Settings, current: u32) -> Option<Rearm> {
        self.policy.feedback(kind, settings, current)
    }

    /// Clear every counter and bucket.
    pub fn reset(&mut self) -> Stats {
        self.stats = Stats::default();
        tracing::info!("Statistics reset");
        self.persist();
        self.stats.clone()
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.stats) {
            tracing::warn!("Failed to persist stats, keeping in-memory copy: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn smart(interval: u32) -> Settings {
        Settings {
            interval_minutes: interval,
            smart_mode: true,
            ..Settings::default()
        }
    }

    fn aggregator() -> (StatsAggregator, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        let agg = StatsAggregator::new(StatsStore::new(kv.clone()), AdaptivePolicy::default());
        (agg, kv)
    }

    #[test]
    fn completed_on_empty_stats() {
        let (mut agg, _) = aggregator();
        let stats = agg.record(OutcomeKind::Completed, 1800, date(2024, 1, 1));
        assert_eq!(stats.total_completed, 1);
        assert_eq!(stats.total_minutes, 30.0);
        let day = stats.day(date(2024, 1, 1)).unwrap();
        assert_eq!(day.completed, 1);
        assert_eq!(day.skipped, 0);
        assert_eq!(day.minutes, 30.0);
    }

    #[test]
    fn shown_only_counts_reminders() {
        let (mut agg, _) = aggregator();
        let stats = agg.record(OutcomeKind::Shown, 0, date(2024, 1, 1));
        assert_eq!(stats.total_reminders, 1);
        assert!(stats.daily_history.is_empty());
    }

    #[test]
    fn records_are_persisted_and_reloaded() {
        let (mut agg, kv) = aggregator();
        agg.record(OutcomeKind::Skipped, 0, date(2024, 3, 2));
        let reloaded = StatsAggregator::new(StatsStore::new(kv), AdaptivePolicy::default());
        assert_eq!(reloaded.stats().total_skipped, 1);
        assert_eq!(reloaded.stats().day(date(2024, 3, 2)).unwrap().skipped, 1);
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let (mut agg, kv) = aggregator();
        kv.set_fail_writes(true);
        let stats = agg.record(OutcomeKind::Completed, 60, date(2024, 1, 1));
        assert_eq!(stats.total_completed, 1);
        assert_eq!(agg.stats().total_completed, 1);

        kv.set_fail_writes(false);
        agg.record(OutcomeKind::Skipped, 0, date(2024, 1, 1));
        let persisted = StatsStore::new(kv).get().unwrap();
        assert_eq!(persisted.total_completed, 1);
        assert_eq!(persisted.total_skipped, 1);
    }

    #[test]
    fn reset_clears_everything() {
        let (mut agg, _) = aggregator();
        agg.record(OutcomeKind::Completed, 120, date(2024, 1, 1));
        let stats = agg.reset();
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn skip_grows_by_step_and_clamps() {
        let policy = AdaptivePolicy::default();
        let s = smart(45);
        assert_eq!(policy.feedback(OutcomeKind::Skipped, &s, 45), Some(Rearm::At(60)));
        assert_eq!(policy.feedback(OutcomeKind::Skipped, &s, 110), Some(Rearm::At(120)));
        assert_eq!(policy.feedback(OutcomeKind::Skipped, &s, 120), Some(Rearm::At(120)));
    }

    #[test]
    fn complete_resets_only_grown_interval() {
        let policy = AdaptivePolicy::default();
        let s = smart(45);
        assert_eq!(policy.feedback(OutcomeKind::Completed, &s, 75), Some(Rearm::At(45)));
        assert_eq!(policy.feedback(OutcomeKind::Completed, &s, 45), Some(Rearm::Unchanged));
    }

    #[test]
    fn non_smart_outcomes_rearm_unchanged() {
        let policy = AdaptivePolicy::default();
        let s = Settings::default();
        assert_eq!(policy.feedback(OutcomeKind::Skipped, &s, 45), Some(Rearm::Unchanged));
        assert_eq!(policy.feedback(OutcomeKind::Completed, &s, 45), Some(Rearm::Unchanged));
        assert_eq!(policy.feedback(OutcomeKind::Shown, &s, 45), None);
    }

    #[test]
    fn baseline_above_max_is_capped_on_skip() {
        let policy = AdaptivePolicy::default();
        assert_eq!(policy.feedback(OutcomeKind::Skipped, &smart(150), 150), Some(Rearm::At(120)));
        assert_eq!(policy.feedback(OutcomeKind::Completed, &smart(150), 120), Some(Rearm::Unchanged));
        assert_eq!(policy.clamp(150, 150), 120);
        assert_eq!(policy.clamp(45, 10), 45);
    }
}
