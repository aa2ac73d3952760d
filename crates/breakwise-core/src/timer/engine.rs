//! Reminder timer engine.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads: deadlines live in a [`TimerTable`] and the host is responsible for
//! calling `tick(now)` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Armed -> AwaitingOutcome -> Armed ...
//! Armed | Stopped -> Paused -> Armed (when the pause elapses)
//! Armed | AwaitingOutcome | Paused -> Stopped
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(&settings, AdaptivePolicy::default());
//! engine.start(&settings, None, clock.now());
//! // In a loop:
//! for expiry in engine.tick(clock.now()) { /* react */ }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::table::{TimerPurpose, TimerTable};
use crate::events::Event;
use crate::settings::Settings;
use crate::stats::AdaptivePolicy;

/// Longest accepted pause (one year).
pub const MAX_PAUSE_MS: u64 = 366 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerPhase {
    Stopped,
    /// Countdown ticking toward the next reminder.
    Armed,
    /// Reminders suspended; resumes automatically.
    Paused,
    /// Reminder shown, waiting for the user to complete or skip it.
    /// There is no timeout: an unanswered reminder holds the engine here.
    AwaitingOutcome,
}

/// A timer that became due during `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The countdown fired; the engine is now awaiting an outcome.
    ReminderDue,
    /// The pause elapsed; the host should restart the countdown.
    PauseElapsed,
    TipDue,
}

/// Serializable view of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub running: bool,
    pub current_interval_minutes: u32,
    pub target: Option<DateTime<Utc>>,
    pub paused_until: Option<DateTime<Utc>>,
    pub remaining_ms: u64,
    pub tips_active: bool,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    phase: TimerPhase,
    /// Effective interval. Diverges from the baseline only under smart mode.
    current_interval_minutes: u32,
    target: Option<DateTime<Utc>>,
    paused_until: Option<DateTime<Utc>>,
    timers: TimerTable,
    policy: AdaptivePolicy,
}

impl TimerEngine {
    /// Create a stopped engine tracking the baseline interval.
    pub fn new(settings: &Settings, policy: AdaptivePolicy) -> Self {
        Self {
            phase: TimerPhase::Stopped,
            current_interval_minutes: settings.interval_minutes,
            target: None,
            paused_until: None,
            timers: TimerTable::new(),
            policy,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Armed
    }

    pub fn current_interval_minutes(&self) -> u32 {
        self.current_interval_minutes
    }

    pub fn target(&self) -> Option<DateTime<Utc>> {
        self.target
    }

    pub fn paused_until(&self) -> Option<DateTime<Utc>> {
        self.paused_until
    }

    pub fn timers(&self) -> &TimerTable {
        &self.timers
    }

    /// Whether a completed/skipped report would be accepted.
    pub fn accepts_outcome(&self) -> bool {
        self.phase == TimerPhase::AwaitingOutcome
    }

    pub fn remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        self.target
            .map(|target| (target - now).num_milliseconds().max(0) as u64)
            .unwrap_or(0)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            running: self.is_running(),
            current_interval_minutes: self.current_interval_minutes,
            target: self.target,
            paused_until: self.paused_until,
            remaining_ms: self.remaining_ms(now),
            tips_active: self.timers.is_pending(TimerPurpose::Motivational),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the countdown, replacing any countdown or pause.
    ///
    /// Duration is the override when given, the remembered interval under
    /// smart mode, and the baseline otherwise. The chosen duration becomes
    /// the tracked interval.
    pub fn start(
        &mut self,
        settings: &Settings,
        override_minutes: Option<u32>,
        now: DateTime<Utc>,
    ) -> Event {
        self.cancel_countdown();

        let baseline = settings.interval_minutes.max(1);
        let minutes = match override_minutes {
            Some(minutes) => minutes.max(1),
            None if settings.smart_mode => {
                self.policy.clamp(baseline, self.current_interval_minutes)
            }
            None => baseline,
        };
        self.current_interval_minutes = minutes;

        let target = now + Duration::minutes(minutes as i64);
        self.timers.schedule_once(TimerPurpose::Reminder, target);
        self.target = Some(target);
        self.phase = TimerPhase::Armed;

        tracing::info!(minutes, %target, "Reminder countdown armed");
        Event::TimerArmed {
            target,
            interval_minutes: minutes,
        }
    }

    /// Cancel the countdown and any pending resume.
    pub fn stop(&mut self) -> Event {
        self.cancel_countdown();
        if self.phase != TimerPhase::Stopped {
            tracing::info!(from = ?self.phase, "Reminder timer stopped");
        }
        self.phase = TimerPhase::Stopped;
        Event::TimerStopped
    }

    /// Stop, then resume automatically after `duration_ms`.
    ///
    /// A second call replaces the pending resume.
    pub fn pause_for(&mut self, duration_ms: u64, now: DateTime<Utc>) -> Vec<Event> {
        let stopped = self.stop();

        let duration_ms = duration_ms.min(MAX_PAUSE_MS);
        let resume_at = now + Duration::milliseconds(duration_ms as i64);
        self.timers.schedule_once(TimerPurpose::PauseResume, resume_at);
        self.paused_until = Some(resume_at);
        self.phase = TimerPhase::Paused;

        tracing::info!(minutes = duration_ms / 60_000, %resume_at, "Reminders paused");
        vec![
            stopped,
            Event::TimerPaused {
                duration_ms,
                resume_at,
            },
        ]
    }

    /// Start or stop the repeating motivational tip timer.
    pub fn set_tips(&mut self, enabled: bool, every: Duration, now: DateTime<Utc>) {
        if enabled {
            self.timers
                .schedule_repeating(TimerPurpose::Motivational, now + every, every);
        } else {
            self.timers.cancel(TimerPurpose::Motivational);
        }
    }

    /// Bring the tracked interval back in line after a settings change.
    pub fn align_interval(&mut self, settings: &Settings) {
        self.current_interval_minutes = if settings.smart_mode {
            self.policy
                .clamp(settings.interval_minutes, self.current_interval_minutes)
        } else {
            settings.interval_minutes
        };
    }

    /// Fire every timer due at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Expiry> {
        let mut fired = Vec::new();
        for purpose in self.timers.take_due(now) {
            match purpose {
                TimerPurpose::Reminder if self.phase == TimerPhase::Armed => {
                    self.target = None;
                    self.phase = TimerPhase::AwaitingOutcome;
                    tracing::info!("Reminder due, awaiting outcome");
                    fired.push(Expiry::ReminderDue);
                }
                TimerPurpose::PauseResume if self.phase == TimerPhase::Paused => {
                    self.paused_until = None;
                    self.phase = TimerPhase::Stopped;
                    tracing::info!("Pause elapsed");
                    fired.push(Expiry::PauseElapsed);
                }
                TimerPurpose::Motivational => fired.push(Expiry::TipDue),
                other => {
                    tracing::warn!(purpose = ?other, phase = ?self.phase, "Dropping timer that no longer matches engine state");
                }
            }
        }
        fired
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cancel_countdown(&mut self) {
        self.timers.cancel(TimerPurpose::Reminder);
        self.timers.cancel(TimerPurpose::PauseResume);
        self.target = None;
        self.paused_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn settings(interval: u32, smart: bool) -> Settings {
        Settings {
            interval_minutes: interval,
            smart_mode: smart,
            enabled: true,
            ..Settings::default()
        }
    }

    fn engine(s: &Settings) -> TimerEngine {
        TimerEngine::new(s, AdaptivePolicy::default())
    }

    #[test]
    fn start_arms_countdown() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        assert_eq!(engine.phase(), TimerPhase::Stopped);

        let event = engine.start(&s, None, t0());
        let expected = t0() + Duration::minutes(45);
        assert_eq!(
            event,
            Event::TimerArmed {
                target: expected,
                interval_minutes: 45
            }
        );
        assert!(engine.is_running());
        assert_eq!(engine.target(), Some(expected));
        assert_eq!(engine.remaining_ms(t0()), 45 * 60 * 1000);
    }

    #[test]
    fn start_then_stop_never_fires() {
        let s = settings(1, false);
        let mut engine = engine(&s);
        engine.start(&s, None, t0());
        assert_eq!(engine.stop(), Event::TimerStopped);
        assert!(!engine.is_running());
        assert!(engine.target().is_none());
        assert!(engine.tick(t0() + Duration::hours(5)).is_empty());
        assert_eq!(engine.stop(), Event::TimerStopped);
        assert_eq!(engine.phase(), TimerPhase::Stopped);
    }

    #[test]
    fn expiry_moves_to_awaiting_outcome() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        engine.start(&s, None, t0());
        assert!(engine.tick(t0() + Duration::minutes(44)).is_empty());
        assert_eq!(
            engine.tick(t0() + Duration::minutes(45)),
            vec![Expiry::ReminderDue]
        );
        assert_eq!(engine.phase(), TimerPhase::AwaitingOutcome);
        assert!(engine.accepts_outcome());
        assert!(engine.target().is_none());
        // Nothing re-arms until an outcome arrives.
        assert!(engine.tick(t0() + Duration::hours(3)).is_empty());
    }

    #[test]
    fn override_becomes_tracked_interval() {
        let s = settings(45, true);
        let mut engine = engine(&s);
        engine.start(&s, Some(60), t0());
        assert_eq!(engine.current_interval_minutes(), 60);
        engine.start(&s, None, t0());
        assert_eq!(engine.current_interval_minutes(), 60);
    }

    #[test]
    fn non_smart_start_uses_baseline() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        engine.start(&s, Some(90), t0());
        engine.start(&s, None, t0());
        assert_eq!(engine.current_interval_minutes(), 45);
    }

    #[test]
    fn smart_start_clamps_into_range() {
        let mut engine = engine(&settings(45, true));
        engine.start(&settings(45, true), Some(105), t0());
        // Baseline raised above the remembered interval.
        engine.start(&settings(110, true), None, t0());
        assert_eq!(engine.current_interval_minutes(), 110);
    }

    #[test]
    fn pause_cancels_countdown_and_resumes_once() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        engine.start(&s, None, t0());

        let events = engine.pause_for(30 * 60 * 1000, t0());
        assert_eq!(events[0], Event::TimerStopped);
        assert!(matches!(events[1], Event::TimerPaused { duration_ms, .. } if duration_ms == 1_800_000));
        assert_eq!(engine.phase(), TimerPhase::Paused);
        assert!(!engine.timers().is_pending(TimerPurpose::Reminder));

        // The armed countdown deadline passes without firing.
        assert!(engine.tick(t0() + Duration::minutes(29)).is_empty());
        assert_eq!(
            engine.tick(t0() + Duration::minutes(30)),
            vec![Expiry::PauseElapsed]
        );
        assert_eq!(engine.phase(), TimerPhase::Stopped);
        assert!(engine.paused_until().is_none());
    }

    #[test]
    fn second_pause_replaces_first() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        engine.pause_for(30 * 60 * 1000, t0());
        engine.pause_for(60 * 60 * 1000, t0() + Duration::minutes(10));
        assert!(engine.tick(t0() + Duration::minutes(30)).is_empty());
        assert_eq!(
            engine.tick(t0() + Duration::minutes(70)),
            vec![Expiry::PauseElapsed]
        );
        assert!(engine.tick(t0() + Duration::minutes(200)).is_empty());
    }

    #[test]
    fn stop_cancels_pending_resume() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        engine.pause_for(60_000, t0());
        engine.stop();
        assert!(engine.tick(t0() + Duration::minutes(5)).is_empty());
        assert_eq!(engine.phase(), TimerPhase::Stopped);
    }

    #[test]
    fn start_during_pause_cancels_resume() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        engine.pause_for(60_000, t0());
        engine.start(&s, None, t0());
        assert!(engine.paused_until().is_none());
        assert!(!engine.timers().is_pending(TimerPurpose::PauseResume));
    }

    #[test]
    fn tips_repeat_independently_of_countdown() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        engine.set_tips(true, Duration::minutes(30), t0());
        engine.start(&s, None, t0());
        engine.stop();
        assert_eq!(engine.tick(t0() + Duration::minutes(30)), vec![Expiry::TipDue]);
        assert_eq!(engine.tick(t0() + Duration::minutes(60)), vec![Expiry::TipDue]);
        engine.set_tips(false, Duration::minutes(30), t0());
        assert!(engine.tick(t0() + Duration::minutes(90)).is_empty());
    }

    #[test]
    fn align_interval_tracks_baseline_without_smart_mode() {
        let mut engine = engine(&settings(45, true));
        engine.start(&settings(45, true), Some(90), t0());
        engine.align_interval(&settings(30, false));
        assert_eq!(engine.current_interval_minutes(), 30);
    }

    #[test]
    fn snapshot_reports_state() {
        let s = settings(45, false);
        let mut engine = engine(&s);
        engine.start(&s, None, t0());
        let snap = engine.snapshot(t0() + Duration::minutes(15));
        assert_eq!(snap.phase, TimerPhase::Armed);
        assert!(snap.running);
        assert_eq!(snap.remaining_ms, 30 * 60 * 1000);
        assert!(!snap.tips_active);
    }
}
