//! Application context.
//!
//! [`App`] owns exactly one of each component and implements the inbound
//! commands. It is driven by a single host loop through `&mut self`: the host
//! forwards commands with [`App::handle`] and calls [`App::tick`] periodically.
//! Everything observable leaves through the [`NotificationDispatcher`].

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::autolaunch::{self, AutoLaunch, MemoryAutoLaunch};
use crate::clock::{Clock, SystemClock};
use crate::content::{self, ContentProvider, ExerciseLibrary};
use crate::dispatch::{NotificationDispatcher, Observer, SubscriptionId};
use crate::error::Result;
use crate::events::Event;
use crate::settings::Settings;
use crate::stats::{AdaptivePolicy, OutcomeKind, Rearm, Stats, StatsAggregator};
use crate::storage::{Config, EngineConfig, KeyValueStore, SettingsStore, SqliteStore, StatsStore};
use crate::timer::{Expiry, TimerEngine, TimerSnapshot};

/// Inbound command, as sent by any control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Command {
    /// Arm the countdown, optionally replacing the current settings first.
    StartTimer {
        #[serde(default)]
        settings: Option<Settings>,
    },
    StopTimer,
    PauseFor {
        duration_ms: u64,
    },
    PauseUntilTomorrow,
    /// Tray-style pause/resume of the enabled flag.
    ToggleEnabled,
    SaveSettings {
        settings: Settings,
    },
    LogOutcome {
        kind: OutcomeKind,
        #[serde(default, alias = "duration")]
        duration_seconds: u32,
    },
    ToggleWidget {
        show: bool,
    },
    ToggleMotivational {
        enabled: bool,
    },
    ResetSettings,
    ResetStats,
    GetSettings,
    GetStats,
    GetStatus,
}

/// Answer to a query command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "kebab-case")]
pub enum Reply {
    Settings { settings: Settings },
    Stats { stats: Stats },
    Status { status: Status },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub timer: TimerSnapshot,
    pub settings: Settings,
    pub completion_rate: u32,
    pub total_reminders: u64,
}

pub struct App {
    settings_store: SettingsStore,
    settings: Settings,
    stats: StatsAggregator,
    engine: TimerEngine,
    dispatcher: NotificationDispatcher,
    content: Box<dyn ContentProvider>,
    auto_launch: Box<dyn AutoLaunch>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    rng: StdRng,
}

impl App {
    /// Load settings and stats from `store`. Nothing is armed until [`App::boot`].
    pub fn new(store: Arc<dyn KeyValueStore>, config: EngineConfig) -> Self {
        let settings_store = SettingsStore::new(store.clone());
        let settings = settings_store.load();
        let policy = AdaptivePolicy::from_config(&config);
        let stats = StatsAggregator::new(StatsStore::new(store), policy);
        let engine = TimerEngine::new(&settings, policy);
        let mut dispatcher = NotificationDispatcher::new();
        dispatcher.set_widget_enabled(settings.show_widget);

        Self {
            settings_store,
            settings,
            stats,
            engine,
            dispatcher,
            content: Box::new(ExerciseLibrary::empty()),
            auto_launch: Box::new(MemoryAutoLaunch::default()),
            clock: Arc::new(SystemClock),
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Open the SQLite store in the data directory and wire the exercise
    /// library named by `config`.
    ///
    /// # Errors
    /// Returns an error if `config` fails validation or the database cannot
    /// be opened.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open()?);
        let app = Self::new(store, config.engine.clone());
        Ok(match config.exercises_path() {
            Some(path) => app.with_content(Box::new(ExerciseLibrary::from_file(path))),
            None => app,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_content(mut self, content: Box<dyn ContentProvider>) -> Self {
        self.content = content;
        self
    }

    pub fn with_auto_launch(mut self, auto_launch: Box<dyn AutoLaunch>) -> Self {
        self.auto_launch = auto_launch;
        self
    }

    /// Seed the tip picker.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        self.dispatcher.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &Stats {
        self.stats.stats()
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot(self.clock.now())
    }

    pub fn status(&self) -> Status {
        let stats = self.stats.stats();
        Status {
            timer: self.snapshot(),
            settings: self.settings.clone(),
            completion_rate: stats.completion_rate(),
            total_reminders: stats.total_reminders,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Startup: arm if enabled, show the widget, start tips and reconcile
    /// launch-at-login with the loaded settings.
    pub fn boot(&mut self) {
        tracing::info!(
            enabled = self.settings.enabled,
            interval = self.settings.interval_minutes,
            smart_mode = self.settings.smart_mode,
            "Booting reminder engine"
        );
        if self.settings.enabled {
            self.arm(None);
        }
        if self.settings.show_widget {
            self.set_widget(true);
        }
        if self.settings.motivational_tips_enabled {
            self.set_tips(true);
        }
        let wanted = self.settings.auto_launch;
        if let Err(e) = autolaunch::reconcile(self.auto_launch.as_mut(), wanted) {
            tracing::warn!("Failed to reconcile launch at login: {e}");
        }
    }

    /// Dispatch a command. Queries produce a [`Reply`].
    pub fn handle(&mut self, command: Command) -> Option<Reply> {
        tracing::debug!(?command, "Handling command");
        match command {
            Command::StartTimer { settings } => self.start_timer(settings),
            Command::StopTimer => self.stop_timer(),
            Command::PauseFor { duration_ms } => self.pause_for(duration_ms),
            Command::PauseUntilTomorrow => self.pause_until_tomorrow(),
            Command::ToggleEnabled => self.toggle_enabled(),
            Command::SaveSettings { settings } => self.save_settings(settings),
            Command::LogOutcome {
                kind,
                duration_seconds,
            } => self.log_outcome(kind, duration_seconds),
            Command::ToggleWidget { show } => self.toggle_widget(show),
            Command::ToggleMotivational { enabled } => self.toggle_motivational(enabled),
            Command::ResetSettings => self.reset_settings(),
            Command::ResetStats => self.reset_stats(),
            Command::GetSettings => {
                return Some(Reply::Settings {
                    settings: self.settings.clone(),
                })
            }
            Command::GetStats => {
                return Some(Reply::Stats {
                    stats: self.stats().clone(),
                })
            }
            Command::GetStatus => {
                return Some(Reply::Status {
                    status: self.status(),
                })
            }
        }
        None
    }

    /// Arm the countdown. Given settings replace the current ones and are
    /// saved; the current settings are re-saved otherwise.
    pub fn start_timer(&mut self, settings: Option<Settings>) {
        if let Some(settings) = settings {
            self.settings = settings.normalized();
        }
        self.persist_settings();
        self.arm(None);
    }

    /// Stop the countdown and persist `enabled = false`.
    pub fn stop_timer(&mut self) {
        let event = self.engine.stop();
        self.dispatcher.emit(&event);
        self.settings.enabled = false;
        self.persist_settings();
    }

    pub fn pause_for(&mut self, duration_ms: u64) {
        let events = self.engine.pause_for(duration_ms, self.clock.now());
        self.dispatcher.emit_all(events);
    }

    /// Pause until the configured hour of the next local day.
    pub fn pause_until_tomorrow(&mut self) {
        let wait = until_next_morning(&self.clock.now_local(), self.config.resume_hour);
        self.pause_for(wait.num_milliseconds().max(0) as u64);
    }

    pub fn toggle_enabled(&mut self) {
        if self.settings.enabled {
            let event = self.engine.stop();
            self.dispatcher.emit(&event);
            self.settings.enabled = false;
        } else {
            self.settings.enabled = true;
            self.arm(None);
        }
        self.persist_settings();
        self.dispatcher.emit(&Event::SettingsUpdated {
            settings: self.settings.clone(),
        });
    }

    /// Replace the settings and apply whatever changed.
    ///
    /// The countdown restarts exactly when reminders were switched on or the
    /// interval or smart mode changed, and stops whenever the new settings
    /// are disabled.
    pub fn save_settings(&mut self, next: Settings) {
        let next = next.normalized();
        let previous = std::mem::replace(&mut self.settings, next);
        self.persist_settings();

        let restart = previous.requires_restart(&self.settings);
        tracing::info!(restart, enabled = self.settings.enabled, "Settings saved");

        if previous.show_widget != self.settings.show_widget {
            self.set_widget(self.settings.show_widget);
        }
        if previous.motivational_tips_enabled != self.settings.motivational_tips_enabled {
            self.set_tips(self.settings.motivational_tips_enabled);
        }
        if previous.auto_launch != self.settings.auto_launch {
            if let Err(e) = self.auto_launch.set_enabled(self.settings.auto_launch) {
                tracing::warn!("Failed to update launch at login: {e}");
            }
        }

        self.engine.align_interval(&self.settings);
        if self.settings.enabled {
            if restart {
                self.arm(None);
            }
        } else {
            let event = self.engine.stop();
            self.dispatcher.emit(&event);
        }

        self.dispatcher.emit(&Event::SettingsUpdated {
            settings: self.settings.clone(),
        });
    }

    /// Record a reminder outcome.
    ///
    /// `shown` is counted when the reminder fires, so an inbound `shown` is
    /// ignored. `completed` and `skipped` are accepted while a reminder is
    /// awaiting an answer; they record, publish the new stats and re-arm with
    /// the smart-mode feedback. Anywhere else they are ignored.
    pub fn log_outcome(&mut self, kind: OutcomeKind, duration_seconds: u32) {
        if kind == OutcomeKind::Shown {
            tracing::debug!("Reminder was already counted when it fired");
            return;
        }
        if !self.engine.accepts_outcome() {
            tracing::warn!(%kind, phase = ?self.engine.phase(), "Ignoring outcome with no reminder awaiting an answer");
            return;
        }

        let stats = self.stats.record(kind, duration_seconds, self.clock.today());
        self.dispatcher.emit(&Event::StatsUpdated { stats });

        let current = self.engine.current_interval_minutes();
        match self.stats.feedback(kind, &self.settings, current) {
            Some(Rearm::At(minutes)) => {
                tracing::info!(%kind, from = current, to = minutes, "Smart mode adjusted interval");
                self.arm(Some(minutes));
            }
            Some(Rearm::Unchanged) => self.arm(None),
            None => {}
        }
    }

    pub fn toggle_widget(&mut self, show: bool) {
        self.settings.show_widget = show;
        self.persist_settings();
        self.set_widget(show);
    }

    pub fn toggle_motivational(&mut self, enabled: bool) {
        self.settings.motivational_tips_enabled = enabled;
        self.persist_settings();
        self.set_tips(enabled);
    }

    /// Restore default settings, applying them like any other save.
    pub fn reset_settings(&mut self) {
        self.save_settings(Settings::default());
    }

    pub fn reset_stats(&mut self) {
        let stats = self.stats.reset();
        self.dispatcher.emit(&Event::StatsUpdated { stats });
    }

    /// Fire every due timer and publish the result.
    pub fn tick(&mut self) -> Vec<Expiry> {
        let now = self.clock.now();
        let fired = self.engine.tick(now);
        for expiry in &fired {
            match expiry {
                Expiry::ReminderDue => {
                    let exercise = self.content.next_exercise();
                    tracing::info!(title = %exercise.title, "Showing reminder");
                    self.dispatcher.emit(&Event::ReminderShown {
                        exercise,
                        settings: self.settings.clone(),
                    });
                    let stats = self.stats.record(OutcomeKind::Shown, 0, self.clock.today());
                    self.dispatcher.emit(&Event::StatsUpdated { stats });
                }
                Expiry::PauseElapsed => {
                    self.arm(None);
                    self.dispatcher.emit(&Event::RemindersEnabled { at: now });
                }
                Expiry::TipDue => {
                    let message = content::random_tip(&mut self.rng).to_string();
                    self.dispatcher.emit(&Event::MotivationalTip { message, at: now });
                }
            }
        }
        fired
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm(&mut self, override_minutes: Option<u32>) {
        let event = self
            .engine
            .start(&self.settings, override_minutes, self.clock.now());
        self.dispatcher.emit(&event);
    }

    fn set_widget(&mut self, visible: bool) {
        self.dispatcher.set_widget_enabled(visible);
        self.dispatcher.emit(&Event::WidgetToggled {
            visible,
            target: self.engine.target(),
        });
    }

    fn set_tips(&mut self, enabled: bool) {
        let every = Duration::minutes(self.config.motivational_interval_minutes.max(1) as i64);
        self.engine.set_tips(enabled, every, self.clock.now());
        tracing::info!(enabled, "Motivational tips toggled");
    }

    fn persist_settings(&self) {
        if let Err(e) = self.settings_store.save(&self.settings) {
            tracing::warn!("Failed to persist settings: {e}");
        }
    }
}

/// Time from `now` until `hour:00` on the following calendar day in `now`'s
/// timezone. Falls back to one day when that local time does not exist.
pub fn until_next_morning<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> Duration {
    let resume = now
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(hour, 0, 0))
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest());
    match resume {
        Some(at) => at.naive_utc() - now.naive_utc(),
        None => Duration::days(1),
    }
}
