//! # Breakwise Core Library
//!
//! This library provides the core logic for the Breakwise break reminder.
//! Every operation is available through the `breakwise` CLI, which is a thin
//! host over the same [`App`] any other surface would embed.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine over a purpose-keyed
//!   timer table. The host calls `tick()` periodically; nothing runs on its own.
//! - **Stats**: Outcome counters with per-day buckets, plus the smart-mode
//!   feedback that grows the interval after skips and resets it after breaks.
//! - **Storage**: SQLite key-value store for settings and stats, TOML for
//!   engine configuration.
//! - **Dispatch**: Best-effort fan-out of [`Event`]s to observer surfaces.
//!
//! ## Key Components
//!
//! - [`App`]: Application context implementing the inbound commands
//! - [`TimerEngine`]: Reminder state machine
//! - [`StatsAggregator`]: Sole writer of [`Stats`]
//! - [`NotificationDispatcher`]: Observer registry
//! - [`Config`]: Engine tunables

pub mod app;
pub mod autolaunch;
pub mod clock;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use app::{App, Command, Reply, Status};
pub use autolaunch::{AutoLaunch, MemoryAutoLaunch};
pub use clock::{Clock, ManualClock, SystemClock};
pub use content::{ContentProvider, Exercise, ExerciseKind, ExerciseLibrary};
pub use dispatch::{EventLog, NotificationDispatcher, Observer, Surface, SubscriptionId};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use settings::Settings;
pub use stats::{AdaptivePolicy, DayBucket, OutcomeKind, Rearm, Stats, StatsAggregator};
pub use storage::{Config, KeyValueStore, MemoryStore, SettingsStore, SqliteStore, StatsStore};
pub use timer::{Expiry, TimerEngine, TimerPhase, TimerSnapshot};
