//! Time source abstraction.
//!
//! Every deadline in the engine is computed from a [`Clock`] so that tests can
//! drive the whole reminder cycle deterministically with [`ManualClock`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current instant in the local timezone.
    fn now_local(&self) -> DateTime<Local> {
        self.now().with_timezone(&Local)
    }

    /// Calendar date used to key the daily statistics bucket.
    fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// `today()` is derived from the UTC date so results do not depend on the
/// timezone of the machine running the tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
