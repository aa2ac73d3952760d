//! Launch-at-login hook.
//!
//! Registering with the operating system is the host's job; the core only
//! decides when the registration must change.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;

pub trait AutoLaunch: Send {
    fn is_enabled(&self) -> Result<bool>;

    fn set_enabled(&mut self, enabled: bool) -> Result<()>;
}

/// Keeps the registration flag in process memory.
///
/// Clones share state, so a test can keep a handle and inspect what the
/// [`crate::App`] requested.
#[derive(Debug, Clone, Default)]
pub struct MemoryAutoLaunch {
    enabled: Arc<AtomicBool>,
    changes: Arc<AtomicUsize>,
}

impl MemoryAutoLaunch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
            changes: Arc::default(),
        }
    }

    /// Number of `set_enabled` calls so far.
    pub fn changes(&self) -> usize {
        self.changes.load(Ordering::SeqCst)
    }
}

impl AutoLaunch for MemoryAutoLaunch {
    fn is_enabled(&self) -> Result<bool> {
        Ok(self.enabled.load(Ordering::SeqCst))
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        tracing::info!(enabled, "Launch at login updated");
        self.enabled.store(enabled, Ordering::SeqCst);
        self.changes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Bring the registration in line with `wanted`. Returns whether it changed.
pub(crate) fn reconcile(hook: &mut dyn AutoLaunch, wanted: bool) -> Result<bool> {
    if hook.is_enabled()? == wanted {
        return Ok(false);
    }
    hook.set_enabled(wanted)?;
    Ok(true)
}
