mod engine;
mod table;

pub use engine::{Expiry, TimerEngine, TimerPhase, TimerSnapshot, MAX_PAUSE_MS};
pub use table::{TimerPurpose, TimerTable};
