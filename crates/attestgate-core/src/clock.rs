use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond wall-clock source. Ledger expiry is classified against this,
/// so tests substitute a fixed or manually advanced clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|v| v.as_millis() as u64)
            .unwrap_or(0)
    }
}
