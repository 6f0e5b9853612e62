//! Simulated wall clock
//!
//! TigerStyle: Time moves only when a test moves it.
//!
//! Cloning a [`SimClock`] shares the underlying time, so the stage's timers
//! and the test observe the same instant.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// 2024-01-01T00:00:00Z
const SIM_CLOCK_START_MS_DEFAULT: u64 = 1_704_067_200_000;

#[derive(Debug)]
struct ClockState {
    now_ms: AtomicU64,
    advanced: Notify,
}

/// Shared, manually advanced millisecond clock
#[derive(Debug, Clone)]
pub struct SimClock {
    state: Arc<ClockState>,
}

impl SimClock {
    /// Start at `start`; instants before the epoch clamp to zero
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::from_millis(start.timestamp_millis().max(0) as u64)
    }

    pub fn from_millis(start_ms: u64) -> Self {
        Self {
            state: Arc::new(ClockState {
                now_ms: AtomicU64::new(start_ms),
                advanced: Notify::new(),
            }),
        }
    }

    /// Current instant as a calendar time, for log lines and assertions
    pub fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms() as i64).unwrap_or_default()
    }

    pub fn now_ms(&self) -> u64 {
        self.state.now_ms.load(Ordering::SeqCst)
    }

    /// Move time forward and wake every pending [`SimClock::sleep_ms`]
    pub fn advance_ms(&self, ms: u64) {
        self.state.now_ms.fetch_add(ms, Ordering::SeqCst);
        self.state.advanced.notify_waiters();
    }

    /// Complete once the clock reaches the instant `ms` from now
    ///
    /// The deadline is fixed on first poll, so a sleeper must be polled before
    /// the test advances past it.
    pub async fn sleep_ms(&self, ms: u64) {
        let deadline_ms = self.now_ms().saturating_add(ms);
        loop {
            // Register before re-checking so an advance in between is not lost
            let advanced = self.state.advanced.notified();
            if self.now_ms() >= deadline_ms {
                return;
            }
            advanced.await;
        }
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::from_millis(SIM_CLOCK_START_MS_DEFAULT)
    }
}
