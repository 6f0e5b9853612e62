//! [`TimeProvider`] backed by the simulated clock
//!
//! TigerStyle: The stage's delays cost no wall-clock time.
//!
//! [`SimTime`] implements [`TimeProvider`] over a [`SimClock`] in one of two
//! modes:
//! - auto-advance: `sleep_ms` moves the clock forward and yields, so a
//!   delayed call completes instantly while still "taking" the right time
//! - manual: `sleep_ms` waits for the test to advance the clock, so a test
//!   can observe the world while a timer is pending

use crate::clock::SimClock;
use async_trait::async_trait;
use netmonkey_core::TimeProvider;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SleepMode {
    AutoAdvance,
    Manual,
}

/// Simulated time provider
#[derive(Clone, Debug)]
pub struct SimTime {
    clock: Arc<SimClock>,
    mode: SleepMode,
}

impl SimTime {
    /// Sleeping advances the clock instantly
    pub fn new(clock: Arc<SimClock>) -> Self {
        Self {
            clock,
            mode: SleepMode::AutoAdvance,
        }
    }

    /// Sleeping waits for the test to advance the clock
    pub fn manual(clock: Arc<SimClock>) -> Self {
        Self {
            clock,
            mode: SleepMode::Manual,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.mode == SleepMode::Manual
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }
}

#[async_trait]
impl TimeProvider for SimTime {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    async fn sleep_ms(&self, ms: u64) {
        match self.mode {
            SleepMode::AutoAdvance => {
                self.clock.advance_ms(ms);
                // Let other tasks observe the new time
                tokio::task::yield_now().await;
            }
            SleepMode::Manual => self.clock.sleep_ms(ms).await,
        }
    }
}
