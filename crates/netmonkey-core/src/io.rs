//! Injectable time and randomness
//!
//! TigerStyle: All non-deterministic inputs go through abstraction traits.
//!
//! The stage never reads the platform clock or an ambient RNG. Delays and the
//! connectivity re-enable timer go through [`TimeProvider`]; the trigger gate
//! and the weighted rule pick go through [`RngProvider`]. Production wiring
//! uses [`WallClockTime`] and [`StdRngProvider`]; the `netmonkey-dst` crate
//! swaps in simulated versions without touching stage code.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// xorshift has a fixed point at zero, so a zero seed is replaced with this
const RNG_SEED_ZERO_REPLACEMENT: u64 = 0x9E37_79B9_7F4A_7C15;

// ============================================================================
// Time
// ============================================================================

/// Source of the current time and of waits
#[async_trait]
pub trait TimeProvider: Send + Sync + std::fmt::Debug {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> u64;

    /// Suspend the calling task for `ms` milliseconds
    ///
    /// Only the calling task waits; other calls through the stage proceed.
    async fn sleep_ms(&self, ms: u64);
}

/// System clock and tokio timers
#[derive(Debug, Clone, Default)]
pub struct WallClockTime;

impl WallClockTime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TimeProvider for WallClockTime {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }

    async fn sleep_ms(&self, ms: u64) {
        if ms == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

// ============================================================================
// Randomness
// ============================================================================

/// Source of uniform samples for the gate and the selector
///
/// Shared by concurrent calls. Each draw is serialized inside the provider,
/// so two calls never observe the same sample.
pub trait RngProvider: Send + Sync + std::fmt::Debug {
    fn next_u64(&self) -> u64;

    /// Uniform sample in [0, 1) built from the top 53 bits of `next_u64`
    fn next_f64(&self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Draw one sample from `rng`, clamped into [0, 1)
///
/// Providers that override `next_f64` are not trusted to stay in range.
pub fn sample(rng: &dyn RngProvider) -> f64 {
    let value = rng.next_f64();
    if value.is_nan() || value < 0.0 {
        0.0
    } else if value >= 1.0 {
        f64::from_bits(1.0f64.to_bits() - 1)
    } else {
        value
    }
}

/// Lock-free xorshift64* generator
///
/// Fast enough to sit on every outgoing call. Not for security use.
#[derive(Debug)]
pub struct StdRngProvider {
    state: AtomicU64,
}

impl Default for StdRngProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StdRngProvider {
    /// Seeded from the system clock
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: u64) -> Self {
        let seed = if seed == 0 {
            RNG_SEED_ZERO_REPLACEMENT
        } else {
            seed
        };
        Self {
            state: AtomicU64::new(seed),
        }
    }

    fn step(mut x: u64) -> u64 {
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        x
    }
}

impl RngProvider for StdRngProvider {
    fn next_u64(&self) -> u64 {
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let next = Self::step(current);
            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next.wrapping_mul(0x2545_F491_4F6C_DD1D),
                Err(observed) => current = observed,
            }
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// Time and randomness handed to a stage at construction
#[derive(Clone)]
pub struct IoContext {
    pub time: Arc<dyn TimeProvider>,
    pub rng: Arc<dyn RngProvider>,
}

impl std::fmt::Debug for IoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoContext")
            .field("time", &self.time)
            .field("rng", &self.rng)
            .finish()
    }
}

impl Default for IoContext {
    fn default() -> Self {
        Self::production()
    }
}

impl IoContext {
    /// Wall clock and a clock-seeded generator
    pub fn production() -> Self {
        Self::new(Arc::new(WallClockTime::new()), Arc::new(StdRngProvider::new()))
    }

    /// Wall clock and a fixed-seed generator
    pub fn seeded(seed: u64) -> Self {
        Self::new(
            Arc::new(WallClockTime::new()),
            Arc::new(StdRngProvider::with_seed(seed)),
        )
    }

    pub fn new(time: Arc<dyn TimeProvider>, rng: Arc<dyn RngProvider>) -> Self {
        Self { time, rng }
    }
}
