//! Randomness for simulation runs
//!
//! TigerStyle: One seed reproduces every gate and selector draw.
//!
//! [`DeterministicRng`] drives a whole run from a seed. [`ScriptedRng`] feeds
//! exact samples so a test can force individual decisions.

use netmonkey_core::RngProvider;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Environment variable holding a seed to replay
pub const DST_SEED_ENV: &str = "DST_SEED";

/// Seeded ChaCha20 stream shared by every clone
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    stream: Arc<Mutex<ChaCha20Rng>>,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stream: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
        }
    }

    /// Seed this stream was created from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn draw<T>(&self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen()
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RngProvider for DeterministicRng {
    fn next_u64(&self) -> u64 {
        self.draw()
    }

    fn next_f64(&self) -> f64 {
        self.draw()
    }
}

/// Seed from `DST_SEED` when set and numeric, otherwise a fresh random one
///
/// The chosen seed is logged so a failing run can be replayed.
pub fn seed_from_env_or_random() -> u64 {
    let seed = std::env::var(DST_SEED_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or_else(rand::random);

    tracing::info!(seed, "simulation seed (replay with {}={})", DST_SEED_ENV, seed);
    seed
}

/// Replays a fixed list of samples, wrapping at the end
#[derive(Debug)]
pub struct ScriptedRng {
    samples: Vec<f64>,
    drawn: AtomicUsize,
}

impl ScriptedRng {
    /// # Panics
    ///
    /// If `samples` is empty or holds a value outside [0, 1).
    pub fn new(samples: impl Into<Vec<f64>>) -> Self {
        let samples = samples.into();
        assert!(!samples.is_empty(), "scripted rng needs at least one sample");
        assert!(
            samples.iter().all(|s| (0.0..1.0).contains(s)),
            "scripted samples must be in [0, 1)"
        );
        Self {
            samples,
            drawn: AtomicUsize::new(0),
        }
    }

    /// Samples handed out so far
    pub fn draws(&self) -> usize {
        self.drawn.load(Ordering::SeqCst)
    }
}

impl RngProvider for ScriptedRng {
    fn next_u64(&self) -> u64 {
        (self.next_f64() * (1u64 << 53) as f64) as u64
    }

    fn next_f64(&self) -> f64 {
        let index = self.drawn.fetch_add(1, Ordering::SeqCst) % self.samples.len();
        self.samples[index]
    }
}
