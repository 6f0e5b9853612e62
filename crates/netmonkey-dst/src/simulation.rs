//! Simulation harness for deterministic testing
//!
//! TigerStyle: Reproducible test execution with explicit configuration.
//!
//! A [`SimEnvironment`] wires a [`FaultInjectionStage`] to simulated time,
//! seeded randomness, a simulated connectivity switch and a simulated
//! upstream client. Same seed, same decisions.

use crate::clock::SimClock;
use crate::connectivity::SimConnectivity;
use crate::http::SimHttpClient;
use crate::rng::{seed_from_env_or_random, DeterministicRng};
use crate::time::SimTime;
use netmonkey_core::{IoContext, MonkeyConfig, Result, RngProvider, TimeProvider};
use netmonkey_engine::{FaultInjectionStage, MonkeyClient};
use std::sync::Arc;

/// Configuration for a simulation
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Stage configuration
    pub monkey: MonkeyConfig,
    /// Timers wait for [`SimEnvironment::advance_time_ms`] instead of
    /// completing instantly
    pub manual_time: bool,
}

impl SimConfig {
    /// Create a new simulation config with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            monkey: MonkeyConfig::default(),
            manual_time: false,
        }
    }

    /// Create config from DST_SEED environment variable or random
    pub fn from_env_or_random() -> Self {
        Self::new(seed_from_env_or_random())
    }

    pub fn with_monkey(mut self, monkey: MonkeyConfig) -> Self {
        self.monkey = monkey;
        self
    }

    pub fn with_manual_time(mut self) -> Self {
        self.manual_time = true;
        self
    }
}

/// Client type the environment hands out
pub type SimMonkeyClient = MonkeyClient<Arc<FaultInjectionStage>, Arc<SimHttpClient>>;

/// Everything a simulated run needs
#[derive(Debug)]
pub struct SimEnvironment {
    pub seed: u64,
    pub clock: Arc<SimClock>,
    pub rng: Arc<DeterministicRng>,
    pub connectivity: Arc<SimConnectivity>,
    pub http: Arc<SimHttpClient>,
    pub stage: Arc<FaultInjectionStage>,
    time: Arc<dyn TimeProvider>,
}

impl SimEnvironment {
    /// Build the environment and its stage
    pub fn new(config: SimConfig) -> Result<Self> {
        let clock = Arc::new(SimClock::default());
        let time: Arc<dyn TimeProvider> = if config.manual_time {
            Arc::new(SimTime::manual(clock.clone()))
        } else {
            Arc::new(SimTime::new(clock.clone()))
        };
        let rng = Arc::new(DeterministicRng::new(config.seed));
        let connectivity = Arc::new(SimConnectivity::new());
        let http = Arc::new(SimHttpClient::new().with_connectivity(connectivity.clone()));

        let rng_provider: Arc<dyn RngProvider> = rng.clone();
        let stage = FaultInjectionStage::builder()
            .config(config.monkey)
            .io(IoContext::new(time.clone(), rng_provider))
            .connectivity(connectivity.clone())
            .build()?;

        tracing::debug!(seed = config.seed, "Simulation environment ready");

        Ok(Self {
            seed: config.seed,
            clock,
            rng,
            connectivity,
            http,
            stage: Arc::new(stage),
            time,
        })
    }

    /// An HTTP client routed through the stage to the simulated upstream
    pub fn client(&self) -> SimMonkeyClient {
        MonkeyClient::new(self.stage.clone(), self.http.clone())
    }

    pub fn time(&self) -> &Arc<dyn TimeProvider> {
        &self.time
    }

    /// Advance simulated time
    pub fn advance_time_ms(&self, ms: u64) {
        self.clock.advance_ms(ms);
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}
