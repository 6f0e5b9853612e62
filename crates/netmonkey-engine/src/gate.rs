//! Trigger gate
//!
//! TigerStyle: One draw per call, independent of how many rules match.

use netmonkey_core::io::sample;
use netmonkey_core::{Error, Result, RngProvider, TriggerConfig};
use std::sync::Arc;

/// Which probability the gate uses for a call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerMode {
    /// Normal operation
    Base,
    /// Jerk mode: faults fire more often
    Jerk,
    /// Test mode override
    Fixed(f64),
}

impl TriggerMode {
    /// A test override wins over jerk mode
    pub fn resolve(jerk_mode: bool, override_probability: Option<f64>) -> Self {
        match (override_probability, jerk_mode) {
            (Some(probability), _) => TriggerMode::Fixed(probability),
            (None, true) => TriggerMode::Jerk,
            (None, false) => TriggerMode::Base,
        }
    }
}

/// Decides whether any fault fires on a call
#[derive(Debug, Clone)]
pub struct TriggerGate {
    base_probability: f64,
    jerk_probability: f64,
    rng: Arc<dyn RngProvider>,
}

impl TriggerGate {
    /// Create a gate, rejecting probabilities outside [0, 1]
    pub fn new(
        base_probability: f64,
        jerk_probability: f64,
        rng: Arc<dyn RngProvider>,
    ) -> Result<Self> {
        for (field, value) in [
            ("trigger.base_probability", base_probability),
            ("trigger.jerk_probability", jerk_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::invalid_configuration(
                    field,
                    format!("{} is not a probability in [0, 1]", value),
                ));
            }
        }

        Ok(Self {
            base_probability,
            jerk_probability,
            rng,
        })
    }

    /// Create a gate from configuration
    pub fn from_config(config: &TriggerConfig, rng: Arc<dyn RngProvider>) -> Result<Self> {
        Self::new(config.base_probability, config.jerk_probability, rng)
    }

    /// Probability of acting under `mode`
    pub fn probability(&self, mode: TriggerMode) -> f64 {
        match mode {
            TriggerMode::Base => self.base_probability,
            TriggerMode::Jerk => self.jerk_probability,
            TriggerMode::Fixed(probability) => probability.clamp(0.0, 1.0),
        }
    }

    /// Draw exactly one sample and decide whether to act
    pub fn should_act(&self, mode: TriggerMode) -> bool {
        let probability = self.probability(mode);
        sample(self.rng.as_ref()) < probability
    }
}
