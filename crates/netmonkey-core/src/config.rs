//! Configuration for NetMonkey
//!
//! TigerStyle: Explicit defaults, validation, reasonable limits.

use crate::constants::*;
use crate::error::{Error, Result};
use crate::fault::{FaultKind, RuleConfig};
use serde::{Deserialize, Serialize};

/// Main configuration for the fault-injection stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonkeyConfig {
    /// Trigger gate configuration
    #[serde(default)]
    pub trigger: TriggerConfig,

    /// Fault categories and custom rules
    #[serde(default)]
    pub faults: FaultsConfig,

    /// Connectivity drop configuration
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// Deterministic overrides for test scenarios
    #[serde(default)]
    pub test_mode: Option<TestMode>,
}

impl MonkeyConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.trigger.validate()?;
        self.faults.validate()?;
        self.connectivity.validate()?;
        if let Some(test_mode) = &self.test_mode {
            test_mode.validate()?;
        }
        Ok(())
    }
}

fn validate_probability(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(Error::invalid_configuration(
            field,
            format!("{} is not a probability in [0, 1]", value),
        ));
    }
    Ok(())
}

fn validate_status_code(field: &str, code: u16) -> Result<()> {
    if !(STATUS_CODE_MIN..=STATUS_CODE_MAX).contains(&code) {
        return Err(Error::invalid_configuration(
            field,
            format!(
                "{} is outside {}..={}",
                code, STATUS_CODE_MIN, STATUS_CODE_MAX
            ),
        ));
    }
    Ok(())
}

/// Trigger gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Probability that a fault fires on a call in normal mode
    #[serde(default = "default_base_probability")]
    pub base_probability: f64,

    /// Probability that a fault fires on a call in jerk mode
    #[serde(default = "default_jerk_probability")]
    pub jerk_probability: f64,

    /// Start with jerk mode enabled
    #[serde(default)]
    pub jerk_mode: bool,
}

fn default_base_probability() -> f64 {
    TRIGGER_PROBABILITY_BASE_DEFAULT
}

fn default_jerk_probability() -> f64 {
    TRIGGER_PROBABILITY_JERK_DEFAULT
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            base_probability: default_base_probability(),
            jerk_probability: default_jerk_probability(),
            jerk_mode: false,
        }
    }
}

impl TriggerConfig {
    fn validate(&self) -> Result<()> {
        validate_probability("trigger.base_probability", self.base_probability)?;
        validate_probability("trigger.jerk_probability", self.jerk_probability)?;

        if self.jerk_probability < self.base_probability {
            return Err(Error::invalid_configuration(
                "trigger.jerk_probability",
                "must not be lower than base_probability",
            ));
        }
        Ok(())
    }
}

/// Fault categories and custom rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultsConfig {
    /// Fault kinds that may be applied; rules of other kinds never fire
    #[serde(default = "default_enabled_kinds")]
    pub enabled_kinds: Vec<FaultKind>,

    /// Custom rules, registered in order
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_enabled_kinds() -> Vec<FaultKind> {
    FaultKind::ALL.to_vec()
}

impl Default for FaultsConfig {
    fn default() -> Self {
        Self {
            enabled_kinds: default_enabled_kinds(),
            rules: Vec::new(),
        }
    }
}

impl FaultsConfig {
    fn validate(&self) -> Result<()> {
        if self.rules.len() > RULES_COUNT_MAX {
            return Err(Error::RulesCountExceeded {
                limit: RULES_COUNT_MAX,
            });
        }
        // Patterns and weights are checked when the rules are compiled
        Ok(())
    }
}

/// Connectivity drop configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Pause after connectivity is disabled, before the call is forwarded
    #[serde(default)]
    pub settle_ms: u64,
}

impl ConnectivityConfig {
    fn validate(&self) -> Result<()> {
        if self.settle_ms > CONNECTIVITY_SETTLE_MS_MAX {
            return Err(Error::invalid_configuration(
                "connectivity.settle_ms",
                format!(
                    "{} exceeds limit {}",
                    self.settle_ms, CONNECTIVITY_SETTLE_MS_MAX
                ),
            ));
        }
        Ok(())
    }
}

/// Deterministic overrides for test scenarios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestMode {
    /// Replaces both the base and the jerk trigger probability
    #[serde(default)]
    pub trigger_probability: Option<f64>,

    /// Replaces the code written by every status override
    #[serde(default)]
    pub status_code: Option<u16>,
}

impl TestMode {
    /// Every call with a matching rule triggers a fault
    pub fn always_trigger() -> Self {
        Self {
            trigger_probability: Some(1.0),
            status_code: None,
        }
    }

    /// Override the trigger probability
    pub fn with_trigger_probability(mut self, probability: f64) -> Self {
        self.trigger_probability = Some(probability);
        self
    }

    /// Override the status code written by status overrides
    pub fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Validate the overrides
    pub fn validate(&self) -> Result<()> {
        if let Some(probability) = self.trigger_probability {
            validate_probability("test_mode.trigger_probability", probability)?;
        }
        if let Some(code) = self.status_code {
            validate_status_code("test_mode.status_code", code)?;
        }
        Ok(())
    }
}

/// Check a status code written by a status override
pub fn validate_override_code(code: u16) -> Result<()> {
    validate_status_code("fault.code", code)
}
