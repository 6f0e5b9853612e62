//! Fault-injection stage
//!
//! TigerStyle: Match, gate, select, execute. In that order, once per call.
//!
//! [`FaultInjectionStage`] is the public entry point. It owns the rule
//! registry and composes the gate, the selector and the executor around a
//! single forwarded call:
//!
//! 1. Collect enabled, selectable rules matching the request
//! 2. No candidates: pass through without drawing
//! 3. A mandatory candidate is applied without consulting the gate
//! 4. Otherwise the gate draws once; a miss passes through
//! 5. The selector draws once to pick a rule, the executor applies it

use crate::connectivity::{ConnectivityController, NoConnectivity};
use crate::executor::{FaultExecutor, FaultOutcome};
use crate::gate::{TriggerGate, TriggerMode};
use crate::registry::{RuleRegistry, RuleStats};
use crate::rule::{Rule, RuleId};
use crate::selector::ActionSelector;
use netmonkey_core::constants::{CONNECTIVITY_OFF_MS_DEFAULT, STATUS_OVERRIDE_CODE_DEFAULT};
use netmonkey_core::{
    Chain, Fault, FaultKind, HttpRequest, HttpResponse, HttpResult, IoContext, MonkeyConfig,
    Result, RuleConfig, TestMode,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

// =============================================================================
// Statistics
// =============================================================================

/// Point-in-time counters for a stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Calls that entered the stage
    pub intercepted: u64,
    /// Calls for which a rule was chosen
    pub triggered: u64,
    /// Calls forwarded without modification
    pub passed_through: u64,
    pub delayed: u64,
    pub connectivity_dropped: u64,
    pub connectivity_unavailable: u64,
    pub short_circuited: u64,
    pub status_overridden: u64,
    pub status_preserved: u64,
}

impl StageStats {
    /// Calls that were actually perturbed
    pub fn applied(&self) -> u64 {
        self.delayed + self.connectivity_dropped + self.short_circuited + self.status_overridden
    }
}

#[derive(Debug, Default)]
struct StageCounters {
    intercepted: AtomicU64,
    triggered: AtomicU64,
    passed_through: AtomicU64,
    delayed: AtomicU64,
    connectivity_dropped: AtomicU64,
    connectivity_unavailable: AtomicU64,
    short_circuited: AtomicU64,
    status_overridden: AtomicU64,
    status_preserved: AtomicU64,
}

impl StageCounters {
    fn record(&self, outcome: &FaultOutcome) {
        let counter = match outcome {
            FaultOutcome::PassedThrough => &self.passed_through,
            FaultOutcome::Delayed { .. } => &self.delayed,
            FaultOutcome::ConnectivityDropped { .. } => &self.connectivity_dropped,
            FaultOutcome::ConnectivityUnavailable => &self.connectivity_unavailable,
            FaultOutcome::ShortCircuited => &self.short_circuited,
            FaultOutcome::StatusOverridden { .. } => &self.status_overridden,
            FaultOutcome::StatusPreserved { .. } => &self.status_preserved,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StageStats {
        StageStats {
            intercepted: self.intercepted.load(Ordering::Relaxed),
            triggered: self.triggered.load(Ordering::Relaxed),
            passed_through: self.passed_through.load(Ordering::Relaxed),
            delayed: self.delayed.load(Ordering::Relaxed),
            connectivity_dropped: self.connectivity_dropped.load(Ordering::Relaxed),
            connectivity_unavailable: self.connectivity_unavailable.load(Ordering::Relaxed),
            short_circuited: self.short_circuited.load(Ordering::Relaxed),
            status_overridden: self.status_overridden.load(Ordering::Relaxed),
            status_preserved: self.status_preserved.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Stage
// =============================================================================

/// Chaos stage for an HTTP client pipeline
#[derive(Debug)]
pub struct FaultInjectionStage {
    registry: RuleRegistry,
    gate: TriggerGate,
    selector: ActionSelector,
    executor: FaultExecutor,
    jerk_mode: AtomicBool,
    test_mode: RwLock<Option<TestMode>>,
    counters: StageCounters,
}

impl FaultInjectionStage {
    /// Start building a stage
    pub fn builder() -> FaultInjectionStageBuilder {
        FaultInjectionStageBuilder::new()
    }

    /// Stage with default configuration and production I/O
    pub fn production() -> Result<Self> {
        Self::builder().build()
    }

    /// Run one call through the stage
    pub async fn intercept<C: Chain>(&self, chain: C) -> HttpResult<HttpResponse> {
        self.counters.intercepted.fetch_add(1, Ordering::Relaxed);

        let (trigger_override, status_override) = self.test_overrides();
        let chosen = self.choose(chain.request(), trigger_override);
        if chosen.is_some() {
            self.counters.triggered.fetch_add(1, Ordering::Relaxed);
        }

        let execution = self
            .executor
            .execute(chosen.as_deref(), chain, status_override)
            .await;

        if let Some(rule) = &chosen {
            if execution.outcome.is_applied() {
                rule.record_applied();
            }
        }
        self.counters.record(&execution.outcome);

        execution.result
    }

    fn choose(&self, request: &HttpRequest, trigger_override: Option<f64>) -> Option<Arc<Rule>> {
        let candidates: Vec<Arc<Rule>> = self
            .registry
            .matching_enabled(request)
            .into_iter()
            .filter(|rule| rule.is_selectable())
            .collect();

        if candidates.is_empty() {
            tracing::trace!(method = %request.method, url = %request.url, "No matching rules");
            return None;
        }

        if let Some(rule) = candidates.iter().find(|rule| rule.is_mandatory()) {
            return Some(rule.clone());
        }

        let mode = TriggerMode::resolve(self.is_jerk_mode(), trigger_override);
        if !self.gate.should_act(mode) {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                candidates = candidates.len(),
                "Gate closed, passing through"
            );
            return None;
        }

        self.selector.select(&candidates).cloned()
    }

    fn test_overrides(&self) -> (Option<f64>, Option<u16>) {
        let test_mode = self.test_mode.read().unwrap_or_else(PoisonError::into_inner);
        match test_mode.as_ref() {
            Some(mode) => (mode.trigger_probability, mode.status_code),
            None => (None, None),
        }
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Register a custom rule
    pub fn register(&self, config: RuleConfig) -> Result<RuleId> {
        self.registry.register(&config)
    }

    pub fn set_rule_enabled(&self, id: RuleId, enabled: bool) -> Result<()> {
        self.registry.set_enabled(id, enabled)
    }

    pub fn set_kind_enabled(&self, kind: FaultKind, enabled: bool) {
        self.registry.set_kind_enabled(kind, enabled);
    }

    /// Successful responses on any request come back with `code`
    pub fn monkey_with_response_code(&self, code: u16) -> Result<RuleId> {
        self.register(RuleConfig::new(Fault::StatusOverride { code }))
    }

    /// Successful responses on any request come back as 404
    pub fn monkey_with_default_response_code(&self) -> Result<RuleId> {
        self.monkey_with_response_code(STATUS_OVERRIDE_CODE_DEFAULT)
    }

    /// Any request is held for `delay_ms` first
    pub fn monkey_with_response_time(&self, delay_ms: u64) -> Result<RuleId> {
        self.register(RuleConfig::new(Fault::Delay {
            duration_ms: delay_ms,
        }))
    }

    /// Any request fails with a synthetic transport error
    pub fn monkey_with_request_success(&self) -> Result<RuleId> {
        self.register(RuleConfig::new(Fault::ForcedFailure))
    }

    /// Any request takes connectivity down for `off_ms`
    pub fn monkey_with_connectivity(&self, off_ms: u64) -> Result<RuleId> {
        self.register(RuleConfig::new(Fault::ConnectivityDrop { off_ms }))
    }

    /// Take connectivity down for the default duration
    pub fn monkey_with_default_connectivity(&self) -> Result<RuleId> {
        self.monkey_with_connectivity(CONNECTIVITY_OFF_MS_DEFAULT)
    }

    // =========================================================================
    // Modes
    // =========================================================================

    pub fn enable_jerk_mode(&self) {
        self.set_jerk_mode(true);
    }

    pub fn set_jerk_mode(&self, enabled: bool) {
        self.jerk_mode.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "Jerk mode toggled");
    }

    pub fn is_jerk_mode(&self) -> bool {
        self.jerk_mode.load(Ordering::SeqCst)
    }

    /// Apply deterministic overrides, replacing any previous ones
    pub fn enable_test_mode(&self, test_mode: TestMode) -> Result<()> {
        test_mode.validate()?;
        tracing::info!(?test_mode, "Test mode enabled");
        *self.test_mode.write().unwrap_or_else(PoisonError::into_inner) = Some(test_mode);
        Ok(())
    }

    pub fn disable_test_mode(&self) {
        *self.test_mode.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("Test mode disabled");
    }

    pub fn test_mode(&self) -> Option<TestMode> {
        self.test_mode
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn stats(&self) -> StageStats {
        self.counters.snapshot()
    }

    pub fn rules(&self) -> Vec<RuleStats> {
        self.registry.snapshot()
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Assembles a [`FaultInjectionStage`] from configuration and I/O providers
#[derive(Debug)]
pub struct FaultInjectionStageBuilder {
    config: MonkeyConfig,
    io: IoContext,
    connectivity: Arc<dyn ConnectivityController>,
}

impl Default for FaultInjectionStageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultInjectionStageBuilder {
    pub fn new() -> Self {
        Self {
            config: MonkeyConfig::default(),
            io: IoContext::production(),
            connectivity: Arc::new(NoConnectivity),
        }
    }

    pub fn config(mut self, config: MonkeyConfig) -> Self {
        self.config = config;
        self
    }

    /// Time and randomness used by the stage
    pub fn io(mut self, io: IoContext) -> Self {
        self.io = io;
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn ConnectivityController>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Validate configuration and register configured rules in order
    pub fn build(self) -> Result<FaultInjectionStage> {
        self.config.validate()?;

        let registry =
            RuleRegistry::with_kinds(self.config.faults.enabled_kinds.iter().copied());
        for rule in &self.config.faults.rules {
            registry.register(rule)?;
        }

        let stage = FaultInjectionStage {
            registry,
            gate: TriggerGate::from_config(&self.config.trigger, self.io.rng.clone())?,
            selector: ActionSelector::new(self.io.rng.clone()),
            executor: FaultExecutor::new(
                self.io.time.clone(),
                self.connectivity,
                self.config.connectivity.settle_ms,
            ),
            jerk_mode: AtomicBool::new(self.config.trigger.jerk_mode),
            test_mode: RwLock::new(self.config.test_mode),
            counters: StageCounters::default(),
        };

        tracing::info!(
            rules = stage.registry.len(),
            jerk_mode = stage.is_jerk_mode(),
            test_mode = stage.test_mode().is_some(),
            "Fault-injection stage ready"
        );
        Ok(stage)
    }
}
