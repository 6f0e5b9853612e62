//! Rule registry
//!
//! TigerStyle: Ordered rules, explicit limits, cheap concurrent reads.
//!
//! Rules live in a `Vec` in registration order so that, for a fixed random
//! draw, the same rule is always chosen. Fault kinds are switched on and off
//! as a set rather than one flag per fault.

use crate::rule::{Rule, RuleId};
use netmonkey_core::constants::RULES_COUNT_MAX;
use netmonkey_core::{Error, FaultKind, HttpRequest, Result, RuleConfig};
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct RegistryState {
    rules: Vec<Arc<Rule>>,
    enabled_kinds: BTreeSet<FaultKind>,
    next_id: u64,
}

/// Holds every configured rule for the lifetime of the process
#[derive(Debug)]
pub struct RuleRegistry {
    state: RwLock<RegistryState>,
}

/// Point-in-time view of one registered rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleStats {
    pub id: RuleId,
    pub description: String,
    pub kind: FaultKind,
    pub weight: f64,
    pub mandatory: bool,
    pub enabled: bool,
    pub applied_count: u64,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// Create an empty registry with every fault kind enabled
    pub fn new() -> Self {
        Self::with_kinds(FaultKind::ALL)
    }

    /// Create an empty registry with only `kinds` enabled
    pub fn with_kinds(kinds: impl IntoIterator<Item = FaultKind>) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                rules: Vec::new(),
                enabled_kinds: kinds.into_iter().collect(),
                next_id: 1,
            }),
        }
    }

    // A panic while holding the lock cannot leave the rule list half-written,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate, compile and append a rule
    pub fn register(&self, config: &RuleConfig) -> Result<RuleId> {
        let mut state = self.write();

        if state.rules.len() >= RULES_COUNT_MAX {
            return Err(Error::RulesCountExceeded {
                limit: RULES_COUNT_MAX,
            });
        }

        let id = RuleId(state.next_id);
        let rule = Rule::compile(id, config)?;
        state.next_id += 1;

        tracing::debug!(
            rule_id = %id,
            fault = rule.fault().name(),
            weight = rule.weight(),
            description = rule.description(),
            "Registered rule"
        );

        state.rules.push(Arc::new(rule));
        Ok(id)
    }

    /// Enable or disable a single rule
    pub fn set_enabled(&self, id: RuleId, enabled: bool) -> Result<()> {
        let state = self.read();
        let rule = state
            .rules
            .iter()
            .find(|rule| rule.id() == id)
            .ok_or(Error::RuleNotFound { id: id.0 })?;

        rule.set_enabled(enabled);
        tracing::debug!(rule_id = %id, enabled, "Rule toggled");
        Ok(())
    }

    /// Enable or disable every rule of one fault kind
    pub fn set_kind_enabled(&self, kind: FaultKind, enabled: bool) {
        let mut state = self.write();
        if enabled {
            state.enabled_kinds.insert(kind);
        } else {
            state.enabled_kinds.remove(&kind);
        }
        tracing::debug!(kind = kind.name(), enabled, "Fault kind toggled");
    }

    pub fn is_kind_enabled(&self, kind: FaultKind) -> bool {
        self.read().enabled_kinds.contains(&kind)
    }

    /// Enabled rules of enabled kinds that match `request`, in registration order
    pub fn matching_enabled(&self, request: &HttpRequest) -> Vec<Arc<Rule>> {
        let state = self.read();
        state
            .rules
            .iter()
            .filter(|rule| rule.is_enabled())
            .filter(|rule| state.enabled_kinds.contains(&rule.kind()))
            .filter(|rule| rule.matches(request))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: RuleId) -> Option<Arc<Rule>> {
        self.read().rules.iter().find(|rule| rule.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().rules.is_empty()
    }

    /// Statistics for every registered rule, including disabled ones
    pub fn snapshot(&self) -> Vec<RuleStats> {
        self.read()
            .rules
            .iter()
            .map(|rule| RuleStats {
                id: rule.id(),
                description: rule.description().to_string(),
                kind: rule.kind(),
                weight: rule.weight(),
                mandatory: rule.is_mandatory(),
                enabled: rule.is_enabled(),
                applied_count: rule.applied_count(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmonkey_core::{Fault, HttpMethod};

    fn ids(rules: &[Arc<Rule>]) -> Vec<RuleId> {
        rules.iter().map(|rule| rule.id()).collect()
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let registry = RuleRegistry::new();
        let a = registry.register(&RuleConfig::new(Fault::ForcedFailure)).unwrap();
        let b = registry
            .register(&RuleConfig::new(Fault::Delay { duration_ms: 10 }))
            .unwrap();

        assert_eq!(a, RuleId(1));
        assert_eq!(b, RuleId(2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_rejects_invalid_rules() {
        let registry = RuleRegistry::new();

        let negative = RuleConfig::new(Fault::ForcedFailure).with_weight(-1.0);
        assert!(registry.register(&negative).unwrap_err().is_configuration());

        let malformed = RuleConfig::new(Fault::ForcedFailure).with_target_pattern("[a-");
        assert!(registry.register(&malformed).unwrap_err().is_configuration());

        assert!(registry.is_empty());
        // Rejected rules do not consume ids
        let ok = registry.register(&RuleConfig::new(Fault::ForcedFailure)).unwrap();
        assert_eq!(ok, RuleId(1));
    }

    #[test]
    fn test_register_limit() {
        let registry = RuleRegistry::new();
        for _ in 0..RULES_COUNT_MAX {
            registry.register(&RuleConfig::new(Fault::ForcedFailure)).unwrap();
        }
        assert!(matches!(
            registry.register(&RuleConfig::new(Fault::ForcedFailure)),
            Err(Error::RulesCountExceeded { .. })
        ));
    }

    #[test]
    fn test_matching_enabled_keeps_registration_order() {
        let registry = RuleRegistry::new();
        let first = registry.register(&RuleConfig::new(Fault::ForcedFailure)).unwrap();
        let _post_only = registry
            .register(&RuleConfig::new(Fault::ForcedFailure).with_method(HttpMethod::Post))
            .unwrap();
        let third = registry
            .register(&RuleConfig::new(Fault::StatusOverride { code: 500 }))
            .unwrap();

        let matching = registry.matching_enabled(&HttpRequest::get("http://a.test"));
        assert_eq!(ids(&matching), vec![first, third]);
    }

    #[test]
    fn test_disabled_rules_are_not_candidates() {
        let registry = RuleRegistry::new();
        let id = registry.register(&RuleConfig::new(Fault::ForcedFailure)).unwrap();
        let request = HttpRequest::get("http://a.test");

        registry.set_enabled(id, false).unwrap();
        assert!(registry.matching_enabled(&request).is_empty());

        registry.set_enabled(id, true).unwrap();
        assert_eq!(registry.matching_enabled(&request).len(), 1);
    }

    #[test]
    fn test_set_enabled_unknown_rule() {
        let registry = RuleRegistry::new();
        assert_eq!(
            registry.set_enabled(RuleId(42), false),
            Err(Error::RuleNotFound { id: 42 })
        );
    }

    #[test]
    fn test_disabled_kind_filters_rules() {
        let registry = RuleRegistry::new();
        registry.register(&RuleConfig::new(Fault::ForcedFailure)).unwrap();
        let delay = registry
            .register(&RuleConfig::new(Fault::Delay { duration_ms: 5 }))
            .unwrap();
        let request = HttpRequest::get("http://a.test");

        registry.set_kind_enabled(FaultKind::ForcedFailure, false);
        assert!(!registry.is_kind_enabled(FaultKind::ForcedFailure));
        assert_eq!(ids(&registry.matching_enabled(&request)), vec![delay]);

        registry.set_kind_enabled(FaultKind::ForcedFailure, true);
        assert_eq!(registry.matching_enabled(&request).len(), 2);
    }

    #[test]
    fn test_snapshot_reports_zero_weight_and_disabled_rules() {
        let registry = RuleRegistry::with_kinds([FaultKind::ForcedFailure]);
        registry
            .register(&RuleConfig::new(Fault::ForcedFailure).with_weight(0.0))
            .unwrap();
        registry
            .register(&RuleConfig::new(Fault::ForcedFailure).disabled())
            .unwrap();

        let stats = registry.snapshot();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].weight, 0.0);
        assert!(stats[0].enabled);
        assert!(!stats[1].enabled);
    }
}
