//! Weighted rule selection
//!
//! TigerStyle: One sample, cumulative-weight inversion, deterministic order.

use crate::rule::Rule;
use netmonkey_core::io::sample;
use netmonkey_core::RngProvider;
use std::sync::Arc;

/// Pick an index by cumulative-weight inversion of `sample` in [0, 1)
///
/// Zero-weight entries are never picked. Returns `None` when no entry has a
/// positive weight. Rounding at the top of the range resolves to the last
/// positive-weight entry.
pub fn pick_weighted(weights: &[f64], sample: f64) -> Option<usize> {
    debug_assert!(
        weights.iter().all(|w| w.is_finite() && *w >= 0.0),
        "weights must be finite and non-negative"
    );

    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }

    let target = sample.clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;

    for (index, weight) in weights.iter().enumerate() {
        if *weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(index);
        if target < cumulative {
            return Some(index);
        }
    }

    last_positive
}

/// Picks exactly one rule among the candidates for a call
#[derive(Debug, Clone)]
pub struct ActionSelector {
    rng: Arc<dyn RngProvider>,
}

impl ActionSelector {
    pub fn new(rng: Arc<dyn RngProvider>) -> Self {
        Self { rng }
    }

    /// Select one rule with a single weighted draw
    ///
    /// No sample is drawn when `candidates` is empty.
    pub fn select<'a>(&self, candidates: &'a [Arc<Rule>]) -> Option<&'a Arc<Rule>> {
        if candidates.is_empty() {
            return None;
        }

        let weights: Vec<f64> = candidates.iter().map(|rule| rule.weight()).collect();
        pick_weighted(&weights, sample(self.rng.as_ref())).map(|index| &candidates[index])
    }
}
