//! Fault descriptors and declarative rule configuration
//!
//! TigerStyle: Explicit fault types, one kind per rule.
//!
//! A [`RuleConfig`] is the unvalidated description of a rule as it appears
//! in configuration. The engine compiles it (patterns, weight checks) into an
//! immutable rule at registration time.

use crate::http::HttpMethod;
use serde::{Deserialize, Serialize};

// =============================================================================
// Fault
// =============================================================================

/// A deliberate perturbation applied to one call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fault {
    /// Hold the call for `duration_ms` before forwarding it
    Delay { duration_ms: u64 },
    /// Rewrite a successful response's status code
    StatusOverride { code: u16 },
    /// Fail the call with a synthetic transport error, never forwarding it
    ForcedFailure,
    /// Take connectivity down, bringing it back after `off_ms`
    ConnectivityDrop { off_ms: u64 },
}

impl Fault {
    /// The variant tag of this fault
    pub fn kind(&self) -> FaultKind {
        match self {
            Fault::Delay { .. } => FaultKind::Delay,
            Fault::StatusOverride { .. } => FaultKind::StatusOverride,
            Fault::ForcedFailure => FaultKind::ForcedFailure,
            Fault::ConnectivityDrop { .. } => FaultKind::ConnectivityDrop,
        }
    }

    /// Get a human-readable name for this fault
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// A zero-length delay never does anything
    pub fn is_inert(&self) -> bool {
        matches!(self, Fault::Delay { duration_ms: 0 })
    }

    /// Default description used in log lines
    pub fn describe(&self) -> String {
        match self {
            Fault::Delay { duration_ms } => {
                format!("Delay request by {} milliseconds", duration_ms)
            }
            Fault::StatusOverride { code } => format!("Return {} on request", code),
            Fault::ForcedFailure => "Throw error on request".to_string(),
            Fault::ConnectivityDrop { off_ms } => {
                format!("Turn connectivity off for {} milliseconds", off_ms)
            }
        }
    }
}

/// Variant tag of a [`Fault`], used to enable or disable whole categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    Delay,
    StatusOverride,
    ForcedFailure,
    ConnectivityDrop,
}

impl FaultKind {
    /// Every fault kind, in declaration order
    pub const ALL: [FaultKind; 4] = [
        FaultKind::Delay,
        FaultKind::StatusOverride,
        FaultKind::ForcedFailure,
        FaultKind::ConnectivityDrop,
    ];

    /// Get a human-readable name for this kind
    pub fn name(&self) -> &'static str {
        match self {
            FaultKind::Delay => "delay",
            FaultKind::StatusOverride => "status_override",
            FaultKind::ForcedFailure => "forced_failure",
            FaultKind::ConnectivityDrop => "connectivity_drop",
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Matching
// =============================================================================

/// Which request methods a rule applies to
///
/// Serialized as `"*"` for the wildcard and the verb otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MethodFilter {
    /// Every method, including nonstandard verbs
    #[default]
    Any,
    /// Exactly this method
    Only(HttpMethod),
}

impl MethodFilter {
    /// Check whether `method` passes this filter
    pub fn matches(&self, method: &HttpMethod) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(expected) => expected == method,
        }
    }
}

impl From<HttpMethod> for MethodFilter {
    fn from(method: HttpMethod) -> Self {
        MethodFilter::Only(method)
    }
}

impl From<String> for MethodFilter {
    fn from(value: String) -> Self {
        if value == "*" {
            MethodFilter::Any
        } else {
            MethodFilter::Only(HttpMethod::from(value))
        }
    }
}

impl From<MethodFilter> for String {
    fn from(filter: MethodFilter) -> Self {
        match filter {
            MethodFilter::Any => "*".to_string(),
            MethodFilter::Only(method) => method.into(),
        }
    }
}

impl std::fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("any"),
            MethodFilter::Only(method) => write!(f, "{}", method),
        }
    }
}

/// Which request targets (URLs) a rule applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMatch {
    /// Every URL
    #[default]
    Any,
    /// Exactly this URL
    Exact(String),
    /// URLs containing a match for this regular expression
    Pattern(String),
}

// =============================================================================
// Rule Configuration
// =============================================================================

fn default_weight() -> f64 {
    1.0
}

fn default_enabled() -> bool {
    true
}

/// Declarative rule, as registered by the application or loaded from config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Label used in log lines; derived from the fault when absent
    #[serde(default)]
    pub description: Option<String>,
    /// Method filter
    #[serde(default)]
    pub method: MethodFilter,
    /// Target filter
    #[serde(default)]
    pub target: TargetMatch,
    /// Optional regular expression the request body must contain a match for
    #[serde(default)]
    pub body_pattern: Option<String>,
    /// The fault applied when this rule is selected
    pub fault: Fault,
    /// Relative selection weight (non-negative)
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Applied whenever it matches, without consulting the trigger gate
    #[serde(default)]
    pub mandatory: bool,
    /// Initial enabled state
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl RuleConfig {
    /// Create a rule matching every request with weight 1
    pub fn new(fault: Fault) -> Self {
        Self {
            description: None,
            method: MethodFilter::Any,
            target: TargetMatch::Any,
            body_pattern: None,
            fault,
            weight: default_weight(),
            mandatory: false,
            enabled: true,
        }
    }

    /// Set the log description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restrict to a single method
    pub fn with_method(mut self, method: impl Into<HttpMethod>) -> Self {
        self.method = MethodFilter::Only(method.into());
        self
    }

    /// Restrict to URLs matching a regular expression
    pub fn with_target_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.target = TargetMatch::Pattern(pattern.into());
        self
    }

    /// Restrict to exactly one URL
    pub fn with_exact_url(mut self, url: impl Into<String>) -> Self {
        self.target = TargetMatch::Exact(url.into());
        self
    }

    /// Restrict to requests whose body matches a regular expression
    pub fn with_body_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.body_pattern = Some(pattern.into());
        self
    }

    /// Set the selection weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Mark the rule mandatory
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Register the rule disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Description, falling back to one derived from the fault and method
    pub fn description(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => match &self.method {
                MethodFilter::Any => format!("{} (any request)", self.fault.describe()),
                MethodFilter::Only(method) => {
                    format!("{} ({} requests)", self.fault.describe(), method)
                }
            },
        }
    }
}
