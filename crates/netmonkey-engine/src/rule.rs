//! Compiled fault rules
//!
//! TigerStyle: Validate once at registration, match many times.
//!
//! A [`Rule`] is immutable after compilation except for its enabled flag and
//! its applied counter. Matching is pure: it reads only the request.

use netmonkey_core::config::validate_override_code;
use netmonkey_core::constants::{
    CONNECTIVITY_OFF_MS_MAX, DELAY_MS_MAX, RULE_PATTERN_LENGTH_BYTES_MAX, RULE_WEIGHT_MAX,
};
use netmonkey_core::{
    Error, Fault, FaultKind, HttpRequest, MethodFilter, Result, RuleConfig, TargetMatch,
};
use regex::Regex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Registry-assigned rule identifier, increasing in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u64);

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Patterns
// =============================================================================

fn check_pattern_length(pattern: &str) -> Result<()> {
    if pattern.len() > RULE_PATTERN_LENGTH_BYTES_MAX {
        return Err(Error::invalid_pattern(
            pattern.chars().take(64).collect::<String>(),
            format!(
                "{} bytes exceeds limit of {} bytes",
                pattern.len(),
                RULE_PATTERN_LENGTH_BYTES_MAX
            ),
        ));
    }
    Ok(())
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    check_pattern_length(pattern)?;
    Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e.to_string()))
}

/// Canonical form of an absolute URL for equality checks
///
/// Scheme and authority are lowercased and an empty path becomes `/`, so
/// `HTTP://A.test` and `http://a.test/` compare equal. Path, query and
/// fragment are kept as written. Strings without `://` are returned as is.
pub fn normalize_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let authority_end = url[authority_start..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |offset| authority_start + offset);

    let (head, tail) = url.split_at(authority_end);
    let mut normalized = head.to_ascii_lowercase();
    if !tail.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(tail);
    normalized
}

#[derive(Debug, Clone)]
enum Target {
    Any,
    Exact(String),
    Regex(Regex),
}

/// Matcher for the request target (full URL)
#[derive(Debug, Clone)]
pub struct PathPattern {
    target: Target,
}

impl PathPattern {
    /// Matches every target
    pub fn any() -> Self {
        Self {
            target: Target::Any,
        }
    }

    /// Matches targets equal to `url` after [`normalize_url`]
    pub fn exact(url: &str) -> Result<Self> {
        check_pattern_length(url)?;
        Ok(Self {
            target: Target::Exact(normalize_url(url)),
        })
    }

    /// Matches targets containing a match for `pattern`
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self {
            target: Target::Regex(compile_regex(pattern)?),
        })
    }

    /// Compile a declarative target filter
    pub fn compile(target: &TargetMatch) -> Result<Self> {
        match target {
            TargetMatch::Any => Ok(Self::any()),
            TargetMatch::Exact(url) => Self::exact(url),
            TargetMatch::Pattern(pattern) => Self::regex(pattern),
        }
    }

    /// Check whether `target` passes
    pub fn matches(&self, target: &str) -> bool {
        match &self.target {
            Target::Any => true,
            Target::Exact(url) => normalize_url(target) == *url,
            Target::Regex(regex) => regex.is_match(target),
        }
    }
}

/// Matcher for the request body
#[derive(Debug, Clone)]
pub struct BodyMatcher {
    regex: Regex,
}

impl BodyMatcher {
    /// Matches bodies containing a match for `pattern`
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: compile_regex(pattern)?,
        })
    }

    /// A request without a body never matches
    pub fn matches(&self, body: Option<&str>) -> bool {
        body.is_some_and(|body| self.regex.is_match(body))
    }
}

// =============================================================================
// Rule
// =============================================================================

/// A request predicate paired with one fault and a selection weight
#[derive(Debug)]
pub struct Rule {
    id: RuleId,
    description: String,
    method: MethodFilter,
    path: PathPattern,
    body: Option<BodyMatcher>,
    fault: Fault,
    weight: f64,
    mandatory: bool,
    enabled: AtomicBool,
    applied_count: AtomicU64,
}

impl Rule {
    /// Validate `config` and compile it into a rule
    ///
    /// Every configuration problem surfaces here, never at call time.
    pub fn compile(id: RuleId, config: &RuleConfig) -> Result<Self> {
        validate_weight(config.weight)?;
        validate_fault(&config.fault)?;

        let path = PathPattern::compile(&config.target)?;
        let body = config
            .body_pattern
            .as_deref()
            .map(BodyMatcher::new)
            .transpose()?;

        Ok(Self {
            id,
            description: config.description(),
            method: config.method.clone(),
            path,
            body,
            fault: config.fault.clone(),
            weight: config.weight,
            mandatory: config.mandatory,
            enabled: AtomicBool::new(config.enabled),
            applied_count: AtomicU64::new(0),
        })
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn fault(&self) -> &Fault {
        &self.fault
    }

    pub fn kind(&self) -> FaultKind {
        self.fault.kind()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Zero-weight rules are configured but never chosen
    pub fn is_selectable(&self) -> bool {
        self.weight > 0.0
    }

    /// Number of calls this rule has actually perturbed
    pub fn applied_count(&self) -> u64 {
        self.applied_count.load(Ordering::SeqCst)
    }

    pub(crate) fn record_applied(&self) {
        self.applied_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Check method, target and body against `request`
    pub fn matches(&self, request: &HttpRequest) -> bool {
        if !self.method.matches(&request.method) {
            return false;
        }
        if !self.path.matches(&request.url) {
            return false;
        }
        match &self.body {
            None => true,
            Some(body) => body.matches(request.body.as_deref()),
        }
    }
}

fn validate_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 || weight > RULE_WEIGHT_MAX {
        return Err(Error::InvalidWeight { weight });
    }
    Ok(())
}

fn validate_fault(fault: &Fault) -> Result<()> {
    match fault {
        Fault::Delay { duration_ms } if *duration_ms > DELAY_MS_MAX => {
            Err(Error::invalid_configuration(
                "fault.duration_ms",
                format!("{} exceeds limit {}", duration_ms, DELAY_MS_MAX),
            ))
        }
        Fault::ConnectivityDrop { off_ms } if *off_ms > CONNECTIVITY_OFF_MS_MAX => {
            Err(Error::invalid_configuration(
                "fault.off_ms",
                format!("{} exceeds limit {}", off_ms, CONNECTIVITY_OFF_MS_MAX),
            ))
        }
        Fault::StatusOverride { code } => validate_override_code(*code),
        _ => Ok(()),
    }
}
