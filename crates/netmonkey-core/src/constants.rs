//! TigerStyle constants for NetMonkey
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Trigger Probabilities
// =============================================================================

/// Probability that any fault fires on an intercepted call (1 in 10)
pub const TRIGGER_PROBABILITY_BASE_DEFAULT: f64 = 0.10;

/// Probability that any fault fires when jerk mode is enabled (1 in 2)
pub const TRIGGER_PROBABILITY_JERK_DEFAULT: f64 = 0.50;

// =============================================================================
// Fault Parameters
// =============================================================================

/// Status code written by the classic "monkey with response code" rule
pub const STATUS_OVERRIDE_CODE_DEFAULT: u16 = 404;

/// Lowest status code accepted for a status override
pub const STATUS_CODE_MIN: u16 = 100;

/// Highest status code accepted for a status override
pub const STATUS_CODE_MAX: u16 = 599;

/// Reason carried by the connection failure a forced-failure rule raises
pub const FORCED_FAILURE_REASON: &str = "Monkey Exception";

/// Maximum injected delay in milliseconds (10 min)
pub const DELAY_MS_MAX: u64 = 10 * 60 * 1000;

/// Default time connectivity stays off after a drop (5 sec)
pub const CONNECTIVITY_OFF_MS_DEFAULT: u64 = 5 * 1000;

/// Maximum time connectivity may stay off after a drop (10 min)
pub const CONNECTIVITY_OFF_MS_MAX: u64 = 10 * 60 * 1000;

/// Maximum pause after disabling connectivity before forwarding (10 sec)
pub const CONNECTIVITY_SETTLE_MS_MAX: u64 = 10 * 1000;

// =============================================================================
// Registry Limits
// =============================================================================

/// Maximum number of rules held by a registry
pub const RULES_COUNT_MAX: usize = 1024;

/// Maximum selection weight of a single rule
pub const RULE_WEIGHT_MAX: f64 = 1_000_000.0;

/// Maximum length of a path or body pattern in bytes
pub const RULE_PATTERN_LENGTH_BYTES_MAX: usize = 4096;

// =============================================================================
// HTTP Client
// =============================================================================

/// Default HTTP timeout in milliseconds
pub const HTTP_CLIENT_TIMEOUT_MS_DEFAULT: u64 = 30_000;

// Compile-time assertions for constant validity
const _: () = {
    assert!(TRIGGER_PROBABILITY_JERK_DEFAULT > TRIGGER_PROBABILITY_BASE_DEFAULT);
    assert!(TRIGGER_PROBABILITY_JERK_DEFAULT <= 1.0);
    assert!(STATUS_CODE_MIN <= STATUS_OVERRIDE_CODE_DEFAULT);
    assert!(STATUS_OVERRIDE_CODE_DEFAULT <= STATUS_CODE_MAX);
    assert!(CONNECTIVITY_OFF_MS_DEFAULT <= CONNECTIVITY_OFF_MS_MAX);
    assert!(RULES_COUNT_MAX > 0);
};
