//! Error types for NetMonkey
//!
//! TigerStyle: Explicit error types with context, using thiserror.
//!
//! These errors cover configuration and registry operations. Failures on the
//! call path travel through [`crate::http::HttpError`] instead, so an
//! injected failure looks exactly like a real transport failure.

use thiserror::Error;

/// Result type alias for NetMonkey operations
pub type Result<T> = std::result::Result<T, Error>;

/// NetMonkey error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {field}, reason: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Invalid pattern: {pattern}, reason: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid rule weight: {weight} (must be finite and non-negative)")]
    InvalidWeight { weight: f64 },

    #[error("Too many rules: limit is {limit}")]
    RulesCountExceeded { limit: usize },

    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("Rule not found: {id}")]
    RuleNotFound { id: u64 },

    // =========================================================================
    // Platform Errors
    // =========================================================================
    #[error("Permission denied: {operation}")]
    PermissionDenied { operation: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(operation: impl Into<String>) -> Self {
        Self::PermissionDenied {
            operation: operation.into(),
        }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Check if this error means a rule or config was rejected at setup time
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidWeight { .. }
                | Self::RulesCountExceeded { .. }
        )
    }
}
