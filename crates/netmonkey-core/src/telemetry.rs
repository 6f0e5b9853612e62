//! Logging initialization
//!
//! TigerStyle: Explicit telemetry configuration.
//!
//! The stage itself only emits `tracing` events. Applications that have no
//! subscriber of their own can install a stdout one with [`init_telemetry`].

use crate::error::{Error, Result};

/// Environment variable holding the log filter (falls back to `RUST_LOG`)
pub const LOG_FILTER_ENV: &str = "NETMONKEY_LOG";

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Log level filter, in `EnvFilter` syntax
    pub log_level: String,
    /// Whether to output events to stdout
    pub stdout_enabled: bool,
    /// Include the event target (module path) in each line
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stdout_enabled: true,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Disable stdout output
    pub fn without_stdout(mut self) -> Self {
        self.stdout_enabled = false;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - `NETMONKEY_LOG`: Log level filter
    /// - `RUST_LOG`: Log level filter when `NETMONKEY_LOG` is unset (default: "info")
    pub fn from_env() -> Self {
        let log_level = std::env::var(LOG_FILTER_ENV)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());

        Self {
            log_level,
            ..Default::default()
        }
    }
}

/// Install a global `tracing` subscriber
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    if !config.stdout_enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_new(&config.log_level).map_err(|e| {
        Error::invalid_configuration("telemetry.log_level", e.to_string())
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| Error::internal(format!("failed to initialize tracing subscriber: {}", e)))?;

    tracing::info!(log_level = %config.log_level, "Telemetry initialized");
    Ok(())
}
