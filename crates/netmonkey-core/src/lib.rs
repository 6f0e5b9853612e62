//! NetMonkey Core
//!
//! Core types, errors, and constants for the NetMonkey fault-injection stage.
//!
//! # Overview
//!
//! NetMonkey sits in an HTTP client's request/response pipeline and
//! probabilistically perturbs outgoing calls (delays, forced failures,
//! connectivity drops, status rewrites) so applications can be checked for
//! graceful degradation. This crate holds everything the engine and the
//! test harness share:
//!
//! - HTTP request/response types and the [`Chain`] a call travels through
//! - Fault descriptors and declarative [`RuleConfig`]s
//! - [`MonkeyConfig`] with validation
//! - Injectable time and randomness ([`TimeProvider`], [`RngProvider`])
//!
//! # TigerStyle
//!
//! - Explicit limits with big-endian naming (e.g., `CONNECTIVITY_OFF_MS_MAX`)
//! - No hidden sources of nondeterminism: time and randomness are injected

pub mod config;
pub mod constants;
pub mod error;
pub mod fault;
pub mod http;
pub mod io;
pub mod telemetry;

pub use config::{ConnectivityConfig, FaultsConfig, MonkeyConfig, TestMode, TriggerConfig};
pub use constants::*;
pub use error::{Error, Result};
pub use fault::{Fault, FaultKind, MethodFilter, RuleConfig, TargetMatch};
pub use http::{
    Chain, ClientChain, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResult,
};
pub use io::{sample, IoContext, RngProvider, StdRngProvider, TimeProvider, WallClockTime};
pub use telemetry::{init_telemetry, TelemetryConfig};
