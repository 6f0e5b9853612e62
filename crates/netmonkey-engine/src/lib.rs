//! NetMonkey Engine
//!
//! Fault-injection stage for HTTP client pipelines.
//!
//! # Overview
//!
//! The engine decides, once per outgoing call, whether to perturb it and how:
//! - [`RuleRegistry`] holds compiled [`Rule`]s in registration order
//! - [`TriggerGate`] draws once to decide whether any fault fires
//! - [`ActionSelector`] draws once to pick exactly one rule
//! - [`FaultExecutor`] applies the fault around the forwarded call
//! - [`FaultInjectionStage`] composes all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use netmonkey_engine::{FaultInjectionStage, MonkeyClient};
//!
//! let stage = FaultInjectionStage::production()?;
//! stage.monkey_with_response_time(2_000)?;
//! stage.enable_jerk_mode();
//!
//! let client = MonkeyClient::new(stage, my_http_client);
//! let response = client.get("https://api.example.com/items").await;
//! ```
//!
//! # TigerStyle
//!
//! - At most one fault per call; the chain is consumed when forwarded
//! - Rules are validated at registration, never at call time
//! - Randomness and time come from injected providers

pub mod connectivity;
pub mod executor;
pub mod gate;
pub mod interceptor;
pub mod registry;
pub mod rule;
pub mod selector;
pub mod stage;

pub use connectivity::{
    drop_connectivity, restore_connectivity, ConnectivityController, NoConnectivity,
};
pub use executor::{CallState, Execution, FaultExecutor, FaultOutcome};
pub use gate::{TriggerGate, TriggerMode};
pub use interceptor::{Interceptor, MonkeyClient, NoOpInterceptor};
pub use registry::{RuleRegistry, RuleStats};
pub use rule::{normalize_url, BodyMatcher, PathPattern, Rule, RuleId};
pub use selector::{pick_weighted, ActionSelector};
pub use stage::{FaultInjectionStage, FaultInjectionStageBuilder, StageStats};
