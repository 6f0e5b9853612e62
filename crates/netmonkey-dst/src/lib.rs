//! NetMonkey DST - Deterministic Simulation Testing
//!
//! Simulated collaborators for driving the fault-injection stage
//! reproducibly.
//!
//! # Overview
//!
//! - Reproducible random numbers ([`DeterministicRng`]) and forced draws
//!   ([`ScriptedRng`])
//! - Deterministic time control ([`SimClock`], [`SimTime`])
//! - A recording connectivity switch ([`SimConnectivity`])
//! - A canned call chain ([`FakeChain`]) and upstream client ([`SimHttpClient`])
//! - [`SimEnvironment`] wiring all of the above to a stage
//!
//! # Example
//!
//! ```rust,ignore
//! use netmonkey_dst::{SimConfig, SimEnvironment};
//!
//! #[tokio::test]
//! async fn test_with_faults() {
//!     let env = SimEnvironment::new(SimConfig::from_env_or_random()).unwrap();
//!     env.stage.monkey_with_response_time(500).unwrap();
//!     let response = env.client().get("https://api.test/items").await;
//! }
//! ```
//!
//! # TigerStyle
//!
//! - All decisions are deterministic given the same seed
//! - Always log the seed for reproducibility

pub mod chain;
pub mod clock;
pub mod connectivity;
pub mod http;
pub mod rng;
pub mod simulation;
pub mod time;

pub use chain::{ChainLog, FakeChain};
pub use clock::SimClock;
pub use connectivity::SimConnectivity;
pub use http::{MockResponse, RecordedRequest, SimHttpClient};
pub use rng::{seed_from_env_or_random, DeterministicRng, ScriptedRng};
pub use simulation::{SimConfig, SimEnvironment, SimMonkeyClient};
pub use time::SimTime;
