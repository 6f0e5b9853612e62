//! DST tests for trigger rates
//!
//! TigerStyle: Statistical properties checked over many seeded trials.
//!
//! Tolerances are several standard deviations wide at these trial counts,
//! so any seed (including a random one from DST_SEED) passes.

use netmonkey_core::{HttpRequest, HttpResponse, IoContext, MonkeyConfig, TestMode};
use netmonkey_dst::{seed_from_env_or_random, DeterministicRng, FakeChain, SimClock, SimTime};
use netmonkey_engine::FaultInjectionStage;
use std::sync::Arc;

const TRIALS_COUNT: u64 = 10_000;

fn stage(seed: u64, config: MonkeyConfig) -> FaultInjectionStage {
    let clock = Arc::new(SimClock::from_millis(0));
    FaultInjectionStage::builder()
        .config(config)
        .io(IoContext::new(
            Arc::new(SimTime::new(clock)),
            Arc::new(DeterministicRng::new(seed)),
        ))
        .build()
        .unwrap()
}

/// Fraction of `TRIALS_COUNT` calls on which a rule fired
async fn trigger_rate(stage: &FaultInjectionStage) -> f64 {
    let before = stage.stats().triggered;
    for _ in 0..TRIALS_COUNT {
        let chain = FakeChain::responding(
            HttpRequest::get("https://api.test/items"),
            HttpResponse::new(200, ""),
        );
        let _ = stage.intercept(chain).await;
    }
    (stage.stats().triggered - before) as f64 / TRIALS_COUNT as f64
}

#[tokio::test]
async fn test_dst_jerk_mode_raises_trigger_rate() {
    let seed = seed_from_env_or_random();
    let stage = stage(seed, MonkeyConfig::default());
    stage.monkey_with_request_success().unwrap();

    let base = trigger_rate(&stage).await;
    stage.enable_jerk_mode();
    let jerk = trigger_rate(&stage).await;

    assert!((base - 0.10).abs() < 0.02, "seed {}: base rate {}", seed, base);
    assert!((jerk - 0.50).abs() < 0.03, "seed {}: jerk rate {}", seed, jerk);
    assert!(jerk > base, "seed {}: jerk {} <= base {}", seed, jerk, base);
}

#[tokio::test]
async fn test_dst_jerk_mode_can_be_turned_off() {
    let stage = stage(7001, MonkeyConfig::default());
    stage.monkey_with_request_success().unwrap();

    stage.set_jerk_mode(true);
    assert!(stage.is_jerk_mode());
    stage.set_jerk_mode(false);
    assert!(!stage.is_jerk_mode());

    let base = trigger_rate(&stage).await;
    assert!((base - 0.10).abs() < 0.02, "base rate {}", base);
}

#[tokio::test]
async fn test_dst_configured_probabilities() {
    let mut config = MonkeyConfig::default();
    config.trigger.base_probability = 0.25;
    config.trigger.jerk_probability = 0.75;
    config.trigger.jerk_mode = true;

    let stage = stage(7002, config);
    stage.monkey_with_response_code(500).unwrap();

    let jerk = trigger_rate(&stage).await;
    assert!((jerk - 0.75).abs() < 0.03, "jerk rate {}", jerk);
}

#[tokio::test]
async fn test_dst_test_mode_probability_overrides_jerk_mode() {
    let stage = stage(7003, MonkeyConfig::default());
    stage.monkey_with_request_success().unwrap();
    stage.enable_jerk_mode();
    stage
        .enable_test_mode(TestMode::default().with_trigger_probability(0.2))
        .unwrap();

    let rate = trigger_rate(&stage).await;
    assert!((rate - 0.20).abs() < 0.02, "test mode rate {}", rate);
}

#[tokio::test]
async fn test_dst_applied_faults_track_trigger_rate() {
    let stage = stage(7004, MonkeyConfig::default());
    stage.monkey_with_request_success().unwrap();

    trigger_rate(&stage).await;

    let stats = stage.stats();
    assert_eq!(stats.intercepted, TRIALS_COUNT);
    assert_eq!(stats.short_circuited, stats.triggered);
    assert_eq!(stats.passed_through + stats.short_circuited, TRIALS_COUNT);
    assert_eq!(stage.rules()[0].applied_count, stats.triggered);
}
