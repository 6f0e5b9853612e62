//! DST tests for clients routed through the stage
//!
//! TigerStyle: End-to-end through MonkeyClient against a simulated upstream.

use netmonkey_core::{
    Fault, HttpClient, HttpError, HttpMethod, HttpRequest, MonkeyConfig, RuleConfig, TestMode,
    TimeProvider,
};
use netmonkey_dst::{MockResponse, SimConfig, SimEnvironment, SimHttpClient};
use netmonkey_engine::{MonkeyClient, NoOpInterceptor};
use serde_json::json;

fn always_trigger_env(seed: u64) -> SimEnvironment {
    let mut monkey = MonkeyConfig::default();
    monkey.test_mode = Some(TestMode::always_trigger());
    SimEnvironment::new(SimConfig::new(seed).with_monkey(monkey)).unwrap()
}

#[tokio::test]
async fn test_dst_noop_interceptor_reaches_upstream() {
    let http = SimHttpClient::new();
    http.mock_url("https://api.test/users", MockResponse::json(r#"{"id": 7}"#))
        .await;
    let client = MonkeyClient::new(NoOpInterceptor, http);

    let response = client.get("https://api.test/users/7").await.unwrap();
    assert_eq!(response.json().unwrap()["id"], 7);
    assert_eq!(client.inner().request_count(), 1);
}

#[tokio::test]
async fn test_dst_client_forced_failure_never_reaches_upstream() {
    let env = always_trigger_env(2001);
    env.stage.monkey_with_request_success().unwrap();
    let client = env.client();

    for i in 0..25 {
        let err = client
            .get(&format!("https://api.test/{}", i))
            .await
            .unwrap_err();
        assert!(err.is_transport_failure());
    }

    assert_eq!(env.http.request_count(), 0);
}

#[tokio::test]
async fn test_dst_client_status_override_keeps_body() {
    let env = always_trigger_env(2002);
    env.stage.monkey_with_response_code(409).unwrap();
    env.http
        .mock_url("https://api.test/orders", MockResponse::json(r#"{"total": 3}"#))
        .await;
    env.http
        .mock_url("https://api.test/broken", MockResponse::server_error())
        .await;
    let client = env.client();

    let response = client.get("https://api.test/orders").await.unwrap();
    assert_eq!(response.status, 409);
    assert_eq!(response.json().unwrap()["total"], 3);
    assert_eq!(
        response.headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );

    let broken = client.get("https://api.test/broken").await.unwrap();
    assert_eq!(broken.status, 500);
}

#[tokio::test]
async fn test_dst_client_upstream_errors_pass_through() {
    let env = always_trigger_env(2003);
    env.stage.monkey_with_response_code(409).unwrap();
    env.http
        .set_failure(Some(HttpError::Timeout { timeout_ms: 30_000 }))
        .await;

    let err = env.client().get("https://api.test").await.unwrap_err();
    assert_eq!(err, HttpError::Timeout { timeout_ms: 30_000 });
    assert_eq!(env.http.request_count(), 1);
}

#[tokio::test]
async fn test_dst_client_body_and_path_matching() {
    let env = always_trigger_env(2004);
    env.stage
        .register(
            RuleConfig::new(Fault::ForcedFailure)
                .with_description("Fail payment retries")
                .with_method(HttpMethod::Post)
                .with_target_pattern(r"/payments$")
                .with_body_pattern(r#""retry":\s*true"#),
        )
        .unwrap();
    let client = env.client();

    let retry = client
        .post_json("https://pay.test/payments", &json!({"amount": 5, "retry": true}))
        .await;
    assert!(matches!(retry, Err(HttpError::ConnectionFailed { .. })));

    let first_try = client
        .post_json("https://pay.test/payments", &json!({"amount": 5, "retry": false}))
        .await;
    assert!(first_try.is_ok());

    let other_path = client
        .post_json("https://pay.test/payments/refund", &json!({"retry": true}))
        .await;
    assert!(other_path.is_ok());

    let wrong_method = client
        .execute(
            HttpRequest::new("PUT", "https://pay.test/payments").with_body(r#"{"retry": true}"#),
        )
        .await;
    assert!(wrong_method.is_ok());

    let rules = env.stage.rules();
    assert_eq!(rules[0].description, "Fail payment retries");
    assert_eq!(rules[0].applied_count, 1);
    assert_eq!(env.http.request_count(), 3);
}

#[tokio::test]
async fn test_dst_client_delay_advances_simulated_time() {
    let env = always_trigger_env(2005);
    env.stage.monkey_with_response_time(2_500).unwrap();
    let start = env.now_ms();

    let response = env.client().get("https://api.test").await.unwrap();
    assert!(response.is_success());
    assert_eq!(env.now_ms() - start, 2_500);
    assert_eq!(env.time().now_ms(), env.now_ms());
}

#[tokio::test]
async fn test_dst_environment_from_json_config() {
    let config: MonkeyConfig = serde_json::from_value(json!({
        "trigger": { "jerk_mode": true },
        "faults": {
            "enabled_kinds": ["status_override", "delay"],
            "rules": [
                {
                    "method": "GET",
                    "target": { "pattern": "/search" },
                    "fault": { "kind": "status_override", "code": 503 },
                    "weight": 2.0,
                    "mandatory": true
                },
                {
                    "fault": { "kind": "forced_failure" }
                }
            ]
        }
    }))
    .unwrap();

    let env = SimEnvironment::new(SimConfig::new(2006).with_monkey(config)).unwrap();
    assert!(env.stage.is_jerk_mode());
    assert_eq!(env.stage.rules().len(), 2);

    let client = env.client();
    // Mandatory rule fires on every search
    for _ in 0..10 {
        let response = client.get("https://api.test/search?q=x").await.unwrap();
        assert_eq!(response.status, 503);
    }

    // Forced failures are configured but their kind is disabled
    for _ in 0..100 {
        assert!(client.get("https://api.test/home").await.is_ok());
    }
}
