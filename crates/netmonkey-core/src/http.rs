//! HTTP calls as the stage sees them
//!
//! TigerStyle: Plain data for requests and responses, traits at the seams.
//!
//! The stage sits between two seams:
//! - [`HttpClient`]: whatever actually performs requests (production or simulated)
//! - [`Chain`]: a single in-flight call, forwarded at most once
//!
//! [`ClientChain`] joins them: a chain whose forward is one `execute` call.

use crate::constants::HTTP_CLIENT_TIMEOUT_MS_DEFAULT;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Method
// =============================================================================

/// Request method
///
/// Verbs outside the standard set are kept verbatim in [`HttpMethod::Custom`]
/// and compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Custom(String),
}

impl HttpMethod {
    const STANDARD: [(HttpMethod, &'static str); 7] = [
        (HttpMethod::Get, "GET"),
        (HttpMethod::Head, "HEAD"),
        (HttpMethod::Post, "POST"),
        (HttpMethod::Put, "PUT"),
        (HttpMethod::Patch, "PATCH"),
        (HttpMethod::Delete, "DELETE"),
        (HttpMethod::Options, "OPTIONS"),
    ];

    /// The verb as sent on the wire
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Custom(verb) => verb,
            standard => Self::STANDARD
                .iter()
                .find(|(method, _)| method == standard)
                .map(|(_, verb)| *verb)
                .unwrap_or_default(),
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(verb: &str) -> Self {
        Self::STANDARD
            .iter()
            .find(|(_, standard)| *standard == verb)
            .map(|(method, _)| method.clone())
            .unwrap_or_else(|| HttpMethod::Custom(verb.to_string()))
    }
}

impl From<String> for HttpMethod {
    fn from(verb: String) -> Self {
        HttpMethod::from(verb.as_str())
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Request / Response
// =============================================================================

/// Outgoing request
///
/// `url` is the full target, scheme and query included; path patterns are
/// matched against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    /// Passed to the client untouched
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: impl Into<HttpMethod>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: Duration::from_millis(HTTP_CLIENT_TIMEOUT_MS_DEFAULT),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_body(self, body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..self
        }
    }

    /// Serialize `json` as the body and mark it `application/json`
    pub fn with_json_body(self, json: &Value) -> Self {
        self.with_body(json.to_string())
            .with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// Response as returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Same response with only the status code replaced
    pub fn with_status(self, status: u16) -> Self {
        Self { status, ..self }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failure of a call before a response arrived
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("HTTP request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("HTTP request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl HttpError {
    /// No response came back from the network
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            HttpError::Timeout { .. } | HttpError::ConnectionFailed { .. }
        )
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

// =============================================================================
// Seams
// =============================================================================

/// Performs requests
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse>;

    async fn get(&self, url: &str) -> HttpResult<HttpResponse> {
        self.execute(HttpRequest::get(url)).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> HttpResult<HttpResponse> {
        self.execute(HttpRequest::post(url).with_json_body(body))
            .await
    }
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        (**self).execute(request).await
    }
}

/// One intercepted call
///
/// `proceed` consumes the chain, so a call can be forwarded at most once.
#[async_trait]
pub trait Chain: Send {
    /// The request as issued by the caller
    fn request(&self) -> &HttpRequest;

    /// Hand the request to the rest of the pipeline
    async fn proceed(self, request: HttpRequest) -> HttpResult<HttpResponse>;
}

/// Chain whose forward is a single [`HttpClient::execute`]
pub struct ClientChain<'a, C: HttpClient + ?Sized> {
    client: &'a C,
    request: HttpRequest,
}

impl<'a, C: HttpClient + ?Sized> ClientChain<'a, C> {
    pub fn new(client: &'a C, request: HttpRequest) -> Self {
        Self { client, request }
    }
}

#[async_trait]
impl<'a, C: HttpClient + ?Sized> Chain for ClientChain<'a, C> {
    fn request(&self) -> &HttpRequest {
        &self.request
    }

    async fn proceed(self, request: HttpRequest) -> HttpResult<HttpResponse> {
        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoClient;

    #[async_trait]
    impl HttpClient for EchoClient {
        async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
            Ok(HttpResponse::new(200, request.url))
        }
    }

    #[test]
    fn test_request_builders() {
        let request = HttpRequest::get("https://example.com")
            .with_header("Authorization", "Bearer token")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://example.com");
        assert_eq!(
            request.headers.get("Authorization").map(String::as_str),
            Some("Bearer token")
        );
        assert_eq!(request.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request =
            HttpRequest::post("https://example.com").with_json_body(&serde_json::json!({"a": 1}));
        assert_eq!(request.body.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_with_status_keeps_other_fields() {
        let original = HttpResponse::new(200, "payload").with_header("X-Trace", "abc");
        let rewritten = original.clone().with_status(409);

        assert_eq!(rewritten.status, 409);
        assert_eq!(rewritten.body, original.body);
        assert_eq!(rewritten.headers, original.headers);
    }

    #[test]
    fn test_only_2xx_is_success() {
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(404, "Not Found").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
    }

    #[test]
    fn test_method_verbs() {
        for (method, verb) in HttpMethod::STANDARD {
            assert_eq!(method.as_str(), verb);
            assert_eq!(HttpMethod::from(verb), method);
        }
        assert_eq!(
            HttpMethod::from("CREATE"),
            HttpMethod::Custom("CREATE".to_string())
        );
        assert_eq!(HttpMethod::from("get"), HttpMethod::Custom("get".to_string()));
        assert_eq!(HttpMethod::Custom("PURGE".into()).to_string(), "PURGE");
    }

    #[test]
    fn test_method_serializes_as_verb() {
        let json = serde_json::to_string(&HttpMethod::Put).unwrap();
        assert_eq!(json, r#""PUT""#);
        let back: HttpMethod = serde_json::from_str(r#""LINK""#).unwrap();
        assert_eq!(back, HttpMethod::Custom("LINK".into()));
    }

    #[test]
    fn test_transport_failures() {
        assert!(HttpError::Timeout { timeout_ms: 100 }.is_transport_failure());
        assert!(HttpError::ConnectionFailed {
            reason: "reset".into()
        }
        .is_transport_failure());
        assert!(!HttpError::InvalidUrl { url: "x".into() }.is_transport_failure());
        assert!(!HttpError::RequestFailed {
            reason: "bad".into()
        }
        .is_transport_failure());
    }

    #[tokio::test]
    async fn test_client_chain_forwards_to_client() {
        let client = EchoClient;
        let chain = ClientChain::new(&client, HttpRequest::get("https://example.com/a"));
        let request = chain.request().clone();

        let response = chain.proceed(request).await.unwrap();
        assert_eq!(response.body, "https://example.com/a");
    }
}
