//! Simulated upstream for DST
//!
//! TigerStyle: The far end of the forwarded call, fully scripted.
//!
//! [`SimHttpClient`] is what a stage forwards to in simulation. Responses are
//! chosen by URL prefix, every request is logged, and while a linked
//! [`SimConnectivity`] is down every request fails the way a real client
//! would with no network.

use crate::connectivity::SimConnectivity;
use async_trait::async_trait;
use netmonkey_core::{HttpClient, HttpError, HttpRequest, HttpResponse, HttpResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Oldest entries are dropped past this many logged requests
const RECORDED_REQUESTS_MAX: usize = 10_000;

/// Canned upstream answer
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl MockResponse {
    /// 200 with a JSON content type
    pub fn json(body: impl Into<String>) -> Self {
        Self::text(body).with_header("Content-Type", "application/json")
    }

    /// 200 with no headers
    pub fn text(body: impl Into<String>) -> Self {
        Self::error(200, body)
    }

    pub fn error(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    pub fn server_error() -> Self {
        Self::error(500, "Internal Server Error")
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    fn to_response(&self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::json(r#"{"status": "ok"}"#)
    }
}

/// One request as the upstream saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Arrival order, starting at 0
    pub sequence: u64,
    pub request: HttpRequest,
    /// `None` when the request failed before a response
    pub response_status: Option<u16>,
}

#[derive(Debug, Default)]
struct UpstreamState {
    mocks: HashMap<String, MockResponse>,
    fallback: MockResponse,
    failure: Option<HttpError>,
    log: VecDeque<RecordedRequest>,
}

impl UpstreamState {
    /// Exact URL first, then the longest matching prefix, then the fallback
    fn response_for(&self, url: &str) -> &MockResponse {
        if let Some(exact) = self.mocks.get(url) {
            return exact;
        }
        self.mocks
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, mock)| mock)
            .unwrap_or(&self.fallback)
    }
}

/// Scripted HTTP upstream
pub struct SimHttpClient {
    state: Mutex<UpstreamState>,
    sequence: AtomicU64,
    connectivity: Option<Arc<SimConnectivity>>,
}

impl std::fmt::Debug for SimHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHttpClient")
            .field("request_count", &self.request_count())
            .field("connectivity", &self.connectivity)
            .finish_non_exhaustive()
    }
}

impl Default for SimHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHttpClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(UpstreamState::default()),
            sequence: AtomicU64::new(0),
            connectivity: None,
        }
    }

    /// Fail requests while `connectivity` is down
    pub fn with_connectivity(mut self, connectivity: Arc<SimConnectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Answer requests whose URL starts with `prefix`
    pub async fn mock_url(&self, prefix: impl Into<String>, response: MockResponse) {
        self.state.lock().await.mocks.insert(prefix.into(), response);
    }

    /// Answer requests no mock covers
    pub async fn set_default_response(&self, response: MockResponse) {
        self.state.lock().await.fallback = response;
    }

    /// Fail every request with `failure` until cleared with `None`
    pub async fn set_failure(&self, failure: Option<HttpError>) {
        self.state.lock().await.failure = failure;
    }

    /// Logged requests, oldest first
    pub async fn get_requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.log.iter().cloned().collect()
    }

    /// Requests received, including failed ones and ones dropped from the log
    pub fn request_count(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn is_offline(&self) -> bool {
        self.connectivity
            .as_ref()
            .is_some_and(|connectivity| !connectivity.is_connected())
    }
}

#[async_trait]
impl HttpClient for SimHttpClient {
    async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;

        let result = if self.is_offline() {
            Err(HttpError::ConnectionFailed {
                reason: "simulated network unreachable".to_string(),
            })
        } else if let Some(failure) = &state.failure {
            Err(failure.clone())
        } else {
            Ok(state.response_for(&request.url).to_response())
        };

        if state.log.len() >= RECORDED_REQUESTS_MAX {
            state.log.pop_front();
        }
        state.log.push_back(RecordedRequest {
            sequence,
            request,
            response_status: result.as_ref().ok().map(|response| response.status),
        });

        result
    }
}
