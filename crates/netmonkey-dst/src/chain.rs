//! Fake call chain
//!
//! TigerStyle: Canned reply, recorded forwarding.

use async_trait::async_trait;
use netmonkey_core::{Chain, HttpRequest, HttpResponse, HttpResult};
use std::sync::{Arc, Mutex, PoisonError};

/// What a [`FakeChain`] saw, readable after the chain is consumed
#[derive(Debug, Default)]
pub struct ChainLog {
    forwarded: Mutex<Vec<HttpRequest>>,
}

impl ChainLog {
    /// Requests passed to `proceed`, in order
    pub fn forwarded(&self) -> Vec<HttpRequest> {
        self.forwarded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn forwarded_count(&self) -> usize {
        self.forwarded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn record(&self, request: HttpRequest) {
        self.forwarded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}

/// Chain that answers with a fixed reply and records what it forwards
#[derive(Debug)]
pub struct FakeChain {
    request: HttpRequest,
    reply: HttpResult<HttpResponse>,
    log: Arc<ChainLog>,
}

impl FakeChain {
    /// Chain whose forwarded call succeeds with `response`
    pub fn responding(request: HttpRequest, response: HttpResponse) -> Self {
        Self::new(request, Ok(response))
    }

    pub fn new(request: HttpRequest, reply: HttpResult<HttpResponse>) -> Self {
        Self {
            request,
            reply,
            log: Arc::new(ChainLog::default()),
        }
    }

    /// Share the log with another chain, e.g. across many calls
    pub fn with_log(mut self, log: Arc<ChainLog>) -> Self {
        self.log = log;
        self
    }

    /// Handle to the log, valid after the chain is consumed
    pub fn log(&self) -> Arc<ChainLog> {
        self.log.clone()
    }
}

#[async_trait]
impl Chain for FakeChain {
    fn request(&self) -> &HttpRequest {
        &self.request
    }

    async fn proceed(self, request: HttpRequest) -> HttpResult<HttpResponse> {
        self.log.record(request);
        self.reply
    }
}
