//! Interceptor seam between an HTTP client and the stage
//!
//! TigerStyle: One trait, swappable between live and no-op.

use crate::stage::FaultInjectionStage;
use async_trait::async_trait;
use netmonkey_core::{Chain, ClientChain, HttpClient, HttpRequest, HttpResponse, HttpResult};
use std::sync::Arc;

/// A pipeline stage that sees every call before it is forwarded
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Handle one call, forwarding it through `chain` at most once
    async fn intercept<C: Chain>(&self, chain: C) -> HttpResult<HttpResponse>;
}

#[async_trait]
impl Interceptor for FaultInjectionStage {
    async fn intercept<C: Chain>(&self, chain: C) -> HttpResult<HttpResponse> {
        FaultInjectionStage::intercept(self, chain).await
    }
}

#[async_trait]
impl<T: Interceptor> Interceptor for Arc<T> {
    async fn intercept<C: Chain>(&self, chain: C) -> HttpResult<HttpResponse> {
        (**self).intercept(chain).await
    }
}

/// Interceptor that forwards every call untouched
///
/// Drop-in for builds where fault injection must be compiled in but inert.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpInterceptor;

#[async_trait]
impl Interceptor for NoOpInterceptor {
    async fn intercept<C: Chain>(&self, chain: C) -> HttpResult<HttpResponse> {
        let request = chain.request().clone();
        chain.proceed(request).await
    }
}

/// HTTP client that routes every request through an interceptor
#[derive(Debug, Clone)]
pub struct MonkeyClient<I, C> {
    interceptor: I,
    inner: C,
}

impl<I: Interceptor, C: HttpClient> MonkeyClient<I, C> {
    pub fn new(interceptor: I, inner: C) -> Self {
        Self { interceptor, inner }
    }

    pub fn interceptor(&self) -> &I {
        &self.interceptor
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<I: Interceptor, C: HttpClient> HttpClient for MonkeyClient<I, C> {
    async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        let chain = ClientChain::new(&self.inner, request);
        self.interceptor.intercept(chain).await
    }
}
