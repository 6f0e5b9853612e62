//! Fault execution
//!
//! TigerStyle: One pass through an explicit state machine per call.
//!
//! ```text
//! Passthrough ──► PreEffectApplied ──► Forwarded ──► PostEffectApplied
//!      │                                   ▲
//!      ├───────────────────────────────────┘
//!      └──► ShortCircuited
//! ```
//!
//! The chain is consumed when forwarded, so no branch can forward twice.
//! Every forwarded call ends in `PostEffectApplied`; errors from the
//! forwarded call are returned untouched.

use crate::connectivity::{drop_connectivity, restore_connectivity, ConnectivityController};
use crate::rule::Rule;
use netmonkey_core::constants::FORCED_FAILURE_REASON;
use netmonkey_core::{
    Chain, Error, Fault, HttpError, HttpRequest, HttpResponse, HttpResult, Result, TimeProvider,
};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Where a call is in its pass through the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Passthrough,
    PreEffectApplied,
    Forwarded,
    PostEffectApplied,
    ShortCircuited,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::PostEffectApplied | CallState::ShortCircuited)
    }

    /// Check whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: CallState) -> bool {
        use CallState::*;
        matches!(
            (self, next),
            (Passthrough, PreEffectApplied)
                | (Passthrough, Forwarded)
                | (Passthrough, ShortCircuited)
                | (PreEffectApplied, Forwarded)
                | (Forwarded, PostEffectApplied)
        )
    }

    fn advance(&mut self, next: CallState) {
        debug_assert!(
            self.can_transition_to(next),
            "illegal call state transition {:?} -> {:?}",
            self,
            next
        );
        *self = next;
    }
}

/// What the executor did to a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
    /// Forwarded without modification
    PassedThrough,
    /// Held for `ms` before forwarding
    Delayed { ms: u64 },
    /// Connectivity taken down, re-enable scheduled after `off_ms`
    ConnectivityDropped { off_ms: u64 },
    /// Connectivity could not be toggled; forwarded unchanged
    ConnectivityUnavailable,
    /// Failed with a synthetic transport error, never forwarded
    ShortCircuited,
    /// Successful status `from` rewritten to `to`
    StatusOverridden { from: u16, to: u16 },
    /// Response already failing; status left alone
    StatusPreserved { status: u16 },
}

impl FaultOutcome {
    /// Get a human-readable name for this outcome
    pub fn name(&self) -> &'static str {
        match self {
            FaultOutcome::PassedThrough => "passed_through",
            FaultOutcome::Delayed { .. } => "delayed",
            FaultOutcome::ConnectivityDropped { .. } => "connectivity_dropped",
            FaultOutcome::ConnectivityUnavailable => "connectivity_unavailable",
            FaultOutcome::ShortCircuited => "short_circuited",
            FaultOutcome::StatusOverridden { .. } => "status_overridden",
            FaultOutcome::StatusPreserved { .. } => "status_preserved",
        }
    }

    /// Whether the call was actually perturbed
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            FaultOutcome::Delayed { .. }
                | FaultOutcome::ConnectivityDropped { .. }
                | FaultOutcome::ShortCircuited
                | FaultOutcome::StatusOverridden { .. }
        )
    }
}

/// Result of running one call through the executor
#[derive(Debug)]
pub struct Execution {
    pub result: HttpResult<HttpResponse>,
    pub outcome: FaultOutcome,
    pub state: CallState,
}

impl Execution {
    fn finish(
        result: HttpResult<HttpResponse>,
        outcome: FaultOutcome,
        mut state: CallState,
    ) -> Self {
        if state == CallState::Forwarded {
            state.advance(CallState::PostEffectApplied);
        }
        Self {
            result,
            outcome,
            state,
        }
    }
}

async fn forward<C: Chain>(
    chain: C,
    request: HttpRequest,
    state: &mut CallState,
) -> HttpResult<HttpResponse> {
    let result = chain.proceed(request).await;
    state.advance(CallState::Forwarded);
    result
}

/// Applies a selected rule's fault around the forwarded call
#[derive(Debug, Clone)]
pub struct FaultExecutor {
    time: Arc<dyn TimeProvider>,
    connectivity: Arc<dyn ConnectivityController>,
    settle_ms: u64,
}

impl FaultExecutor {
    pub fn new(
        time: Arc<dyn TimeProvider>,
        connectivity: Arc<dyn ConnectivityController>,
        settle_ms: u64,
    ) -> Self {
        Self {
            time,
            connectivity,
            settle_ms,
        }
    }

    /// Run `chain` through the state machine, applying `rule` if given
    ///
    /// `status_code_override` replaces the code written by a status override.
    pub async fn execute<C: Chain>(
        &self,
        rule: Option<&Rule>,
        chain: C,
        status_code_override: Option<u16>,
    ) -> Execution {
        let request = chain.request().clone();
        let mut state = CallState::Passthrough;

        let rule = match rule {
            Some(rule) if !rule.fault().is_inert() => rule,
            _ => {
                let result = forward(chain, request, &mut state).await;
                return Execution::finish(result, FaultOutcome::PassedThrough, state);
            }
        };

        match *rule.fault() {
            Fault::Delay { duration_ms } => {
                tracing::info!(
                    rule_id = %rule.id(),
                    fault = rule.fault().name(),
                    method = %request.method,
                    url = %request.url,
                    delay_ms = duration_ms,
                    "{}",
                    rule.description()
                );
                self.time.sleep_ms(duration_ms).await;
                state.advance(CallState::PreEffectApplied);

                let result = forward(chain, request, &mut state).await;
                Execution::finish(result, FaultOutcome::Delayed { ms: duration_ms }, state)
            }

            Fault::ConnectivityDrop { off_ms } => {
                let outcome = match self.drop_connectivity(off_ms).await {
                    Ok(()) => {
                        tracing::info!(
                            rule_id = %rule.id(),
                            fault = rule.fault().name(),
                            method = %request.method,
                            url = %request.url,
                            off_ms,
                            "{}",
                            rule.description()
                        );
                        state.advance(CallState::PreEffectApplied);
                        FaultOutcome::ConnectivityDropped { off_ms }
                    }
                    Err(e) => {
                        tracing::warn!(
                            rule_id = %rule.id(),
                            fault = rule.fault().name(),
                            error = %e,
                            "Connectivity drop skipped"
                        );
                        FaultOutcome::ConnectivityUnavailable
                    }
                };

                let result = forward(chain, request, &mut state).await;
                Execution::finish(result, outcome, state)
            }

            Fault::ForcedFailure => {
                tracing::info!(
                    rule_id = %rule.id(),
                    fault = rule.fault().name(),
                    method = %request.method,
                    url = %request.url,
                    "{}",
                    rule.description()
                );
                state.advance(CallState::ShortCircuited);
                drop(chain);

                Execution {
                    result: Err(HttpError::ConnectionFailed {
                        reason: FORCED_FAILURE_REASON.to_string(),
                    }),
                    outcome: FaultOutcome::ShortCircuited,
                    state,
                }
            }

            Fault::StatusOverride { code } => {
                let code = status_code_override.unwrap_or(code);
                let method = request.method.clone();
                let url = request.url.clone();

                match forward(chain, request, &mut state).await {
                    Ok(response) if response.is_success() => {
                        let from = response.status;
                        tracing::info!(
                            rule_id = %rule.id(),
                            fault = rule.fault().name(),
                            method = %method,
                            url = %url,
                            from,
                            to = code,
                            "{}",
                            rule.description()
                        );
                        Execution::finish(
                            Ok(response.with_status(code)),
                            FaultOutcome::StatusOverridden { from, to: code },
                            state,
                        )
                    }
                    Ok(response) => {
                        tracing::debug!(
                            rule_id = %rule.id(),
                            status = response.status,
                            "Response already failing, status preserved"
                        );
                        let status = response.status;
                        Execution::finish(
                            Ok(response),
                            FaultOutcome::StatusPreserved { status },
                            state,
                        )
                    }
                    Err(e) => Execution::finish(Err(e), FaultOutcome::PassedThrough, state),
                }
            }
        }
    }

    /// Disable connectivity and schedule the re-enable
    ///
    /// The re-enable runs on its own task and is never cancelled.
    async fn drop_connectivity(&self, off_ms: u64) -> Result<()> {
        let handle = Handle::try_current()
            .map_err(|e| Error::internal(format!("cannot schedule re-enable: {}", e)))?;
        drop_connectivity(self.connectivity.as_ref())?;

        let time = self.time.clone();
        let connectivity = self.connectivity.clone();
        handle.spawn(async move {
            time.sleep_ms(off_ms).await;
            match restore_connectivity(connectivity.as_ref()) {
                Ok(()) => tracing::info!(off_ms, "Connectivity restored"),
                Err(e) => tracing::error!(error = %e, off_ms, "Connectivity restore failed"),
            }
        });

        if self.settle_ms > 0 {
            self.time.sleep_ms(self.settle_ms).await;
        }
        Ok(())
    }
}
