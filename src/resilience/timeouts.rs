//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race one upstream call against a fixed deadline
//! - Turn every resolution (payload, error, deadline) into an `Outcome` value
//! - Cancel the losing call when the deadline wins
//!
//! # Design Decisions
//! - Uses `tokio::time::timeout`; on expiry the call future is dropped, which
//!   aborts the in-flight request and releases its connection
//! - The guard never returns an error
//! - A call that fails before the deadline resolves immediately as `Unreachable`

use std::time::{Duration, Instant};

use crate::fanout::Outcome;
use crate::observability::metrics;
use crate::upstream::{Endpoint, UpstreamCaller};

/// Deadline wrapper around a single upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Call `endpoint` and resolve to whichever comes first: payload, error, or deadline.
    pub async fn guard<C>(&self, caller: &C, endpoint: &Endpoint) -> Outcome
    where
        C: UpstreamCaller + ?Sized,
    {
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.deadline, caller.call(endpoint)).await {
            Ok(Ok(payload)) => {
                tracing::debug!(
                    endpoint = %endpoint.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Upstream succeeded"
                );
                Outcome::Success(payload)
            }
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %endpoint.name(), error = %e, "Upstream unreachable");
                Outcome::unreachable()
            }
            Err(_) => {
                tracing::warn!(
                    endpoint = %endpoint.name(),
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Upstream timed out"
                );
                Outcome::timeout()
            }
        };

        metrics::record_upstream_call(endpoint.name(), outcome.kind(), started.elapsed());
        outcome
    }
}
