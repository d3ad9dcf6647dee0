//! Concurrent fan-out and ordered collection.
//!
//! # Responsibilities
//! - Start one guarded call per endpoint, all at once
//! - Wait for every guard (a barrier, not a race)
//! - Place each outcome at its endpoint's index
//!
//! # Design Decisions
//! - One `JoinSet` task per endpoint; total latency is the slowest guard, not the sum
//! - Results land in slots pre-sized to the endpoint count, addressed by index
//! - Dropping `collect` drops the `JoinSet`, which aborts every in-flight guard
//! - `CollectError` only reports bugs in the collector itself (a panicked or
//!   cancelled task); upstream failures are always `Outcome` values

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

use crate::fanout::{AggregateResult, Outcome};
use crate::observability::metrics;
use crate::resilience::TimeoutGuard;
use crate::upstream::{EndpointList, UpstreamCaller};

/// Collector-internal failure. Never caused by an upstream.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("guard task failed: {0}")]
    Task(#[from] JoinError),

    #[error("no outcome recorded for endpoint {index}")]
    Unresolved { index: usize },
}

/// Fans one request out to every endpoint and gathers the outcomes in order.
#[derive(Clone)]
pub struct FanOutCollector {
    caller: Arc<dyn UpstreamCaller>,
    guard: TimeoutGuard,
}

impl FanOutCollector {
    pub fn new(caller: Arc<dyn UpstreamCaller>, deadline: Duration) -> Self {
        Self {
            caller,
            guard: TimeoutGuard::new(deadline),
        }
    }

    pub fn deadline(&self) -> Duration {
        self.guard.deadline()
    }

    /// Query every endpoint once and return outcomes index-aligned with `endpoints`.
    pub async fn collect(&self, endpoints: &EndpointList) -> Result<AggregateResult, CollectError> {
        let started = Instant::now();
        let mut join_set = JoinSet::new();

        for (index, endpoint) in endpoints.iter().enumerate() {
            let caller = Arc::clone(&self.caller);
            let guard = self.guard;
            let endpoint = endpoint.clone();
            let span = tracing::debug_span!("upstream", index, endpoint = %endpoint.name());

            join_set.spawn(
                async move {
                    let outcome = guard.guard(caller.as_ref(), &endpoint).await;
                    (index, outcome)
                }
                .instrument(span),
            );
        }

        let mut slots: Vec<Option<Outcome>> = (0..endpoints.len()).map(|_| None).collect();

        while let Some(joined) = join_set.join_next().await {
            let (index, outcome) = joined.inspect_err(|e| {
                tracing::error!(error = %e, "Guard task failed");
            })?;
            slots[index] = Some(outcome);
        }

        let outcomes = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(CollectError::Unresolved { index }))
            .collect::<Result<Vec<_>, _>>()?;

        let elapsed = started.elapsed();
        metrics::record_collect(elapsed);
        tracing::debug!(
            endpoints = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Fan-out complete"
        );

        Ok(AggregateResult::new(outcomes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::OutcomeKind;
    use crate::upstream::{CallError, Endpoint};
    use async_trait::async_trait;
    use axum::{body::Bytes, http::StatusCode};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    enum Behavior {
        Respond { delay_ms: u64, body: &'static str },
        Fail { delay_ms: u64 },
        Hang,
        Panic,
    }

    /// Scripted upstreams keyed by endpoint address.
    #[derive(Default)]
    struct ScriptedCaller {
        behaviors: HashMap<String, Behavior>,
        calls: AtomicUsize,
    }

    impl ScriptedCaller {
        fn with(mut self, address: &str, behavior: Behavior) -> Self {
            self.behaviors.insert(address.to_string(), behavior);
            self
        }
    }

    #[async_trait]
    impl UpstreamCaller for ScriptedCaller {
        async fn call(&self, endpoint: &Endpoint) -> Result<Bytes, CallError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviors.get(endpoint.address()).cloned() {
                Some(Behavior::Respond { delay_ms, body }) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Ok(Bytes::from_static(body.as_bytes()))
                }
                Some(Behavior::Fail { delay_ms }) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Err(CallError::Status(StatusCode::SERVICE_UNAVAILABLE))
                }
                Some(Behavior::Hang) | None => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                Some(Behavior::Panic) => panic!("scripted panic"),
            }
        }
    }

    /// Never answers; counts in-flight calls that get dropped.
    struct Abandoned {
        dropped: Arc<AtomicUsize>,
    }

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl UpstreamCaller for Abandoned {
        async fn call(&self, _endpoint: &Endpoint) -> Result<Bytes, CallError> {
            let _counter = DropCounter(self.dropped.clone());
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn endpoints(addresses: &[&str]) -> EndpointList {
        addresses
            .iter()
            .map(|a| Endpoint::parse(*a).unwrap())
            .collect()
    }

    const A: &str = "http://localhost:3001";
    const B: &str = "http://localhost:3002";
    const C: &str = "http://localhost:3420";
    const D: &str = "http://localhost:3003";

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_follow_declaration_order_not_completion_order() {
        // Latencies reversed relative to declaration order
        let caller = ScriptedCaller::default()
            .with(A, Behavior::Respond { delay_ms: 400, body: "a" })
            .with(B, Behavior::Respond { delay_ms: 300, body: "b" })
            .with(C, Behavior::Respond { delay_ms: 200, body: "c" })
            .with(D, Behavior::Respond { delay_ms: 100, body: "d" });
        let collector = FanOutCollector::new(Arc::new(caller), Duration::from_millis(4000));

        let result = collector.collect(&endpoints(&[A, B, C, D])).await.unwrap();

        let payloads: Vec<_> = result.iter().map(|o| o.payload().cloned()).collect();
        assert_eq!(
            payloads,
            vec![
                Some(Bytes::from("a")),
                Some(Bytes::from("b")),
                Some(Bytes::from("c")),
                Some(Bytes::from("d")),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_outcomes_keep_length_and_index() {
        let caller = ScriptedCaller::default()
            .with(A, Behavior::Respond { delay_ms: 10, body: "42" })
            .with(B, Behavior::Hang)
            .with(C, Behavior::Fail { delay_ms: 5 })
            .with(D, Behavior::Respond { delay_ms: 20, body: "7" });
        let collector = FanOutCollector::new(Arc::new(caller), Duration::from_millis(4000));

        let result = collector.collect(&endpoints(&[A, B, C, D])).await.unwrap();

        assert_eq!(result.len(), 4);
        assert_eq!(result[0], Outcome::Success(Bytes::from("42")));
        assert_eq!(result[1], Outcome::timeout());
        assert_eq!(result[2], Outcome::unreachable());
        assert_eq!(result[3], Outcome::Success(Bytes::from("7")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_failure_is_a_full_result_not_an_error() {
        let caller = ScriptedCaller::default()
            .with(A, Behavior::Fail { delay_ms: 1 })
            .with(B, Behavior::Hang)
            .with(C, Behavior::Fail { delay_ms: 1 });
        let collector = FanOutCollector::new(Arc::new(caller), Duration::from_millis(500));

        let result = collector.collect(&endpoints(&[A, B, C])).await.unwrap();

        assert_eq!(
            result.kinds(),
            vec![OutcomeKind::Unreachable, OutcomeKind::TimedOut, OutcomeKind::Unreachable]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_max_not_sum() {
        let caller = ScriptedCaller::default()
            .with(A, Behavior::Respond { delay_ms: 1000, body: "a" })
            .with(B, Behavior::Respond { delay_ms: 1000, body: "b" })
            .with(C, Behavior::Respond { delay_ms: 1000, body: "c" })
            .with(D, Behavior::Respond { delay_ms: 1000, body: "d" });
        let collector = FanOutCollector::new(Arc::new(caller), Duration::from_millis(4000));

        let start = tokio::time::Instant::now();
        let result = collector.collect(&endpoints(&[A, B, C, D])).await.unwrap();
        let elapsed = start.elapsed();

        assert!(result.iter().all(Outcome::is_success));
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1100), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_upstreams_bounded_by_one_deadline() {
        let caller = ScriptedCaller::default();
        let collector = FanOutCollector::new(Arc::new(caller), Duration::from_millis(4000));

        let start = tokio::time::Instant::now();
        let result = collector.collect(&endpoints(&[A, B, C, D])).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(result.kinds(), vec![OutcomeKind::TimedOut; 4]);
        assert!(elapsed < Duration::from_millis(4100), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_endpoint_called_exactly_once() {
        let caller = Arc::new(
            ScriptedCaller::default()
                .with(A, Behavior::Fail { delay_ms: 1 })
                .with(B, Behavior::Respond { delay_ms: 1, body: "b" }),
        );
        let collector = FanOutCollector::new(caller.clone(), Duration::from_millis(100));

        collector.collect(&endpoints(&[A, B])).await.unwrap();
        assert_eq!(caller.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_collects_are_structurally_identical() {
        let caller = ScriptedCaller::default()
            .with(A, Behavior::Respond { delay_ms: 5, body: "1" })
            .with(C, Behavior::Fail { delay_ms: 5 });
        let collector = FanOutCollector::new(Arc::new(caller), Duration::from_millis(200));
        let list = endpoints(&[A, B, C]);

        let first = collector.collect(&list).await.unwrap();
        let second = collector.collect(&list).await.unwrap();
        assert_eq!(first.kinds(), second.kinds());
    }

    #[tokio::test]
    async fn test_empty_list_yields_empty_result() {
        let collector =
            FanOutCollector::new(Arc::new(ScriptedCaller::default()), Duration::from_millis(100));
        let result = collector.collect(&EndpointList::new(Vec::new())).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_guard_is_a_collector_error() {
        let caller = ScriptedCaller::default()
            .with(A, Behavior::Respond { delay_ms: 1, body: "a" })
            .with(B, Behavior::Panic);
        let collector = FanOutCollector::new(Arc::new(caller), Duration::from_millis(100));

        let err = collector.collect(&endpoints(&[A, B])).await.unwrap_err();
        assert!(matches!(err, CollectError::Task(ref e) if e.is_panic()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_collect_cancels_every_guard() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let caller = Abandoned { dropped: dropped.clone() };
        let collector = FanOutCollector::new(Arc::new(caller), Duration::from_secs(60));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            collector.collect(&endpoints(&[A, B, C])),
        )
        .await;
        assert!(abandoned.is_err(), "collect should still be waiting on its guards");

        // Aborted tasks are dropped on their next scheduling
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(dropped.load(Ordering::SeqCst), 3);
    }
}
