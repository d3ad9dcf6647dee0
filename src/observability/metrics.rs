//! Metrics collection and exposition.
//!
//! # Metrics
//! - `aggregator_upstream_calls_total` (counter): guarded calls by endpoint, outcome
//! - `aggregator_upstream_call_duration_seconds` (histogram): per-endpoint latency
//! - `aggregator_collect_duration_seconds` (histogram): whole fan-out latency
//! - `aggregator_requests_total` (counter): inbound requests by route, status
//!
//! Recording without an installed exporter is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::fanout::OutcomeKind;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record the resolution of one guarded upstream call.
pub fn record_upstream_call(endpoint: &str, kind: OutcomeKind, elapsed: Duration) {
    metrics::counter!(
        "aggregator_upstream_calls_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => kind.as_str()
    )
    .increment(1);

    metrics::histogram!(
        "aggregator_upstream_call_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Record the wall-clock time of one complete fan-out.
pub fn record_collect(elapsed: Duration) {
    metrics::histogram!("aggregator_collect_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record an inbound request.
pub fn record_request(route: &'static str, status: u16) {
    metrics::counter!(
        "aggregator_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}
