//! Response rendering.
//!
//! # Responsibilities
//! - Render an `AggregateResult` as the JSON array clients receive
//! - Render the detailed per-endpoint view
//!
//! # Design Decisions
//! - Failures become human-readable strings at the endpoint's index
//! - Payloads are passed through as text (lossy UTF-8)

use serde::Serialize;

use crate::fanout::{AggregateResult, FailureReason, Outcome, OutcomeKind};
use crate::upstream::{Endpoint, EndpointList};

/// Sentinel for an upstream that did not answer before the deadline.
pub const TIMEOUT_MESSAGE: &str = "Server didn't respond";

/// Sentinel for an upstream that could not be reached.
pub fn unreachable_message(endpoint: &Endpoint) -> String {
    format!("Server {} is down!", endpoint.address())
}

fn payload_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}

/// One entry per endpoint: the payload text or a failure sentinel.
pub fn aggregate_body(endpoints: &EndpointList, result: &AggregateResult) -> Vec<String> {
    endpoints
        .iter()
        .zip(result)
        .map(|(endpoint, outcome)| match outcome {
            Outcome::Success(payload) => payload_text(payload),
            Outcome::Failure(FailureReason::Unreachable) => unreachable_message(endpoint),
            Outcome::Failure(FailureReason::Timeout) => TIMEOUT_MESSAGE.to_string(),
        })
        .collect()
}

/// Per-endpoint entry of the detailed view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeView {
    pub endpoint: String,
    pub address: String,
    pub status: OutcomeKind,
    pub payload: Option<String>,
}

pub fn detailed_body(endpoints: &EndpointList, result: &AggregateResult) -> Vec<OutcomeView> {
    endpoints
        .iter()
        .zip(result)
        .map(|(endpoint, outcome)| OutcomeView {
            endpoint: endpoint.name().to_string(),
            address: endpoint.address().to_string(),
            status: outcome.kind(),
            payload: outcome.payload().map(|p| payload_text(p)),
        })
        .collect()
}
