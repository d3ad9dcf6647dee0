//! Per-endpoint outcomes and the aggregated result.

use std::ops::Index;

use axum::body::Bytes;
use serde::Serialize;

/// Why an upstream produced no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// Connection failed, transport error, or a non-success status.
    Unreachable,
    /// The deadline elapsed before the upstream answered.
    Timeout,
}

/// Result of one guarded upstream call. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Bytes),
    Failure(FailureReason),
}

/// Terminal state of an endpoint within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Succeeded,
    TimedOut,
    Unreachable,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Succeeded => "succeeded",
            OutcomeKind::TimedOut => "timed_out",
            OutcomeKind::Unreachable => "unreachable",
        }
    }
}

impl Outcome {
    pub fn unreachable() -> Self {
        Outcome::Failure(FailureReason::Unreachable)
    }

    pub fn timeout() -> Self {
        Outcome::Failure(FailureReason::Timeout)
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success(_) => OutcomeKind::Succeeded,
            Outcome::Failure(FailureReason::Timeout) => OutcomeKind::TimedOut,
            Outcome::Failure(FailureReason::Unreachable) => OutcomeKind::Unreachable,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            Outcome::Success(payload) => Some(payload),
            Outcome::Failure(_) => None,
        }
    }
}

/// Outcomes index-aligned with the endpoint list they were collected from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateResult(Vec<Outcome>);

impl AggregateResult {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self(outcomes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Outcome> {
        self.0.iter()
    }

    /// Outcome kinds in endpoint order, ignoring payload content.
    pub fn kinds(&self) -> Vec<OutcomeKind> {
        self.0.iter().map(Outcome::kind).collect()
    }
}

impl Index<usize> for AggregateResult {
    type Output = Outcome;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a AggregateResult {
    type Item = &'a Outcome;
    type IntoIter = std::slice::Iter<'a, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
