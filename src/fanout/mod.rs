//! Fan-out subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → collector.rs (one task per endpoint, started together)
//!         → resilience::timeouts (per-call deadline race)
//!             → upstream::caller (GET)
//!     → outcome.rs (Outcome per endpoint)
//!     → AggregateResult (index-aligned with the endpoint list)
//!
//! Per endpoint, per request:
//!     Pending → Succeeded | TimedOut | Unreachable
//! ```

pub mod collector;
pub mod outcome;

pub use collector::{CollectError, FanOutCollector};
pub use outcome::{AggregateResult, FailureReason, Outcome, OutcomeKind};
