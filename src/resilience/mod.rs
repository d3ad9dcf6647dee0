//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to upstream:
//!     → timeouts.rs (race the call against the deadline)
//!     → Outcome (payload, Unreachable, or Timeout)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Exactly one call per upstream per request: no retries, no circuit breaking
//! - Failures are recovered here and never propagate past the guard

pub mod timeouts;

pub use timeouts::TimeoutGuard;
