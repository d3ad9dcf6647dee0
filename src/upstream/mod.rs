//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! [[upstreams]] config
//!     → endpoint.rs (Endpoint, ordered EndpointList)
//!     → caller.rs (one GET per endpoint per request)
//!     → payload bytes or CallError
//! ```

pub mod caller;
pub mod endpoint;

pub use caller::{CallError, HttpCaller, UpstreamCaller};
pub use endpoint::{Endpoint, EndpointError, EndpointList};
