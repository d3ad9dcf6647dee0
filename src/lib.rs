//! Request aggregator library.
//!
//! Fans each inbound request out to a fixed list of upstreams, bounds every
//! call with a deadline, and returns the outcomes in upstream order.

pub mod config;
pub mod fanout;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::AggregatorConfig;
pub use fanout::{AggregateResult, CollectError, FanOutCollector, Outcome};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::{Endpoint, EndpointList, HttpCaller, UpstreamCaller};
