//! Outbound upstream calls.
//!
//! # Responsibilities
//! - Issue exactly one GET per invocation, no retries
//! - Return the response body as opaque bytes
//! - Classify connection errors, non-2xx statuses and body failures as errors
//!
//! # Design Decisions
//! - `UpstreamCaller` is a trait so the collector can run against scripted callers in tests
//! - The HTTP client is pooled and shared; invocations share no mutable state
//! - Dropping the returned future cancels the call and releases its connection

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, Method, Request, StatusCode},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{CallerConfig, TimeoutConfig};
use crate::upstream::Endpoint;

/// Why a single upstream call failed.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("failed to build request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream returned {0}")]
    Status(StatusCode),

    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),
}

/// Performs one call to one upstream.
#[async_trait]
pub trait UpstreamCaller: Send + Sync {
    async fn call(&self, endpoint: &Endpoint) -> Result<Bytes, CallError>;
}

/// `UpstreamCaller` backed by a pooled hyper client.
#[derive(Clone)]
pub struct HttpCaller {
    client: Client<HttpConnector, Body>,
    user_agent: HeaderValue,
    max_body_bytes: usize,
}

impl HttpCaller {
    pub fn new(caller: &CallerConfig, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_millis(timeouts.connect_ms)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        let user_agent = HeaderValue::from_str(&caller.user_agent).unwrap_or_else(|_| {
            tracing::warn!(user_agent = %caller.user_agent, "Invalid user agent, using default");
            HeaderValue::from_static("request-aggregator")
        });

        Self {
            client,
            user_agent,
            max_body_bytes: caller.max_body_bytes,
        }
    }
}

#[async_trait]
impl UpstreamCaller for HttpCaller {
    async fn call(&self, endpoint: &Endpoint) -> Result<Bytes, CallError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(endpoint.uri().clone())
            .header(header::USER_AGENT, self.user_agent.clone())
            .body(Body::empty())?;

        let response = self.client.request(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Status(status));
        }

        let body = axum::body::to_bytes(Body::new(response.into_body()), self.max_body_bytes).await?;

        tracing::trace!(endpoint = %endpoint.name(), bytes = body.len(), "Upstream responded");
        Ok(body)
    }
}
