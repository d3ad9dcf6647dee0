//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, concurrency limit, timeout)
//! - Fan each aggregate request out through the collector
//! - Serve until the shutdown signal, then drain

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AggregatorConfig;
use crate::fanout::{AggregateResult, FanOutCollector};
use crate::http::request::{make_request_span, MakeRequestUuidV4};
use crate::http::response::{aggregate_body, detailed_body};
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::observability::metrics;
use crate::upstream::{EndpointError, EndpointList, HttpCaller, UpstreamCaller};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub endpoints: EndpointList,
    pub collector: FanOutCollector,
}

/// HTTP server for the aggregator.
pub struct HttpServer {
    router: Router,
    config: AggregatorConfig,
}

impl HttpServer {
    /// Create a server that calls upstreams over HTTP.
    pub fn new(config: AggregatorConfig) -> Result<Self, EndpointError> {
        let endpoints = EndpointList::from_config(&config.upstreams)?;
        let caller = Arc::new(HttpCaller::new(&config.caller, &config.timeouts));
        Ok(Self::with_caller(config, endpoints, caller))
    }

    /// Create a server around an arbitrary caller.
    pub fn with_caller(
        config: AggregatorConfig,
        endpoints: EndpointList,
        caller: Arc<dyn UpstreamCaller>,
    ) -> Self {
        let collector =
            FanOutCollector::new(caller, Duration::from_millis(config.timeouts.deadline_ms));
        let state = AppState {
            endpoints,
            collector,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AggregatorConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(aggregate_handler))
            .route("/detailed", get(detailed_handler))
            .route("/status", get(status_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(ConcurrencyLimitLayer::new(config.listener.max_concurrent_requests))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server until `shutdown` fires, then let in-flight requests finish.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstreams = self.config.upstreams.len(),
            deadline_ms = self.config.timeouts.deadline_ms,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Fan out, then render with `render`. 500 only on a collector bug.
async fn collect_and_render<T, F>(state: &AppState, route: &'static str, render: F) -> Response
where
    T: Serialize,
    F: FnOnce(&EndpointList, &AggregateResult) -> T,
{
    match state.collector.collect(&state.endpoints).await {
        Ok(result) => {
            metrics::record_request(route, StatusCode::OK.as_u16());
            Json(render(&state.endpoints, &result)).into_response()
        }
        Err(e) => {
            tracing::error!(route, error = %e, "Aggregation failed");
            metrics::record_request(route, StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            (StatusCode::INTERNAL_SERVER_ERROR, "Aggregation failed").into_response()
        }
    }
}

async fn aggregate_handler(State(state): State<AppState>) -> Response {
    collect_and_render(&state, "aggregate", aggregate_body).await
}

async fn detailed_handler(State(state): State<AppState>) -> Response {
    collect_and_render(&state, "detailed", detailed_body).await
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub deadline_ms: u64,
    pub upstreams: Vec<UpstreamStatus>,
}

#[derive(Debug, Serialize)]
pub struct UpstreamStatus {
    pub name: String,
    pub address: String,
    pub url: String,
}

async fn status_handler(State(state): State<AppState>) -> Json<SystemStatus> {
    metrics::record_request("status", StatusCode::OK.as_u16());
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        deadline_ms: state.collector.deadline().as_millis() as u64,
        upstreams: state
            .endpoints
            .iter()
            .map(|e| UpstreamStatus {
                name: e.name().to_string(),
                address: e.address().to_string(),
                url: e.url().to_string(),
            })
            .collect(),
    })
}
