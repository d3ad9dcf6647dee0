//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream URLs and name uniqueness
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AggregatorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::AggregatorConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("no upstreams configured")]
    NoUpstreams,

    #[error("upstream '{url}' is not a valid URL: {reason}")]
    UpstreamUrl { url: String, reason: String },

    #[error("upstream '{0}' must use the http scheme")]
    UpstreamScheme(String),

    #[error("duplicate upstream name '{0}'")]
    DuplicateUpstream(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("request timeout ({request_ms}ms) must exceed the upstream deadline ({deadline_ms}ms)")]
    RequestTimeoutTooShort { request_ms: u64, deadline_ms: u64 },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AggregatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_concurrent_requests == 0 {
        errors.push(ValidationError::Zero("listener.max_concurrent_requests"));
    }

    if config.upstreams.is_empty() {
        errors.push(ValidationError::NoUpstreams);
    }

    let mut names = HashSet::new();
    for upstream in &config.upstreams {
        // An http URL without a host already fails to parse
        match Url::parse(&upstream.url) {
            Ok(url) if url.scheme() != "http" => {
                errors.push(ValidationError::UpstreamScheme(upstream.url.clone()));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::UpstreamUrl {
                url: upstream.url.clone(),
                reason: e.to_string(),
            }),
        }

        if !names.insert(upstream.display_name()) {
            errors.push(ValidationError::DuplicateUpstream(
                upstream.display_name().to_string(),
            ));
        }
    }

    let timeouts = &config.timeouts;
    if timeouts.deadline_ms == 0 {
        errors.push(ValidationError::Zero("timeouts.deadline_ms"));
    }
    if timeouts.connect_ms == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_ms"));
    }
    if timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    } else if timeouts.request_secs.saturating_mul(1000) <= timeouts.deadline_ms {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_ms: timeouts.request_secs.saturating_mul(1000),
            deadline_ms: timeouts.deadline_ms,
        });
    }

    if config.caller.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("caller.max_body_bytes"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
