//! Upstream endpoint addressing.
//!
//! # Responsibilities
//! - Represent a single upstream service address
//! - Hold the ordered, read-only list of upstreams shared by all requests
//!
//! # Design Decisions
//! - The list is an `Arc<[Endpoint]>`: cloning per request is a refcount bump
//! - The request URI is parsed once at startup, never per call

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use axum::http::Uri;
use url::Url;

use crate::config::UpstreamConfig;

/// Error building an endpoint from configuration.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid upstream URL '{url}': {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upstream URL '{url}' is not a valid request URI: {source}")]
    Uri {
        url: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },
}

/// A single upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    name: String,
    address: String,
    url: Url,
    uri: Uri,
}

impl Endpoint {
    /// Parse an endpoint whose name is its address.
    pub fn parse(address: impl Into<String>) -> Result<Self, EndpointError> {
        let address = address.into();
        Self::named(address.clone(), address)
    }

    /// Parse an endpoint with an explicit name.
    pub fn named(name: impl Into<String>, address: impl Into<String>) -> Result<Self, EndpointError> {
        let address = address.into();
        let url = Url::parse(&address).map_err(|source| EndpointError::Url {
            url: address.clone(),
            source,
        })?;
        let uri = url
            .as_str()
            .parse::<Uri>()
            .map_err(|source| EndpointError::Uri {
                url: address.clone(),
                source,
            })?;

        Ok(Self {
            name: name.into(),
            address,
            url,
            uri,
        })
    }

    /// Identifier used in logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The address exactly as configured.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Normalized URL, as reported by `/status`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Pre-parsed URI for outbound requests.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl TryFrom<&UpstreamConfig> for Endpoint {
    type Error = EndpointError;

    fn try_from(config: &UpstreamConfig) -> Result<Self, Self::Error> {
        Self::named(config.display_name(), config.url.clone())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Ordered upstream list. Order defines the order of aggregated results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointList(Arc<[Endpoint]>);

impl EndpointList {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self(endpoints.into())
    }

    /// Build the list from configuration, preserving declaration order.
    pub fn from_config(upstreams: &[UpstreamConfig]) -> Result<Self, EndpointError> {
        upstreams
            .iter()
            .map(Endpoint::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl Deref for EndpointList {
    type Target = [Endpoint];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Endpoint> for EndpointList {
    fn from_iter<I: IntoIterator<Item = Endpoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
