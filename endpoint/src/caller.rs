//! Caller address resolution.
//!
//! Behind a reverse proxy the TCP peer is the proxy itself, so the caller
//! address comes from a header that proxy sets. Only the right-most hop is
//! used: earlier hops are whatever the client chose to send.

use axum::http::{HeaderMap, HeaderName};
use std::net::SocketAddr;

use vantage_types::CallerAddr;

use crate::EndpointError;

#[derive(Clone, Debug, Default)]
pub struct CallerResolver {
    trusted_header: Option<HeaderName>,
}

impl CallerResolver {
    /// Resolve from the TCP peer address only.
    pub fn peer() -> Self {
        Self::default()
    }

    /// Resolve from `header` as written by a trusted proxy.
    pub fn trusted_header(header: &str) -> Result<Self, EndpointError> {
        let name = HeaderName::try_from(header.trim().to_ascii_lowercase())
            .map_err(|e| EndpointError::Config(format!("invalid trusted header {header:?}: {e}")))?;
        Ok(Self {
            trusted_header: Some(name),
        })
    }

    pub fn resolve(&self, headers: &HeaderMap, peer: SocketAddr) -> Result<CallerAddr, EndpointError> {
        let Some(name) = &self.trusted_header else {
            return Ok(CallerAddr::new(peer.ip()));
        };

        let last_hop = headers
            .get_all(name)
            .iter()
            .last()
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.rsplit(',').map(str::trim).find(|hop| !hop.is_empty()))
            .ok_or_else(|| EndpointError::CallerUnknown(format!("missing {name} header")))?;

        last_hop
            .parse()
            .map_err(|_| EndpointError::CallerUnknown(format!("unparseable {name} value")))
    }
}
