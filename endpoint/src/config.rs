//! Endpoint configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use vantage_types::RegionId;

use crate::EndpointError;

/// Settings for one challenge endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Region this endpoint answers for.
    pub region: Option<RegionId>,
    pub listen_addr: SocketAddr,
    /// Header set by a trusted reverse proxy, e.g. `x-forwarded-for`.
    /// Unset means the TCP peer address is the caller.
    pub trusted_proxy_header: Option<String>,
    /// Browser origins allowed to call the endpoint. `"*"` allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            region: None,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            trusted_proxy_header: None,
            allowed_origins: Vec::new(),
        }
    }
}

impl EndpointConfig {
    pub fn region(&self) -> Result<&RegionId, EndpointError> {
        self.region
            .as_ref()
            .ok_or_else(|| EndpointError::Config("endpoint region is not set".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EndpointConfig::default();
        assert_eq!(config.listen_addr.port(), 8080);
        assert!(config.region().is_err());
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn region_rejects_delimiters_on_load() {
        let ok: EndpointConfig = serde_json::from_str(r#"{"region":"eu-west-1"}"#).unwrap();
        assert_eq!(ok.region().unwrap().as_str(), "eu-west-1");
        assert!(serde_json::from_str::<EndpointConfig>(r#"{"region":"eu;west"}"#).is_err());
    }
}
