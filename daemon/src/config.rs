//! `vantage` configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use vantage_client::ClientConfig;
use vantage_endpoint::EndpointConfig;
use vantage_types::{validate_regions, Region};
use vantage_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the binary reads from its configuration file.
///
/// Key material is deliberately absent; it comes from the command line
/// or environment only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VantageConfig {
    pub log_format: LogFormat,
    pub log_level: Option<String>,
    pub endpoint: EndpointConfig,
    pub client: ClientConfig,
    pub regions: Vec<Region>,
}

impl VantageConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The region list, checked for use by the measuring client.
    pub fn measurement_regions(&self) -> Result<&[Region], ConfigError> {
        validate_regions(&self.regions).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(&self.regions)
    }

    /// Where the client learns its public address: the configured URL, or
    /// the first region's `/ip` route.
    pub fn address_lookup_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.client.address_lookup_url {
            return Ok(url.clone());
        }
        self.regions
            .first()
            .map(|r| format!("{}/ip", r.url.trim_end_matches('/')))
            .ok_or_else(|| ConfigError::Invalid("no address lookup url and no regions".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = VantageConfig::from_toml_str("").unwrap();
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.client.rounds, 3);
        assert_eq!(config.client.round_delay_ms, 800);
        assert_eq!(config.endpoint.listen_addr.port(), 8080);
        assert!(config.measurement_regions().is_err());
    }

    #[test]
    fn example_file_parses() {
        let config = VantageConfig::from_toml_str(include_str!("../vantage.example.toml")).unwrap();
        let regions = config.measurement_regions().unwrap();
        assert_eq!(regions.len(), 8);
        assert_eq!(regions[0].id.as_str(), "eu-central-1");
        assert_eq!(regions[0].coordinates, [8.6821, 50.1109]);
        assert_eq!(
            config.address_lookup_url().unwrap(),
            "https://eu-central-1.vantage.example.net/ip"
        );
    }

    #[test]
    fn partial_sections_override() {
        let config = VantageConfig::from_toml_str(
            r#"
            log_format = "json"

            [endpoint]
            region = "us-west-2"
            trusted_proxy_header = "x-forwarded-for"

            [client]
            rounds = 5
            address_lookup_url = "https://lookup.example.net/"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.endpoint.region().unwrap().as_str(), "us-west-2");
        assert_eq!(config.client.rounds, 5);
        assert_eq!(config.client.request_timeout_ms, 10_000);
        assert_eq!(config.address_lookup_url().unwrap(), "https://lookup.example.net/");
    }

    #[test]
    fn invalid_region_id_is_a_parse_error() {
        let result = VantageConfig::from_toml_str(
            r#"
            [[regions]]
            id = "eu;central"
            name = "x"
            url = "https://x.example.net/"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn duplicate_regions_are_invalid() {
        let config = VantageConfig::from_toml_str(
            r#"
            [[regions]]
            id = "a"
            name = "A"
            url = "https://a.example.net/"

            [[regions]]
            id = "a"
            name = "A again"
            url = "https://a2.example.net/"
            "#,
        )
        .unwrap();
        assert!(matches!(config.measurement_regions(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_read_error() {
        assert!(matches!(
            VantageConfig::from_toml_file(Path::new("/nonexistent/vantage.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
