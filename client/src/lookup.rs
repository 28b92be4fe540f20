//! Public address lookup.

use std::future::Future;

use vantage_types::UserIpInfo;

use crate::{ClientConfig, ClientError};

/// Source of the caller's public address as the outside world sees it.
pub trait AddressLookup: Send + Sync {
    fn lookup(&self) -> impl Future<Output = Result<UserIpInfo, ClientError>> + Send;
}

/// Queries an HTTP service answering `{"ip": "..."}`, such as an
/// endpoint's `/ip` route.
pub struct HttpAddressLookup {
    http_client: reqwest::Client,
    url: String,
}

impl HttpAddressLookup {
    pub fn new(url: impl Into<String>, config: &ClientConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClientError::Lookup(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AddressLookup for HttpAddressLookup {
    async fn lookup(&self) -> Result<UserIpInfo, ClientError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ClientError::Lookup(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::Lookup(format!("HTTP status {}", response.status())));
        }
        let info: UserIpInfo = response
            .json()
            .await
            .map_err(|e| ClientError::Lookup(format!("failed to parse address response: {e}")))?;
        if info.ip.trim().is_empty() {
            return Err(ClientError::Lookup("empty address".into()));
        }
        Ok(info)
    }
}
