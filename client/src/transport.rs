//! Network access to challenge endpoints.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use vantage_types::Region;

use crate::{ClientConfig, ClientError};

/// The two-step challenge exchange with one region.
///
/// Implementations must be shareable across the concurrent per-region
/// exchanges of a round.
pub trait ChallengeTransport: Send + Sync {
    /// Open a connection to the region without presenting a challenge.
    /// Best-effort; callers ignore errors.
    fn warm_up(&self, region: &Region) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// `?getTOTP1=true` → opaque token.
    fn request_first(
        &self,
        region: &Region,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// `?getTOTP2=true&TOTP1=<token>` → `region;token;raw_latency_ms`.
    fn request_second(
        &self,
        region: &Region,
        totp1: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// [`ChallengeTransport`] over HTTP with a pooled `reqwest` client.
#[derive(Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_timeouts(config.request_timeout(), config.connect_timeout())
    }

    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http_client })
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, ClientError> {
        let response = self.http_client.get(url).query(query).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        Ok(body.trim().to_string())
    }
}

/// The address echo route. Hitting it opens the connection without
/// counting as a malformed challenge on the endpoint.
fn warm_up_url(region: &Region) -> String {
    format!("{}/ip", region.url.trim_end_matches('/'))
}

impl ChallengeTransport for HttpTransport {
    async fn warm_up(&self, region: &Region) -> Result<(), ClientError> {
        self.http_client.get(warm_up_url(region)).send().await?;
        Ok(())
    }

    async fn request_first(&self, region: &Region) -> Result<String, ClientError> {
        let token = self
            .get_text(&region.url, &[("getTOTP1", "true")])
            .await?;
        if token.is_empty() {
            return Err(ClientError::InvalidResponse("empty TOTP1 token".into()));
        }
        Ok(token)
    }

    async fn request_second(&self, region: &Region, totp1: &str) -> Result<String, ClientError> {
        self.get_text(&region.url, &[("getTOTP2", "true"), ("TOTP1", totp1)])
            .await
    }
}
