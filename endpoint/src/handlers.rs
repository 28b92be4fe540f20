//! HTTP handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use vantage_utils::StatsCounter;

use crate::{CallerResolver, ChallengeIssuer, ChallengeQuery, ChallengeRequest, EndpointError};

pub const STAT_ISSUED: &str = "issued";
pub const STAT_ANSWERED: &str = "answered";
pub const STAT_REJECTED: &str = "rejected";
pub const STAT_MALFORMED: &str = "malformed";
pub const STAT_IP_ECHO: &str = "ip_echo";

pub const STAT_NAMES: &[&str] = &[
    STAT_ISSUED,
    STAT_ANSWERED,
    STAT_REJECTED,
    STAT_MALFORMED,
    STAT_IP_ECHO,
];

/// Shared per-process state. Immutable apart from the counters.
pub struct EndpointState {
    pub issuer: ChallengeIssuer,
    pub resolver: CallerResolver,
    pub stats: Arc<StatsCounter>,
}

impl EndpointState {
    fn handle(
        &self,
        headers: &HeaderMap,
        peer: SocketAddr,
        query: Result<Query<ChallengeQuery>, QueryRejection>,
    ) -> Result<String, EndpointError> {
        let Query(query) = query.map_err(|e| EndpointError::BadRequest(e.body_text()))?;
        let request = ChallengeRequest::try_from(query)?;
        let caller = self.resolver.resolve(headers, peer)?;

        match request {
            ChallengeRequest::Issue => {
                let token = self.issuer.issue(&caller)?;
                self.stats.increment(STAT_ISSUED);
                tracing::debug!(region = %self.issuer.region(), %caller, "issued TOTP1");
                Ok(token)
            }
            ChallengeRequest::Answer { totp1 } => {
                let response = self.issuer.answer(&caller, &totp1)?;
                self.stats.increment(STAT_ANSWERED);
                tracing::debug!(
                    region = %response.region,
                    %caller,
                    raw_latency_ms = response.raw_latency_ms,
                    "answered TOTP1"
                );
                Ok(response.to_string())
            }
        }
    }

    fn record_failure(&self, error: &EndpointError, peer: SocketAddr) {
        match error {
            EndpointError::RegionMismatch { .. } | EndpointError::AddressMismatch { .. } => {
                self.stats.increment(STAT_REJECTED);
                tracing::warn!(%peer, %error, "rejected challenge");
            }
            EndpointError::BadRequest(_)
            | EndpointError::Decode(_)
            | EndpointError::CallerUnknown(_) => {
                self.stats.increment(STAT_MALFORMED);
                tracing::warn!(%peer, %error, "malformed challenge request");
            }
            _ => tracing::error!(%peer, %error, "challenge request failed"),
        }
    }
}

/// `GET /?getTOTP1=true` and `GET /?getTOTP2=true&TOTP1=<token>`.
pub async fn challenge(
    State(state): State<Arc<EndpointState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: Result<Query<ChallengeQuery>, QueryRejection>,
) -> Response {
    match state.handle(&headers, peer, query) {
        Ok(body) => body.into_response(),
        Err(e) => {
            state.record_failure(&e, peer);
            e.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IpEcho {
    pub ip: String,
}

/// `GET /ip`: the caller address as this endpoint sees it.
pub async fn echo_ip(
    State(state): State<Arc<EndpointState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    match state.resolver.resolve(&headers, peer) {
        Ok(caller) => {
            state.stats.increment(STAT_IP_ECHO);
            Json(IpEcho {
                ip: caller.to_string(),
            })
            .into_response()
        }
        Err(e) => {
            state.record_failure(&e, peer);
            e.into_response()
        }
    }
}
