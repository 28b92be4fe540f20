//! Axum server wiring for the challenge endpoint.

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use vantage_crypto::TokenCodec;
use vantage_types::Clock;
use vantage_utils::StatsCounter;

use crate::handlers::{self, EndpointState, STAT_NAMES};
use crate::{CallerResolver, ChallengeIssuer, EndpointConfig, EndpointError};

pub struct ChallengeServer {
    state: Arc<EndpointState>,
    listen_addr: SocketAddr,
    allowed_origins: Vec<String>,
}

impl ChallengeServer {
    pub fn new(
        config: &EndpointConfig,
        codec: TokenCodec,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EndpointError> {
        let region = config.region()?.clone();
        let resolver = match &config.trusted_proxy_header {
            Some(header) => CallerResolver::trusted_header(header)?,
            None => CallerResolver::peer(),
        };
        for origin in &config.allowed_origins {
            if origin != "*" {
                HeaderValue::from_str(origin).map_err(|e| {
                    EndpointError::Config(format!("invalid allowed origin {origin:?}: {e}"))
                })?;
            }
        }

        Ok(Self {
            state: Arc::new(EndpointState {
                issuer: ChallengeIssuer::new(region, codec, clock),
                resolver,
                stats: Arc::new(StatsCounter::new(STAT_NAMES)),
            }),
            listen_addr: config.listen_addr,
            allowed_origins: config.allowed_origins.clone(),
        })
    }

    /// Request counters. The handle stays valid after [`ChallengeServer::serve`]
    /// consumes the server.
    pub fn stats(&self) -> &Arc<StatsCounter> {
        &self.state.stats
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handlers::challenge))
            .route("/ip", get(handlers::echo_ip))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(self.cors()),
            )
            .with_state(self.state.clone())
    }

    fn cors(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET])
            .allow_headers([header::CONTENT_TYPE]);

        if self.allowed_origins.iter().any(|o| o == "*") {
            return layer.allow_origin(Any);
        }
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        if origins.is_empty() {
            layer
        } else {
            layer.allow_origin(AllowOrigin::list(origins))
        }
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener, EndpointError> {
        TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| EndpointError::Server(format!("failed to bind {}: {e}", self.listen_addr)))
    }

    /// Serve until `shutdown` resolves, then log the request counters.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), EndpointError> {
        let local = listener
            .local_addr()
            .map_err(|e| EndpointError::Server(e.to_string()))?;
        tracing::info!(
            region = %self.state.issuer.region(),
            listen = %local,
            "challenge endpoint listening"
        );

        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| EndpointError::Server(e.to_string()))?;

        let counters = self
            .stats()
            .snapshot()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(%counters, "challenge endpoint stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use vantage_crypto::TokenKey;
    use vantage_nullables::NullClock;
    use vantage_protocol::ChallengeResponse;

    const PEER: ([u8; 4], u16) = ([203, 0, 113, 9], 50000);

    fn server(region: &str, clock: Arc<NullClock>, config: EndpointConfig) -> ChallengeServer {
        let config = EndpointConfig {
            region: Some(region.parse().unwrap()),
            ..config
        };
        ChallengeServer::new(
            &config,
            TokenCodec::new(TokenKey::derive("router-secret").unwrap()),
            clock,
        )
        .unwrap()
    }

    fn app(server: &ChallengeServer) -> Router {
        server
            .router()
            .layer(MockConnectInfo(SocketAddr::from(PEER)))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn two_step_exchange() {
        let clock = Arc::new(NullClock::new(5_000));
        let server = server("ap-south-1", clock.clone(), EndpointConfig::default());

        let (status, totp1) = get(app(&server), "/?getTOTP1=true").await;
        assert_eq!(status, StatusCode::OK);
        assert!(totp1.contains(':'));

        clock.advance(120);
        let uri = format!("/?getTOTP2=true&TOTP1={totp1}");
        let (status, body) = get(app(&server), &uri).await;
        assert_eq!(status, StatusCode::OK);
        let response: ChallengeResponse = body.parse().unwrap();
        assert_eq!(response.region.as_str(), "ap-south-1");
        assert_eq!(response.raw_latency_ms, 120);

        assert_eq!(server.stats().get("issued"), 1);
        assert_eq!(server.stats().get("answered"), 1);
    }

    #[tokio::test]
    async fn bad_queries_are_400() {
        let server = server("ap-south-1", Arc::new(NullClock::new(0)), EndpointConfig::default());
        for uri in [
            "/",
            "/?getTOTP2=true",
            "/?getTOTP2=true&TOTP1=nothex",
            "/?getTOTP1=true&getTOTP2=true&TOTP1=00:00",
        ] {
            let (status, body) = get(app(&server), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, "Invalid request");
        }
        assert_eq!(server.stats().get("malformed"), 4);
    }

    #[tokio::test]
    async fn address_echo_is_not_counted_as_malformed() {
        let server = server("ap-south-1", Arc::new(NullClock::new(0)), EndpointConfig::default());
        let (status, _) = get(app(&server), "/ip").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(server.stats().get("malformed"), 0);
        assert_eq!(server.stats().get("ip_echo"), 1);

        let (status, _) = get(app(&server), "/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(server.stats().get("malformed"), 1);
    }

    #[tokio::test]
    async fn cross_region_replay_is_403() {
        let clock = Arc::new(NullClock::new(0));
        let mumbai = server("ap-south-1", clock.clone(), EndpointConfig::default());
        let tokyo = server("ap-northeast-1", clock, EndpointConfig::default());

        let (_, totp1) = get(app(&mumbai), "/?getTOTP1=true").await;
        let (status, body) = get(app(&tokyo), &format!("/?getTOTP2=true&TOTP1={totp1}")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "Forbidden");
        assert_eq!(tokyo.stats().get("rejected"), 1);
    }

    #[tokio::test]
    async fn echo_reports_peer_or_forwarded_address() {
        let plain = server("ap-south-1", Arc::new(NullClock::new(0)), EndpointConfig::default());
        let (status, body) = get(app(&plain), "/ip").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["ip"], "203.0.113.9");

        let proxied = server(
            "ap-south-1",
            Arc::new(NullClock::new(0)),
            EndpointConfig {
                trusted_proxy_header: Some("x-forwarded-for".into()),
                ..EndpointConfig::default()
            },
        );
        let response = app(&proxied)
            .oneshot(
                Request::get("/ip")
                    .header("x-forwarded-for", "192.0.2.1, 198.51.100.77")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["ip"], "198.51.100.77");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() {
        let server = server(
            "ap-south-1",
            Arc::new(NullClock::new(0)),
            EndpointConfig {
                allowed_origins: vec!["https://vote.example.org".into()],
                ..EndpointConfig::default()
            },
        );
        let request = |origin: &'static str| {
            Request::get("/?getTOTP1=true")
                .header("origin", origin)
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app(&server)
            .oneshot(request("https://vote.example.org"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()["access-control-allow-origin"],
            "https://vote.example.org"
        );

        let denied = app(&server)
            .oneshot(request("https://evil.example.com"))
            .await
            .unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[test]
    fn missing_region_is_config_error() {
        let result = ChallengeServer::new(
            &EndpointConfig::default(),
            TokenCodec::new(TokenKey::derive("k").unwrap()),
            Arc::new(NullClock::new(0)),
        );
        assert!(matches!(result, Err(EndpointError::Config(_))));
    }
}
