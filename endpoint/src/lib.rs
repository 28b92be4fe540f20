//! Per-region challenge endpoint.
//!
//! Serves two query-driven operations on `GET /`:
//! - `?getTOTP1=true` → an opaque token binding {region, now, caller}
//! - `?getTOTP2=true&TOTP1=<token>` → `<region>;<token>;<raw_latency_ms>`
//!
//! plus `GET /ip` echoing the caller address as `{"ip": "..."}`.
//!
//! The endpoint keeps no state between requests; everything it needs to
//! answer the second call travels inside the first token.

pub mod caller;
pub mod config;
pub mod error;
pub mod handlers;
pub mod issuer;
pub mod request;
pub mod server;
pub mod shutdown;

pub use caller::CallerResolver;
pub use config::EndpointConfig;
pub use error::EndpointError;
pub use issuer::ChallengeIssuer;
pub use request::{ChallengeQuery, ChallengeRequest};
pub use server::ChallengeServer;
pub use shutdown::ShutdownController;
