//! Endpoint error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use vantage_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid query: {0}")]
    BadRequest(String),

    #[error("malformed TOTP1 token: {0}")]
    Decode(#[source] ProtocolError),

    #[error("region mismatch: endpoint is {expected}, token carries {actual}")]
    RegionMismatch { expected: String, actual: String },

    #[error("address mismatch: caller is {observed}, token carries {bound}")]
    AddressMismatch { observed: String, bound: String },

    #[error("caller address unavailable: {0}")]
    CallerUnknown(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EndpointError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Decode(_) | Self::CallerUnknown(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::RegionMismatch { .. } | Self::AddressMismatch { .. } => StatusCode::FORBIDDEN,
            Self::Config(_) | Self::Server(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Body sent to the caller. Details stay in the log.
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "Invalid request",
            StatusCode::FORBIDDEN => "Forbidden",
            _ => "Internal error",
        }
    }
}

impl IntoResponse for EndpointError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
