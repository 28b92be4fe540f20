use thiserror::Error;

use vantage_crypto::CodecError;
use vantage_types::TypesError;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("token codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("unexpected payload tag: expected {expected}, got {got:?}")]
    UnexpectedTag { expected: &'static str, got: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("invalid field: {0}")]
    Field(#[from] TypesError),

    #[error("region mismatch: expected {expected}, token carries {actual}")]
    RegionMismatch { expected: String, actual: String },

    #[error("address mismatch: expected {expected}, token carries {actual}")]
    AddressMismatch { expected: String, actual: String },

    #[error("token expired: issued {age_ms}ms ago, limit {max_age_ms}ms")]
    Expired { age_ms: u64, max_age_ms: u64 },
}
