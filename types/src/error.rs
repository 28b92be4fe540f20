//! Errors raised while constructing validated types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid region identifier: {0:?}")]
    InvalidRegionId(String),

    #[error("invalid caller address: {0:?}")]
    InvalidAddress(String),

    #[error("invalid region {id}: {reason}")]
    InvalidRegion { id: String, reason: String },
}
