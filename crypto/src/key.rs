//! The shared token key.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{hash::sha256, CodecError};

/// A 32-byte AES-256 key derived from the shared secret.
///
/// Not `Debug`, `Serialize` or `Clone`. Key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct TokenKey([u8; 32]);

impl TokenKey {
    /// Derive the key by hashing the configured secret with SHA-256.
    pub fn derive(secret: &str) -> Result<Self, CodecError> {
        if secret.is_empty() {
            return Err(CodecError::EmptySecret);
        }
        Ok(Self(sha256(secret.as_bytes())))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
