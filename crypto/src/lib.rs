//! Cryptographic primitives for challenge tokens.
//!
//! - **SHA-256** to derive the 32-byte token key from the shared secret
//! - **AES-256-CBC** with a fresh random IV per token
//! - Wire form `<iv_hex>:<ciphertext_hex>`
//!
//! Every challenge endpoint and the voting backend hold the same secret, so
//! a token sealed by one party can be opened by any other key holder.

pub mod codec;
pub mod error;
pub mod hash;
pub mod key;

pub use codec::{TokenCodec, IV_DELIMITER, IV_LEN};
pub use error::CodecError;
pub use hash::sha256;
pub use key::TokenKey;
