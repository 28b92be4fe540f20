use thiserror::Error;

/// Failure to open a wire token, or to build a key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("token must contain exactly one '{delimiter}' delimiter")]
    Delimiter { delimiter: char },

    #[error("token contains invalid hex: {0}")]
    Hex(String),

    #[error("invalid IV length: expected {expected}, got {got}")]
    IvLength { expected: usize, got: usize },

    #[error("decryption failed: bad padding or wrong key")]
    Cipher,

    #[error("decrypted payload is not valid UTF-8")]
    Utf8,

    #[error("random IV generation failed: {0}")]
    Random(String),

    #[error("shared secret is empty")]
    EmptySecret,
}
