//! Token payload versioning.
//!
//! The first field of every decrypted payload names its schema, so a
//! payload shape change is detected instead of silently misparsed.

/// Schema tag of a first-round challenge payload.
pub const TOTP1_TAG: &str = "TOTP1";

/// Schema tag of a second-round challenge payload.
pub const TOTP2_TAG: &str = "TOTP2";

/// Delimiter between payload fields inside the ciphertext.
pub const FIELD_DELIMITER: char = ';';
