//! Challenge protocol: payload schemas, wire formats, evidence verification.
//!
//! A region's endpoint seals a [`ChallengeV1`] (TOTP1) on the first call and,
//! when that token comes back from the same caller, seals a [`ChallengeV2`]
//! (TOTP2) carrying both timestamps. TOTP2 tokens are what clients keep and
//! later present to the voting backend, which checks them with
//! [`evidence::verify_entry`].

pub mod error;
pub mod evidence;
pub mod response;
pub mod token;
pub mod version;

pub use error::ProtocolError;
pub use evidence::{verify_entry, EvidenceSet, Freshness, LatencyEvidence};
pub use response::{ChallengeResponse, FingerprintEntry};
pub use token::{ChallengeV1, ChallengeV2};
pub use version::{FIELD_DELIMITER, TOTP1_TAG, TOTP2_TAG};
