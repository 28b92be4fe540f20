//! Plain-text wire formats exchanged outside the ciphertext.

use std::fmt;
use std::str::FromStr;

use vantage_types::RegionId;

use crate::{ProtocolError, FIELD_DELIMITER};

/// Body of a successful TOTP2 response: `<region>;<token>;<raw_latency_ms>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeResponse {
    pub region: RegionId,
    pub token: String,
    pub raw_latency_ms: u64,
}

impl fmt::Display for ChallengeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}",
            self.region,
            self.token,
            self.raw_latency_ms,
            d = FIELD_DELIMITER
        )
    }
}

impl FromStr for ChallengeResponse {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(FIELD_DELIMITER).collect();
        let [region, token, raw] = fields.as_slice() else {
            return Err(ProtocolError::Malformed(format!(
                "challenge response has {} fields, expected 3",
                fields.len()
            )));
        };
        if token.is_empty() {
            return Err(ProtocolError::Malformed("empty token".into()));
        }
        let raw_latency_ms = raw
            .parse::<u64>()
            .map_err(|_| ProtocolError::Malformed(format!("invalid latency {raw:?}")))?;
        Ok(Self {
            region: RegionId::new(*region)?,
            token: token.to_string(),
            raw_latency_ms,
        })
    }
}

/// One element of a serialized fingerprint: `<region>;<token>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FingerprintEntry {
    pub region: RegionId,
    pub token: String,
}

impl fmt::Display for FingerprintEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.region, FIELD_DELIMITER, self.token)
    }
}

impl FromStr for FingerprintEntry {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (region, token) = s
            .trim()
            .split_once(FIELD_DELIMITER)
            .ok_or_else(|| ProtocolError::Malformed("fingerprint entry has no ';'".into()))?;
        if token.is_empty() || token.contains(FIELD_DELIMITER) {
            return Err(ProtocolError::Malformed(
                "fingerprint entry token is empty or contains ';'".into(),
            ));
        }
        Ok(Self {
            region: RegionId::new(region)?,
            token: token.to_string(),
        })
    }
}
