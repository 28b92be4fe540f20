//! TOTP1 / TOTP2 payload schemas.
//!
//! Plaintext layouts (fields joined with `;`):
//!
//! ```text
//! TOTP1;<region>;<issued_ms>;<addr>
//! TOTP2;<region>;<issued_ms>;<responded_ms>;<addr>
//! ```

use vantage_crypto::TokenCodec;
use vantage_types::{CallerAddr, RegionId, Timestamp};

use crate::{ProtocolError, FIELD_DELIMITER, TOTP1_TAG, TOTP2_TAG};

/// First-round challenge: binds region, issue time and caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeV1 {
    pub region: RegionId,
    pub issued_at: Timestamp,
    pub addr: CallerAddr,
}

/// Second-round challenge: adds the endpoint's response time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeV2 {
    pub region: RegionId,
    pub issued_at: Timestamp,
    pub responded_at: Timestamp,
    pub addr: CallerAddr,
}

impl ChallengeV1 {
    pub fn to_payload(&self) -> String {
        format!(
            "{TOTP1_TAG}{d}{}{d}{}{d}{}",
            self.region,
            self.issued_at.as_millis(),
            self.addr,
            d = FIELD_DELIMITER
        )
    }

    pub fn from_payload(payload: &str) -> Result<Self, ProtocolError> {
        let fields = split_fields(payload, TOTP1_TAG, 4)?;
        Ok(Self {
            region: RegionId::new(fields[1])?,
            issued_at: parse_millis(fields[2])?,
            addr: fields[3].parse()?,
        })
    }

    pub fn seal(&self, codec: &TokenCodec) -> Result<String, ProtocolError> {
        Ok(codec.encrypt(&self.to_payload())?)
    }

    pub fn open(codec: &TokenCodec, token: &str) -> Result<Self, ProtocolError> {
        Self::from_payload(&codec.decrypt(token)?)
    }
}

impl ChallengeV2 {
    /// Build the second-round payload from a validated first-round one.
    pub fn answer(first: &ChallengeV1, responded_at: Timestamp) -> Self {
        Self {
            region: first.region.clone(),
            issued_at: first.issued_at,
            responded_at,
            addr: first.addr,
        }
    }

    /// `responded_at - issued_at` in milliseconds, saturating at zero.
    pub fn raw_latency_ms(&self) -> u64 {
        self.issued_at.elapsed_since(self.responded_at)
    }

    pub fn to_payload(&self) -> String {
        format!(
            "{TOTP2_TAG}{d}{}{d}{}{d}{}{d}{}",
            self.region,
            self.issued_at.as_millis(),
            self.responded_at.as_millis(),
            self.addr,
            d = FIELD_DELIMITER
        )
    }

    pub fn from_payload(payload: &str) -> Result<Self, ProtocolError> {
        let fields = split_fields(payload, TOTP2_TAG, 5)?;
        Ok(Self {
            region: RegionId::new(fields[1])?,
            issued_at: parse_millis(fields[2])?,
            responded_at: parse_millis(fields[3])?,
            addr: fields[4].parse()?,
        })
    }

    pub fn seal(&self, codec: &TokenCodec) -> Result<String, ProtocolError> {
        Ok(codec.encrypt(&self.to_payload())?)
    }

    pub fn open(codec: &TokenCodec, token: &str) -> Result<Self, ProtocolError> {
        Self::from_payload(&codec.decrypt(token)?)
    }
}

fn split_fields<'a>(
    payload: &'a str,
    tag: &'static str,
    count: usize,
) -> Result<Vec<&'a str>, ProtocolError> {
    let fields: Vec<&str> = payload.split(FIELD_DELIMITER).collect();
    if fields[0] != tag {
        return Err(ProtocolError::UnexpectedTag {
            expected: tag,
            got: fields[0].to_string(),
        });
    }
    if fields.len() != count {
        return Err(ProtocolError::Malformed(format!(
            "{tag} payload has {} fields, expected {count}",
            fields.len()
        )));
    }
    Ok(fields)
}

fn parse_millis(field: &str) -> Result<Timestamp, ProtocolError> {
    field
        .parse::<u64>()
        .map(Timestamp::from_millis)
        .map_err(|_| ProtocolError::Malformed(format!("invalid timestamp {field:?}")))
}
