//! Latency evidence verification for the voting backend.
//!
//! The backend holds the same shared key as every challenge endpoint. For each
//! `region;token` entry a client submits, it opens the TOTP2 token, checks the
//! region and caller address, and derives the one-way latency estimate.
//! Invalid entries are dropped; an empty set means "no latency evidence".

use std::collections::BTreeMap;

use vantage_crypto::TokenCodec;
use vantage_types::{CallerAddr, RegionId, Timestamp};

use crate::{ChallengeV2, FingerprintEntry, ProtocolError};

/// A verified per-region latency estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct LatencyEvidence {
    pub region: RegionId,
    pub issued_at: Timestamp,
    pub responded_at: Timestamp,
    /// Half the endpoint-measured round trip, in milliseconds.
    pub latency_ms: f64,
}

impl LatencyEvidence {
    /// Reject evidence whose challenge was issued more than `max_age_ms` before `now`.
    pub fn check_age(&self, now: Timestamp, max_age_ms: u64) -> Result<(), ProtocolError> {
        if self.issued_at.has_expired(max_age_ms, now) {
            return Err(ProtocolError::Expired {
                age_ms: self.issued_at.elapsed_since(now),
                max_age_ms,
            });
        }
        Ok(())
    }
}

/// Verify a single serialized fingerprint entry against the submitting address.
pub fn verify_entry(
    codec: &TokenCodec,
    entry: &str,
    expected: &CallerAddr,
) -> Result<LatencyEvidence, ProtocolError> {
    let entry: FingerprintEntry = entry.parse()?;
    let challenge = ChallengeV2::open(codec, &entry.token)?;

    if challenge.region != entry.region {
        return Err(ProtocolError::RegionMismatch {
            expected: entry.region.to_string(),
            actual: challenge.region.to_string(),
        });
    }
    if challenge.addr != *expected {
        return Err(ProtocolError::AddressMismatch {
            expected: expected.to_string(),
            actual: challenge.addr.to_string(),
        });
    }

    Ok(LatencyEvidence {
        latency_ms: challenge.raw_latency_ms() as f64 / 2.0,
        region: challenge.region,
        issued_at: challenge.issued_at,
        responded_at: challenge.responded_at,
    })
}

/// Freshness requirement applied while collecting evidence.
#[derive(Clone, Copy, Debug)]
pub struct Freshness {
    pub now: Timestamp,
    pub max_age_ms: u64,
}

/// Verified evidence keyed by region.
#[derive(Clone, Debug, Default)]
pub struct EvidenceSet {
    by_region: BTreeMap<RegionId, LatencyEvidence>,
}

impl EvidenceSet {
    /// Verify every entry, keeping the lowest latency per region and
    /// dropping entries that fail verification.
    pub fn collect<'a>(
        codec: &TokenCodec,
        entries: impl IntoIterator<Item = &'a str>,
        expected: &CallerAddr,
        freshness: Option<Freshness>,
    ) -> Self {
        let mut set = Self::default();
        for entry in entries {
            let verified = verify_entry(codec, entry, expected).and_then(|evidence| {
                if let Some(f) = freshness {
                    evidence.check_age(f.now, f.max_age_ms)?;
                }
                Ok(evidence)
            });
            match verified {
                Ok(evidence) => set.insert(evidence),
                Err(e) => tracing::warn!(error = %e, "discarding latency token"),
            }
        }
        set
    }

    fn insert(&mut self, evidence: LatencyEvidence) {
        match self.by_region.get(&evidence.region) {
            Some(existing) if existing.latency_ms <= evidence.latency_ms => {}
            _ => {
                self.by_region.insert(evidence.region.clone(), evidence);
            }
        }
    }

    pub fn get(&self, region: &RegionId) -> Option<&LatencyEvidence> {
        self.by_region.get(region)
    }

    pub fn len(&self) -> usize {
        self.by_region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_region.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LatencyEvidence> {
        self.by_region.values()
    }

    /// Required regions with no verified evidence, in the given order.
    pub fn missing_regions(&self, required: &[RegionId]) -> Vec<RegionId> {
        required
            .iter()
            .filter(|r| !self.by_region.contains_key(*r))
            .cloned()
            .collect()
    }
}
