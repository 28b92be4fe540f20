//! Best-token-per-region selection.

use vantage_protocol::FingerprintEntry;
use vantage_types::{MeasurementRound, RegionId, RegionMeasurement};

/// Lowest-latency sample seen for one region.
#[derive(Clone, Debug, PartialEq)]
pub struct BestSample {
    pub region: RegionId,
    pub latency_ms: f64,
    pub token: String,
}

/// Per-region minimum-latency tokens from one measurement run.
///
/// Regions appear in the order they were first seen. A stored sample is
/// replaced only by a strictly lower latency, so on ties the earliest
/// round, then the earliest region position, wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fingerprint {
    best: Vec<BestSample>,
}

impl Fingerprint {
    pub fn from_rounds(rounds: &[MeasurementRound]) -> Self {
        let mut fingerprint = Self::default();
        for round in rounds {
            for measurement in round.measurements() {
                fingerprint.observe(measurement);
            }
        }
        fingerprint
    }

    pub fn observe(&mut self, measurement: &RegionMeasurement) {
        match self.best.iter_mut().find(|b| b.region == measurement.region) {
            Some(best) => {
                if measurement.latency_ms < best.latency_ms {
                    best.latency_ms = measurement.latency_ms;
                    best.token = measurement.token.clone();
                }
            }
            None => self.best.push(BestSample {
                region: measurement.region.clone(),
                latency_ms: measurement.latency_ms,
                token: measurement.token.clone(),
            }),
        }
    }

    pub fn get(&self, region: &RegionId) -> Option<&BestSample> {
        self.best.iter().find(|b| &b.region == region)
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BestSample> {
        self.best.iter()
    }

    pub fn entries(&self) -> Vec<FingerprintEntry> {
        self.best
            .iter()
            .map(|b| FingerprintEntry {
                region: b.region.clone(),
                token: b.token.clone(),
            })
            .collect()
    }

    /// The `region;token` strings handed to vote submission.
    pub fn to_token_list(&self) -> Vec<String> {
        self.entries().iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_types::{RegionOutcome, Timestamp};

    fn measured(region: &str, latency_ms: f64, token: &str) -> RegionOutcome {
        RegionOutcome::Measured(RegionMeasurement {
            region: RegionId::new(region).unwrap(),
            client_send_time: Timestamp::from_millis(0),
            client_receive_time: Timestamp::from_millis(1),
            token: token.into(),
            raw_latency_ms: (latency_ms * 2.0) as u64,
            latency_ms,
        })
    }

    fn failed(region: &str) -> RegionOutcome {
        RegionOutcome::Failed {
            region: RegionId::new(region).unwrap(),
            reason: "endpoint unreachable".into(),
        }
    }

    fn round(number: u32, outcomes: Vec<RegionOutcome>) -> MeasurementRound {
        MeasurementRound {
            round_number: number,
            outcomes,
        }
    }

    #[test]
    fn picks_minimum_per_region() {
        let rounds = vec![
            round(1, vec![measured("a", 50.0, "a1"), measured("b", 90.0, "b1")]),
            round(2, vec![measured("a", 80.0, "a2"), measured("b", 70.0, "b2")]),
            round(3, vec![measured("a", 60.0, "a3"), measured("b", 100.0, "b3")]),
        ];
        let fingerprint = Fingerprint::from_rounds(&rounds);
        assert_eq!(fingerprint.to_token_list(), vec!["a;a1", "b;b2"]);
        assert_eq!(
            fingerprint.get(&RegionId::new("b").unwrap()).unwrap().latency_ms,
            70.0
        );
    }

    #[test]
    fn ties_keep_first_seen() {
        let rounds = vec![
            round(1, vec![measured("a", 40.0, "first")]),
            round(2, vec![measured("a", 40.0, "second")]),
        ];
        assert_eq!(Fingerprint::from_rounds(&rounds).to_token_list(), vec!["a;first"]);
    }

    #[test]
    fn failures_contribute_nothing() {
        let rounds = vec![
            round(1, vec![measured("a", 30.0, "a1"), measured("b", 75.0, "b1")]),
            round(2, vec![measured("a", 35.0, "a2"), failed("b")]),
            round(3, vec![measured("a", 31.0, "a3"), measured("b", 72.0, "b3")]),
        ];
        assert_eq!(
            Fingerprint::from_rounds(&rounds).to_token_list(),
            vec!["a;a1", "b;b3"]
        );
    }

    #[test]
    fn total_failure_is_empty() {
        let rounds = vec![round(1, vec![failed("a"), failed("b")])];
        let fingerprint = Fingerprint::from_rounds(&rounds);
        assert!(fingerprint.is_empty());
        assert!(fingerprint.to_token_list().is_empty());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rounds = vec![
            round(1, vec![measured("x", 12.5, "x1"), measured("y", 9.0, "y1")]),
            round(2, vec![measured("y", 8.5, "y2"), measured("x", 12.5, "x2")]),
        ];
        assert_eq!(Fingerprint::from_rounds(&rounds), Fingerprint::from_rounds(&rounds));
    }
}
