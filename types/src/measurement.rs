//! Measurement records produced by one triangulation run.

use serde::{Deserialize, Serialize};

use crate::{RegionId, Timestamp};

/// One successful challenge/response exchange with a region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMeasurement {
    pub region: RegionId,
    /// Client time just before the first challenge request.
    pub client_send_time: Timestamp,
    /// Client time just after the second challenge response.
    pub client_receive_time: Timestamp,
    /// The opaque TOTP2 token returned by the endpoint.
    pub token: String,
    /// Endpoint-side `response_time - issue_time`, in milliseconds.
    pub raw_latency_ms: u64,
    /// `raw_latency_ms / 2`, assuming a symmetric path.
    pub latency_ms: f64,
}

/// Result of one region's exchange within a round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RegionOutcome {
    Measured(RegionMeasurement),
    Failed { region: RegionId, reason: String },
}

impl RegionOutcome {
    pub fn region(&self) -> &RegionId {
        match self {
            Self::Measured(m) => &m.region,
            Self::Failed { region, .. } => region,
        }
    }

    pub fn measurement(&self) -> Option<&RegionMeasurement> {
        match self {
            Self::Measured(m) => Some(m),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One full pass of challenge/response exchanges against every region.
///
/// Outcomes are stored in region configuration order regardless of the
/// order in which the concurrent exchanges completed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRound {
    /// 1-based round number.
    pub round_number: u32,
    pub outcomes: Vec<RegionOutcome>,
}

impl MeasurementRound {
    pub fn new(round_number: u32) -> Self {
        Self {
            round_number,
            outcomes: Vec::new(),
        }
    }

    /// Successful measurements in region order.
    pub fn measurements(&self) -> impl Iterator<Item = &RegionMeasurement> {
        self.outcomes.iter().filter_map(RegionOutcome::measurement)
    }

    /// Regions that failed this round.
    pub fn failed_regions(&self) -> impl Iterator<Item = &RegionId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failure())
            .map(RegionOutcome::region)
    }
}

/// Public address context supplied by the address lookup collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIpInfo {
    pub ip: String,
    #[serde(default)]
    pub country: String,
}

/// Everything one measurement run produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriangulationReport {
    pub user_ip_info: UserIpInfo,
    pub measurement_rounds: Vec<MeasurementRound>,
    /// Filled in by an external geolocation collaborator; empty here.
    #[serde(default)]
    pub possible_countries: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measured(region: &str, latency: f64) -> RegionOutcome {
        RegionOutcome::Measured(RegionMeasurement {
            region: RegionId::new(region).unwrap(),
            client_send_time: Timestamp::from_millis(1),
            client_receive_time: Timestamp::from_millis(2),
            token: "aa:bb".into(),
            raw_latency_ms: (latency * 2.0) as u64,
            latency_ms: latency,
        })
    }

    #[test]
    fn round_accessors_split_outcomes() {
        let mut round = MeasurementRound::new(2);
        round.outcomes.push(measured("eu-west-1", 20.0));
        round.outcomes.push(RegionOutcome::Failed {
            region: RegionId::new("af-south-1").unwrap(),
            reason: "timeout".into(),
        });
        assert_eq!(round.measurements().count(), 1);
        let failed: Vec<_> = round.failed_regions().map(|r| r.as_str()).collect();
        assert_eq!(failed, vec!["af-south-1"]);
    }

    #[test]
    fn outcome_json_is_tagged() {
        let failed = RegionOutcome::Failed {
            region: RegionId::new("us-east-1").unwrap(),
            reason: "HTTP status 403".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["region"], "us-east-1");

        let json = serde_json::to_value(measured("us-east-1", 12.5)).unwrap();
        assert_eq!(json["status"], "measured");
        assert_eq!(json["latencyMs"], 12.5);
        assert_eq!(json["clientSendTime"], 1);
    }
}
