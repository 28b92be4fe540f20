//! Challenge issuance and validation for one region.

use std::sync::Arc;

use vantage_crypto::TokenCodec;
use vantage_protocol::{ChallengeResponse, ChallengeV1, ChallengeV2};
use vantage_types::{CallerAddr, Clock, RegionId};

use crate::EndpointError;

/// Issues TOTP1 tokens and answers them with TOTP2 tokens.
///
/// Holds only immutable configuration, so one instance serves any number
/// of concurrent requests.
pub struct ChallengeIssuer {
    region: RegionId,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
}

impl ChallengeIssuer {
    pub fn new(region: RegionId, codec: TokenCodec, clock: Arc<dyn Clock>) -> Self {
        Self {
            region,
            codec,
            clock,
        }
    }

    pub fn region(&self) -> &RegionId {
        &self.region
    }

    /// Seal {region, now, caller} into a first-round token.
    pub fn issue(&self, caller: &CallerAddr) -> Result<String, EndpointError> {
        let challenge = ChallengeV1 {
            region: self.region.clone(),
            issued_at: self.clock.now(),
            addr: *caller,
        };
        challenge
            .seal(&self.codec)
            .map_err(|e| EndpointError::Internal(e.to_string()))
    }

    /// Validate a first-round token from `caller` and answer it.
    ///
    /// Fails closed: the token must decrypt, be a TOTP1 payload, be bound to
    /// the observed caller, and have been issued for this region.
    pub fn answer(
        &self,
        caller: &CallerAddr,
        totp1: &str,
    ) -> Result<ChallengeResponse, EndpointError> {
        let first = ChallengeV1::open(&self.codec, totp1).map_err(EndpointError::Decode)?;

        if first.addr != *caller {
            return Err(EndpointError::AddressMismatch {
                observed: caller.to_string(),
                bound: first.addr.to_string(),
            });
        }
        if first.region != self.region {
            return Err(EndpointError::RegionMismatch {
                expected: self.region.to_string(),
                actual: first.region.to_string(),
            });
        }

        let second = ChallengeV2::answer(&first, self.clock.now());
        let token = second
            .seal(&self.codec)
            .map_err(|e| EndpointError::Internal(e.to_string()))?;

        Ok(ChallengeResponse {
            raw_latency_ms: second.raw_latency_ms(),
            region: second.region,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_crypto::TokenKey;
    use vantage_nullables::NullClock;

    const SECRET: &str = "issuer-test-secret";

    fn issuer(region: &str, clock: Arc<NullClock>) -> ChallengeIssuer {
        ChallengeIssuer::new(
            RegionId::new(region).unwrap(),
            TokenCodec::new(TokenKey::derive(SECRET).unwrap()),
            clock,
        )
    }

    fn caller() -> CallerAddr {
        "203.0.113.50".parse().unwrap()
    }

    #[test]
    fn answer_reports_elapsed_time() {
        let clock = Arc::new(NullClock::new(1_700_000_000_000));
        let issuer = issuer("eu-central-1", clock.clone());

        let totp1 = issuer.issue(&caller()).unwrap();
        clock.advance(73);
        let response = issuer.answer(&caller(), &totp1).unwrap();

        assert_eq!(response.region.as_str(), "eu-central-1");
        assert_eq!(response.raw_latency_ms, 73);

        let codec = TokenCodec::new(TokenKey::derive(SECRET).unwrap());
        let second = ChallengeV2::open(&codec, &response.token).unwrap();
        assert_eq!(second.issued_at.as_millis(), 1_700_000_000_000);
        assert_eq!(second.responded_at.as_millis(), 1_700_000_000_073);
        assert_eq!(second.addr, caller());
    }

    #[test]
    fn other_caller_is_forbidden() {
        let issuer = issuer("eu-central-1", Arc::new(NullClock::new(0)));
        let totp1 = issuer.issue(&caller()).unwrap();
        let other: CallerAddr = "203.0.113.51".parse().unwrap();
        let err = issuer.answer(&other, &totp1).unwrap_err();
        assert!(matches!(err, EndpointError::AddressMismatch { .. }));
        assert_eq!(err.status().as_u16(), 403);
    }

    #[test]
    fn replay_against_other_region_is_forbidden() {
        let clock = Arc::new(NullClock::new(0));
        let frankfurt = issuer("eu-central-1", clock.clone());
        let virginia = issuer("us-east-1", clock);

        let totp1 = frankfurt.issue(&caller()).unwrap();
        let err = virginia.answer(&caller(), &totp1).unwrap_err();
        assert!(matches!(err, EndpointError::RegionMismatch { .. }));
        assert_eq!(err.status().as_u16(), 403);
    }

    #[test]
    fn garbage_token_is_bad_request() {
        let issuer = issuer("eu-central-1", Arc::new(NullClock::new(0)));
        for token in ["", "nonsense", "00:11", "zz:zz"] {
            let err = issuer.answer(&caller(), token).unwrap_err();
            assert_eq!(err.status().as_u16(), 400, "{token:?}");
        }
    }

    #[test]
    fn totp2_cannot_be_answered_again() {
        let issuer = issuer("eu-central-1", Arc::new(NullClock::new(0)));
        let totp1 = issuer.issue(&caller()).unwrap();
        let response = issuer.answer(&caller(), &totp1).unwrap();
        let err = issuer.answer(&caller(), &response.token).unwrap_err();
        assert!(matches!(err, EndpointError::Decode(_)));
    }

    #[test]
    fn foreign_key_is_bad_request() {
        let issuer = issuer("eu-central-1", Arc::new(NullClock::new(0)));
        let foreign = TokenCodec::new(TokenKey::derive("someone-else").unwrap());
        let forged = ChallengeV1 {
            region: RegionId::new("eu-central-1").unwrap(),
            issued_at: vantage_types::Timestamp::from_millis(0),
            addr: caller(),
        }
        .seal(&foreign)
        .unwrap();
        assert!(issuer.answer(&caller(), &forged).is_err());
    }
}
