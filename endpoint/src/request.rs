//! Query-string shapes accepted by the challenge route.

use serde::Deserialize;

use crate::EndpointError;

/// Raw query parameters. Names match the wire protocol.
#[derive(Debug, Default, Deserialize)]
pub struct ChallengeQuery {
    #[serde(rename = "getTOTP1")]
    pub get_totp1: Option<String>,
    #[serde(rename = "getTOTP2")]
    pub get_totp2: Option<String>,
    #[serde(rename = "TOTP1")]
    pub totp1: Option<String>,
}

/// A well-formed challenge request.
#[derive(Debug, PartialEq, Eq)]
pub enum ChallengeRequest {
    /// `?getTOTP1=true`
    Issue,
    /// `?getTOTP2=true&TOTP1=<token>`
    Answer { totp1: String },
}

impl TryFrom<ChallengeQuery> for ChallengeRequest {
    type Error = EndpointError;

    fn try_from(query: ChallengeQuery) -> Result<Self, Self::Error> {
        let first = is_true(&query.get_totp1);
        let second = is_true(&query.get_totp2);
        match (first, second, query.totp1) {
            (true, false, None) => Ok(Self::Issue),
            (false, true, Some(totp1)) if !totp1.is_empty() => Ok(Self::Answer { totp1 }),
            (false, true, _) => Err(EndpointError::BadRequest(
                "getTOTP2 requires a TOTP1 token".into(),
            )),
            _ => Err(EndpointError::BadRequest(
                "expected getTOTP1=true or getTOTP2=true&TOTP1=<token>".into(),
            )),
        }
    }
}

fn is_true(flag: &Option<String>) -> bool {
    flag.as_deref() == Some("true")
}
