//! Caller network address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::TypesError;

/// The network address a challenge is bound to.
///
/// Always a parsed IP address, so its textual form never contains the
/// `;` payload delimiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerAddr(IpAddr);

impl CallerAddr {
    pub fn new(ip: IpAddr) -> Self {
        // IPv4-mapped IPv6 peers compare equal to their IPv4 form.
        Self(ip.to_canonical())
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }
}

impl From<IpAddr> for CallerAddr {
    fn from(ip: IpAddr) -> Self {
        Self::new(ip)
    }
}

impl FromStr for CallerAddr {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<IpAddr>()
            .map(Self::new)
            .map_err(|_| TypesError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for CallerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_v4_and_v6() {
        assert_eq!(
            "203.0.113.7".parse::<CallerAddr>().unwrap().to_string(),
            "203.0.113.7"
        );
        assert_eq!(
            " 2001:db8::1 ".parse::<CallerAddr>().unwrap().to_string(),
            "2001:db8::1"
        );
    }

    #[test]
    fn mapped_v6_matches_v4() {
        let mapped: CallerAddr = "::ffff:198.51.100.4".parse().unwrap();
        let plain: CallerAddr = "198.51.100.4".parse().unwrap();
        assert_eq!(mapped, plain);
    }

    #[test]
    fn rejects_garbage() {
        assert!("10.0.0.1;10.0.0.2".parse::<CallerAddr>().is_err());
        assert!("".parse::<CallerAddr>().is_err());
    }
}
