//! Measurement regions.
//!
//! A region is one geographically fixed challenge endpoint. The set of
//! regions is static configuration: loaded once at start-up and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Maximum length of a region identifier.
pub const MAX_REGION_ID_LEN: usize = 64;

/// Short region code such as `eu-central-1`.
///
/// Region identifiers travel inside `;`-delimited token payloads and
/// `:`-delimited wire tokens, so construction rejects both delimiters,
/// the `,` list separator, and whitespace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Result<Self, TypesError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_REGION_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        if valid {
            Ok(Self(id))
        } else {
            Err(TypesError::InvalidRegionId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegionId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RegionId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionId> for String {
    fn from(id: RegionId) -> Self {
        id.0
    }
}

/// A configured measurement region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Display name, e.g. "Germany".
    pub name: String,
    /// Base URL of the region's challenge endpoint.
    pub url: String,
    /// `[longitude, latitude]`, for display only.
    #[serde(default)]
    pub coordinates: [f64; 2],
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            coordinates: [0.0, 0.0],
        }
    }

    pub fn with_coordinates(mut self, longitude: f64, latitude: f64) -> Self {
        self.coordinates = [longitude, latitude];
        self
    }

    /// Check that the endpoint URL is usable.
    pub fn validate(&self) -> Result<(), TypesError> {
        let url = self.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(TypesError::InvalidRegion {
                id: self.id.to_string(),
                reason: format!("endpoint url must be http(s): {url:?}"),
            });
        }
        Ok(())
    }
}

/// Validate a whole region list: non-empty, valid URLs, unique identifiers.
pub fn validate_regions(regions: &[Region]) -> Result<(), TypesError> {
    if regions.is_empty() {
        return Err(TypesError::InvalidRegion {
            id: String::new(),
            reason: "at least one region must be configured".into(),
        });
    }
    for (i, region) in regions.iter().enumerate() {
        region.validate()?;
        if regions[..i].iter().any(|r| r.id == region.id) {
            return Err(TypesError::InvalidRegion {
                id: region.id.to_string(),
                reason: "duplicate region identifier".into(),
            });
        }
    }
    Ok(())
}
