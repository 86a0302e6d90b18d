//! Coordinate reference system identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// EPSG geographic 2D systems recognised when writing GeoKeys
pub const GEOGRAPHIC_EPSG_CODES: &[u32] = &[
    4019, // Unknown datum based on GRS 1980
    4148, // Hartebeesthoek94
    4152, // NAD83(HARN)
    4167, // NZGD2000
    4171, // RGF93
    4230, // ED50
    4258, // ETRS89
    4267, // NAD27
    4269, // NAD83
    4277, // OSGB36
    4283, // GDA94
    4322, // WGS 72
    4326, // WGS 84
    4490, // CGCS2000
    4612, // JGD2000
    4617, // NAD83(CSRS)
    4674, // SIRGAS 2000
    4759, // NAD83(NSRS2007)
    6318, // NAD83(2011)
    6668, // JGD2011
    7844, // GDA2020
];

/// An `AUTHORITY:CODE` coordinate reference system tag, e.g. `EPSG:4326`
///
/// The tag is opaque: rasterlab never transforms coordinates between systems,
/// it only carries the identifier from generator to file and back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    authority: String,
    code: u32,
}

impl Crs {
    /// Creates an EPSG CRS
    pub fn epsg(code: u32) -> Self {
        Self {
            authority: "EPSG".to_string(),
            code,
        }
    }

    /// Parses `AUTHORITY:CODE`; the authority is case-insensitive
    pub fn parse(value: &str) -> Result<Self> {
        let (authority, code) = value
            .trim()
            .split_once(':')
            .ok_or_else(|| Error::InvalidCrs(value.to_string()))?;

        if authority.is_empty() || !authority.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidCrs(value.to_string()));
        }

        let code = code
            .parse::<u32>()
            .map_err(|_| Error::InvalidCrs(value.to_string()))?;

        Ok(Self {
            authority: authority.to_ascii_uppercase(),
            code,
        })
    }

    /// The naming authority, upper-cased
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The numeric code within the authority
    pub fn code(&self) -> u32 {
        self.code
    }

    /// The EPSG code, if this CRS is an EPSG one
    pub fn epsg_code(&self) -> Option<u32> {
        (self.authority == "EPSG").then_some(self.code)
    }

    /// Whether this is a known geographic 2D system
    ///
    /// Decides between the geographic and projected GeoKey. Codes missing
    /// from [`GEOGRAPHIC_EPSG_CODES`] are treated as projected.
    pub fn is_geographic(&self) -> bool {
        self.epsg_code()
            .is_some_and(|code| GEOGRAPHIC_EPSG_CODES.contains(&code))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

impl FromStr for Crs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Crs {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let crs = Crs::parse("EPSG:4326").unwrap();
        assert_eq!(crs.authority(), "EPSG");
        assert_eq!(crs.code(), 4326);
        assert_eq!(crs.to_string(), "EPSG:4326");
        assert_eq!(crs, Crs::epsg(4326));
    }

    #[test]
    fn test_authority_is_case_insensitive() {
        assert_eq!(Crs::parse("epsg:3857").unwrap(), Crs::epsg(3857));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["4326", "EPSG:", ":4326", "EPSG:abc", "EP SG:1"] {
            assert!(matches!(Crs::parse(bad), Err(Error::InvalidCrs(_))), "{}", bad);
        }
    }

    #[test]
    fn test_geographic_table() {
        assert!(Crs::epsg(4326).is_geographic());
        assert!(Crs::epsg(7844).is_geographic());
        assert!(!Crs::epsg(4087).is_geographic());
        assert!(!Crs::epsg(4978).is_geographic());
        assert!(!Crs::epsg(3857).is_geographic());
        assert!(!Crs::epsg(32633).is_geographic());
        assert!(!Crs::parse("ESRI:4326").unwrap().is_geographic());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Crs::epsg(4326)).unwrap();
        assert_eq!(json, "\"EPSG:4326\"");
        let back: Crs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Crs::epsg(4326));
        assert!(serde_json::from_str::<Crs>("\"nonsense\"").is_err());
    }
}
