use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CurbsideError;

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }

    /// Build a CRS from a bare EPSG code, naming the ones we know
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => Self::wgs84(),
            3857 => Self::web_mercator(),
            other => Self::new(other, format!("EPSG:{}", other)),
        }
    }

    /// Whether coordinates in this CRS are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        self.epsg == 4326
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = CurbsideError;

    /// Parses `4326`, `EPSG:4326` and `urn:ogc:def:crs:EPSG::4326`.
    /// The OGC CRS84 URN is treated as EPSG:4326.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.ends_with("CRS84") {
            return Ok(Self::wgs84());
        }

        trimmed
            .rsplit(':')
            .next()
            .and_then(|code| code.parse::<u32>().ok())
            .map(Self::from_epsg)
            .ok_or_else(|| CurbsideError::UnsupportedCrs { crs: s.to_string() })
    }
}
