//! Coordinate Reference System handling

mod projection;
mod wkt;

pub use projection::{parse_utm_epsg, Projection, Transformer};
pub use wkt::{epsg_from_wkt, esri_wkt};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string.
    ///
    /// The EPSG code is recovered from the WKT when it carries an
    /// `AUTHORITY["EPSG", ...]` clause or a well-known ESRI name.
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        let wkt = wkt.into();
        let epsg = epsg_from_wkt(&wkt);
        Self {
            wkt: Some(wkt),
            epsg,
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// WGS84 / UTM zone (EPSG:326xx north, 327xx south)
    pub fn utm(zone: u32, north: bool) -> Self {
        let base = if north { 32600 } else { 32700 };
        Self::from_epsg(base + zone)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether coordinates are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        match self.epsg {
            Some(code) => code == 4326,
            None => self
                .wkt
                .as_deref()
                .is_some_and(|w| w.trim_start().starts_with("GEOGCS")),
        }
    }

    /// Whether coordinates are in meters, so planar length and area are meaningful
    pub fn is_metric(&self) -> bool {
        match self.epsg {
            Some(code) => code == 3857 || parse_utm_epsg(code).is_some(),
            None => self.wkt.as_deref().is_some_and(|w| {
                w.trim_start().starts_with("PROJCS") && w.to_ascii_lowercase().contains("metre")
            }),
        }
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // Textual comparison is imperfect but there is nothing better without EPSG codes
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let end = wkt
                .char_indices()
                .nth(50)
                .map(|(i, _)| i)
                .unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }

    /// WKT suitable for a shapefile `.prj` sidecar
    pub fn to_prj_wkt(&self) -> Option<String> {
        self.wkt
            .clone()
            .or_else(|| self.epsg.and_then(esri_wkt))
    }
}

impl FromStr for CRS {
    type Err = Error;

    /// Parse `EPSG:32631`, a bare code, an OGC URN or `CRS84`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Self::wgs84());
        }

        let code = upper
            .rsplit(':')
            .next()
            .unwrap_or(&upper)
            .trim();

        let looks_like_epsg = upper.starts_with("EPSG:")
            || upper.contains(":EPSG:")
            || upper.chars().all(|c| c.is_ascii_digit());

        if looks_like_epsg {
            if let Ok(code) = code.parse::<u32>() {
                return Ok(Self::from_epsg(code));
            }
        }

        if upper.starts_with("GEOGCS") || upper.starts_with("PROJCS") {
            return Ok(Self::from_wkt(trimmed));
        }

        Err(Error::UnsupportedCrs(trimmed.to_string()))
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}
