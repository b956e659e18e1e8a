//! Pure-Rust reprojection between WGS84, UTM and Web Mercator.
//!
//! UTM uses the Snyder (1987, USGS Prof. Paper 1395) series for the
//! transverse Mercator on the WGS84 ellipsoid. Covers EPSG 326xx (UTM North),
//! 327xx (UTM South), 4326 and 3857. No libproj dependency.

use geo_types::Coord;

use crate::crs::CRS;
use crate::error::{Error, Result};

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A projection this module knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Longitude/latitude in degrees (EPSG:4326)
    Geographic,
    /// WGS84 / UTM zone
    Utm { zone: u32, north: bool },
    /// Spherical Web Mercator (EPSG:3857)
    WebMercator,
}

impl Projection {
    /// Resolve a CRS to a supported projection
    pub fn from_crs(crs: &CRS) -> Result<Self> {
        let code = crs
            .epsg()
            .ok_or_else(|| Error::UnsupportedCrs(crs.identifier()))?;
        Self::from_epsg(code)
    }

    /// Resolve an EPSG code to a supported projection
    pub fn from_epsg(code: u32) -> Result<Self> {
        if code == 4326 {
            return Ok(Projection::Geographic);
        }
        if code == 3857 {
            return Ok(Projection::WebMercator);
        }
        parse_utm_epsg(code)
            .map(|(zone, north)| Projection::Utm { zone, north })
            .ok_or_else(|| Error::UnsupportedCrs(format!("EPSG:{}", code)))
    }

    /// Project WGS84 degrees into this projection
    pub fn project(self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Projection::Geographic => c,
            Projection::Utm { zone, north } => {
                let (x, y) = wgs84_to_utm(c.x, c.y, zone, north);
                Coord { x, y }
            }
            Projection::WebMercator => {
                let (x, y) = wgs84_to_mercator(c.x, c.y);
                Coord { x, y }
            }
        }
    }

    /// Unproject coordinates of this projection back to WGS84 degrees
    pub fn unproject(self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Projection::Geographic => c,
            Projection::Utm { zone, north } => {
                let (x, y) = utm_to_wgs84(c.x, c.y, zone, north);
                Coord { x, y }
            }
            Projection::WebMercator => {
                let (x, y) = mercator_to_wgs84(c.x, c.y);
                Coord { x, y }
            }
        }
    }
}

/// Coordinate transformation between two supported CRS.
///
/// All supported CRS share the WGS84 datum, so every transform pivots
/// through geographic degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformer {
    source: Projection,
    target: Projection,
}

impl Transformer {
    pub fn new(source: &CRS, target: &CRS) -> Result<Self> {
        Ok(Self {
            source: Projection::from_crs(source)?,
            target: Projection::from_crs(target)?,
        })
    }

    /// Whether the transform leaves coordinates untouched
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    pub fn transform(&self, c: Coord<f64>) -> Coord<f64> {
        if self.is_identity() {
            return c;
        }
        self.target.project(self.source.unproject(c))
    }
}

/// Parse an EPSG code into UTM zone info: `Some((zone, is_north))`.
///
/// - EPSG 326xx → zone xx, North hemisphere
/// - EPSG 327xx → zone xx, South hemisphere
pub fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else {
        None
    }
}

fn central_meridian(zone: u32) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

// ── Forward transverse Mercator (Snyder pp. 61-64) ──────────────────────

/// Convert WGS84 (longitude, latitude) in degrees to UTM (easting, northing)
/// in metres for the given zone and hemisphere.
fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);

    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = K0
        * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    // Snyder eq. 8-10
    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    let northing = if north {
        northing
    } else {
        northing + FALSE_NORTHING_SOUTH
    };

    (easting, northing)
}

// ── Inverse transverse Mercator (Snyder eqs. 8-12 .. 8-25) ──────────────

/// Convert UTM (easting, northing) in metres back to WGS84
/// (longitude, latitude) in degrees.
fn utm_to_wgs84(easting: f64, northing: f64, zone: u32, north: bool) -> (f64, f64) {
    let x = easting - FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };
    let lon0 = central_meridian(zone);

    let e4 = E2 * E2;
    let e6 = e4 * E2;

    let m = y / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_1_e2 = (1.0 - E2).sqrt();
    let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    // Footpoint latitude (Snyder eq. 3-26)
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin1 = phi1.sin();
    let cos1 = phi1.cos();
    let tan1 = phi1.tan();

    let c1 = E_PRIME2 * cos1 * cos1;
    let t1 = tan1 * tan1;
    let denom = 1.0 - E2 * sin1 * sin1;
    let n1 = A / denom.sqrt();
    let r1 = A * (1.0 - E2) / denom.powf(1.5);
    let d = x / (n1 * K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d2 * d2;
    let d5 = d4 * d;
    let d6 = d4 * d2;

    let lat = phi1
        - (n1 * tan1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos1;

    (lon.to_degrees(), lat.to_degrees())
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e2 = E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

// ── Spherical Web Mercator ───────────────────────────────────────────────

fn wgs84_to_mercator(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let x = A * lon_deg.to_radians();
    let y = A * (std::f64::consts::FRAC_PI_4 + lat_deg.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / A).to_degrees();
    let lat = (2.0 * (y / A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
        let diff = (a - b).abs();
        assert!(
            diff < tol,
            "{msg}: expected {b}, got {a}, diff {diff} exceeds tolerance {tol}"
        );
    }

    #[test]
    fn parse_utm_north() {
        assert_eq!(parse_utm_epsg(32631), Some((31, true)));
        assert_eq!(parse_utm_epsg(32601), Some((1, true)));
        assert_eq!(parse_utm_epsg(32660), Some((60, true)));
    }

    #[test]
    fn parse_utm_south() {
        assert_eq!(parse_utm_epsg(32721), Some((21, false)));
        assert_eq!(parse_utm_epsg(32760), Some((60, false)));
    }

    #[test]
    fn parse_utm_invalid() {
        assert_eq!(parse_utm_epsg(4326), None);
        assert_eq!(parse_utm_epsg(3857), None);
        assert_eq!(parse_utm_epsg(32600), None);
        assert_eq!(parse_utm_epsg(32661), None);
        assert_eq!(parse_utm_epsg(32700), None);
    }

    #[test]
    fn unsupported_epsg_is_an_error() {
        assert!(matches!(
            Projection::from_epsg(27700),
            Err(Error::UnsupportedCrs(_))
        ));
        assert!(Projection::from_crs(&CRS::from_wkt("LOCAL_CS[\"site grid\"]")).is_err());
    }

    // Reference values from PROJ:
    //   Transformer.from_crs(4326, 32630, always_xy=True).transform(-3.7037, 40.4168)
    //   → (440298.94, 4474257.31)
    #[test]
    fn madrid_wgs84_to_utm30n() {
        let (e, n) = wgs84_to_utm(-3.7037, 40.4168, 30, true);
        assert_close(e, 440_298.94, 1.0, "easting");
        assert_close(n, 4_474_257.31, 1.0, "northing");
    }

    #[test]
    fn madrid_utm30n_to_wgs84() {
        let (lon, lat) = utm_to_wgs84(440_298.94, 4_474_257.31, 30, true);
        assert_close(lon, -3.7037, 1e-5, "longitude");
        assert_close(lat, 40.4168, 1e-5, "latitude");
    }

    // Buenos Aires: (-58.3816, -34.6037) → UTM 21S → (373317.50, 6170036.17)
    #[test]
    fn buenos_aires_round_trip() {
        let (e, n) = wgs84_to_utm(-58.3816, -34.6037, 21, false);
        assert_close(e, 373_317.50, 1.0, "easting");
        assert_close(n, 6_170_036.17, 1.0, "northing");

        let (lon, lat) = utm_to_wgs84(e, n, 21, false);
        assert_close(lon, -58.3816, 1e-7, "longitude");
        assert_close(lat, -34.6037, 1e-7, "latitude");
    }

    #[test]
    fn equator_central_meridian() {
        let (e, n) = wgs84_to_utm(3.0, 0.0, 31, true);
        assert_close(e, 500_000.0, 0.01, "easting at CM");
        assert_close(n, 0.0, 0.01, "northing at equator");
    }

    #[test]
    fn lagos_round_trip_through_transformer() {
        let to_utm = Transformer::new(&CRS::wgs84(), &CRS::utm(31, true)).unwrap();
        let back = Transformer::new(&CRS::utm(31, true), &CRS::wgs84()).unwrap();

        let lagos = Coord { x: 3.3792, y: 6.5244 };
        let projected = to_utm.transform(lagos);
        assert!(projected.x > 100_000.0 && projected.x < 900_000.0);
        assert!(projected.y > 700_000.0 && projected.y < 740_000.0);

        let restored = back.transform(projected);
        assert_close(restored.x, lagos.x, 1e-7, "longitude");
        assert_close(restored.y, lagos.y, 1e-7, "latitude");
    }

    #[test]
    fn web_mercator_round_trip() {
        let (x, y) = wgs84_to_mercator(10.0, 50.0);
        assert_close(x, 1_113_194.91, 0.1, "x");
        assert_close(y, 6_446_275.84, 0.1, "y");
        let (lon, lat) = mercator_to_wgs84(x, y);
        assert_close(lon, 10.0, 1e-9, "lon");
        assert_close(lat, 50.0, 1e-9, "lat");

        let t = Transformer::new(&CRS::wgs84(), &CRS::web_mercator()).unwrap();
        let c = t.transform(Coord { x: 10.0, y: 50.0 });
        assert_close(c.x, x, 1e-6, "transformer x");
    }

    #[test]
    fn identity_transform_is_noop() {
        let t = Transformer::new(&CRS::utm(31, true), &CRS::from_epsg(32631)).unwrap();
        assert!(t.is_identity());
        let c = Coord { x: 543_210.5, y: 712_345.25 };
        assert_eq!(t.transform(c), c);
    }
}
