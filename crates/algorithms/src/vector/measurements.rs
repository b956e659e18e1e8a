//! Geometric measurements

use geo::{Area as GeoArea, Geometry};

/// Square meters in one hectare
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Unsigned planar area of a geometry in CRS units squared.
///
/// Non-areal geometries have zero area. Project to a metric CRS first
/// for square meters.
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        Geometry::Triangle(t) => t.unsigned_area(),
        Geometry::GeometryCollection(gc) => gc.iter().map(area).sum(),
        _ => 0.0,
    }
}

/// Area in hectares, assuming metric coordinates
pub fn area_hectares(geom: &Geometry<f64>) -> f64 {
    area(geom) / SQUARE_METERS_PER_HECTARE
}
