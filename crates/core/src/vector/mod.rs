//! Vector data structures
//!
//! - `Feature`: optional geometry + attributes
//! - `FeatureCollection`: ordered features sharing one explicit CRS

use geo::MapCoords;
use geo_types::{Coord, Geometry, Line, LineString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crs::{Transformer, CRS};
use crate::error::{Error, Result};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature geometry, `None` for null geometries
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

impl From<Line<f64>> for Feature {
    /// Segments are stored as two-vertex line strings
    fn from(line: Line<f64>) -> Self {
        Feature::new(Geometry::LineString(LineString::from(vec![line.start, line.end])))
    }
}

/// Collection of features in a single coordinate reference system.
///
/// The CRS is only changed by [`FeatureCollection::reproject`], which
/// rewrites every geometry before the new CRS is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
    crs: CRS,
}

impl FeatureCollection {
    pub fn new(crs: CRS) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    pub fn from_features(features: Vec<Feature>, crs: CRS) -> Self {
        Self { features, crs }
    }

    /// Build a collection of bare geometries
    pub fn from_geometries<I>(geometries: I, crs: CRS) -> Self
    where
        I: IntoIterator<Item = Geometry<f64>>,
    {
        Self {
            features: geometries.into_iter().map(Feature::new).collect(),
            crs,
        }
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Geometries in feature order, `None` for null geometries
    pub fn geometries(&self) -> impl Iterator<Item = Option<&Geometry<f64>>> {
        self.features.iter().map(|f| f.geometry.as_ref())
    }

    /// Drop features without geometry, returning how many were removed
    pub fn drop_null_geometries(&mut self) -> usize {
        let before = self.features.len();
        self.features.retain(|f| f.geometry.is_some());
        before - self.features.len()
    }

    /// Remove the features at the given positions, keeping the order of the rest
    pub fn drop_indices(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let mut position = 0;
        self.features.retain(|_| {
            let keep = !indices.contains(&position);
            position += 1;
            keep
        });
    }

    /// Reproject every geometry into `target` in place.
    ///
    /// All coordinates are transformed before anything is committed: if any
    /// coordinate comes out non-finite the collection is left untouched.
    pub fn reproject(&mut self, target: &CRS) -> Result<()> {
        let transformer = Transformer::new(&self.crs, target)?;
        if transformer.is_identity() {
            self.crs = target.clone();
            return Ok(());
        }

        let mut rewritten = Vec::with_capacity(self.features.len());
        for (index, feature) in self.features.iter().enumerate() {
            let geometry = match &feature.geometry {
                Some(geom) => Some(
                    geom.try_map_coords(|c| project_finite(&transformer, c))
                        .map_err(|_| Error::Projection { index })?,
                ),
                None => None,
            };
            rewritten.push(geometry);
        }

        for (feature, geometry) in self.features.iter_mut().zip(rewritten) {
            feature.geometry = geometry;
        }
        self.crs = target.clone();
        Ok(())
    }

    /// Consuming variant of [`FeatureCollection::reproject`]
    pub fn to_crs(mut self, target: &CRS) -> Result<Self> {
        self.reproject(target)?;
        Ok(self)
    }
}

fn project_finite(transformer: &Transformer, c: Coord<f64>) -> std::result::Result<Coord<f64>, ()> {
    let out = transformer.transform(c);
    if out.x.is_finite() && out.y.is_finite() {
        Ok(out)
    } else {
        Err(())
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{polygon, Point};

    fn lagos_square() -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: 3.3790, y: 6.5240),
            (x: 3.3800, y: 6.5240),
            (x: 3.3800, y: 6.5250),
            (x: 3.3790, y: 6.5250),
            (x: 3.3790, y: 6.5240),
        ])
    }

    #[test]
    fn test_drop_null_geometries() {
        let mut fc = FeatureCollection::from_features(
            vec![Feature::new(lagos_square()), Feature::empty(), Feature::empty()],
            CRS::wgs84(),
        );
        assert_eq!(fc.drop_null_geometries(), 2);
        assert_eq!(fc.len(), 1);
    }

    #[test]
    fn test_drop_indices_keeps_order() {
        let mut fc = FeatureCollection::from_geometries(
            (0..5).map(|i| Geometry::Point(Point::new(i as f64, 0.0))),
            CRS::wgs84(),
        );
        fc.drop_indices(&[1, 3]);
        let xs: Vec<f64> = fc
            .geometries()
            .map(|g| match g {
                Some(Geometry::Point(p)) => p.x(),
                _ => f64::NAN,
            })
            .collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_reproject_round_trip_changes_coords_and_keeps_count() {
        let original = FeatureCollection::from_features(
            vec![Feature::new(lagos_square()), Feature::empty()],
            CRS::wgs84(),
        );

        let metric = original.clone().to_crs(&CRS::utm(31, true)).unwrap();
        assert_eq!(metric.len(), 2);
        assert_eq!(metric.crs().epsg(), Some(32631));
        assert_ne!(metric.features()[0], original.features()[0]);
        assert!(metric.features()[1].geometry.is_none());

        let back = metric.to_crs(&CRS::wgs84()).unwrap();
        match (&back.features()[0].geometry, &original.features()[0].geometry) {
            (Some(Geometry::Polygon(a)), Some(Geometry::Polygon(b))) => {
                assert_eq!(a.exterior().0.len(), b.exterior().0.len());
                for (ca, cb) in a.exterior().0.iter().zip(b.exterior().0.iter()) {
                    assert_relative_eq!(ca.x, cb.x, epsilon = 1e-8);
                    assert_relative_eq!(ca.y, cb.y, epsilon = 1e-8);
                }
            }
            other => panic!("expected polygons, got {:?}", other),
        }
    }

    #[test]
    fn test_reproject_unsupported_leaves_collection_untouched() {
        let mut fc = FeatureCollection::from_geometries(vec![lagos_square()], CRS::wgs84());
        let before = fc.clone();
        assert!(fc.reproject(&CRS::from_epsg(27700)).is_err());
        assert_eq!(fc, before);
    }

    #[test]
    fn test_line_into_feature() {
        let feature = Feature::from(Line::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
        ));
        match feature.geometry {
            Some(Geometry::LineString(ls)) => assert_eq!(ls.0.len(), 2),
            other => panic!("expected line string, got {:?}", other),
        }
    }
}
