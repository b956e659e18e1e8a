//! Boundary segmentation
//!
//! Splits a geometry's boundary into the two-point lines joining
//! consecutive vertices, in source vertex order.

use geo::{Geometry, Line};
use serde::{Deserialize, Serialize};
use std::iter;

/// Whether polygon interior rings contribute segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoleMode {
    /// Exterior ring followed by every interior ring
    Include,
    /// Exterior ring only
    #[default]
    Exclude,
}

impl HoleMode {
    pub fn includes_holes(self) -> bool {
        self == HoleMode::Include
    }
}

/// Lazily yield the segments of a geometry.
///
/// Polygons yield their exterior ring (then interior rings with
/// [`HoleMode::Include`]), line strings their vertex chain and a `Line`
/// itself. Every other geometry type yields nothing.
pub fn segments_iter(
    geom: &Geometry<f64>,
    holes: HoleMode,
) -> Box<dyn Iterator<Item = Line<f64>> + '_> {
    match geom {
        Geometry::Polygon(polygon) => {
            let interiors = polygon
                .interiors()
                .iter()
                .filter(move |_| holes.includes_holes())
                .flat_map(|ring| ring.lines());
            Box::new(polygon.exterior().lines().chain(interiors))
        }
        Geometry::LineString(ls) => Box::new(ls.lines()),
        Geometry::Line(line) => Box::new(iter::once(*line)),
        _ => Box::new(iter::empty()),
    }
}

/// Collect [`segments_iter`] into a vector
pub fn explode_to_segments(geom: &Geometry<f64>, holes: HoleMode) -> Vec<Line<f64>> {
    segments_iter(geom, holes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, line_string, point, polygon, LineString, MultiPolygon, Polygon};

    fn square_with_hole() -> Polygon<f64> {
        polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
                (x: 0.0, y: 0.0),
            ],
            interiors: [
                [
                    (x: 2.0, y: 2.0),
                    (x: 4.0, y: 2.0),
                    (x: 4.0, y: 4.0),
                    (x: 2.0, y: 2.0),
                ],
            ],
        )
    }

    #[test]
    fn closed_ring_of_k_vertices_gives_k_minus_one_segments() {
        let geom = Geometry::Polygon(square_with_hole());
        let segments = explode_to_segments(&geom, HoleMode::Exclude);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }));
        assert_eq!(segments[3].end, coord! { x: 0.0, y: 0.0 });
    }

    #[test]
    fn include_appends_interior_rings() {
        let geom = Geometry::Polygon(square_with_hole());
        let segments = explode_to_segments(&geom, HoleMode::Include);
        assert_eq!(segments.len(), 7);
        assert_eq!(segments[4].start, coord! { x: 2.0, y: 2.0 });
    }

    #[test]
    fn line_string_gives_vertex_chain() {
        let geom = Geometry::LineString(line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ]);
        assert_eq!(explode_to_segments(&geom, HoleMode::Exclude).len(), 2);
    }

    #[test]
    fn single_line_is_itself() {
        let line = Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 3.0, y: 4.0 });
        assert_eq!(
            explode_to_segments(&Geometry::Line(line), HoleMode::Exclude),
            vec![line]
        );
    }

    #[test]
    fn unsupported_and_degenerate_inputs_are_empty() {
        let point = Geometry::Point(point!(x: 1.0, y: 1.0));
        assert!(explode_to_segments(&point, HoleMode::Include).is_empty());

        let multi = Geometry::MultiPolygon(MultiPolygon::new(vec![square_with_hole()]));
        assert!(explode_to_segments(&multi, HoleMode::Include).is_empty());

        let single = Geometry::LineString(LineString::from(vec![(0.0, 0.0)]));
        assert!(explode_to_segments(&single, HoleMode::Exclude).is_empty());
    }

    #[test]
    fn hole_mode_parses_lowercase() {
        let mode: HoleMode = serde_json::from_str("\"include\"").unwrap();
        assert_eq!(mode, HoleMode::Include);
        assert_eq!(HoleMode::default(), HoleMode::Exclude);
    }
}
