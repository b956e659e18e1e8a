//! Duplicate geometry detection
//!
//! Two geometries are duplicates when they have the same type and
//! structure and every pair of corresponding vertices lies within the
//! tolerance. Vertex order matters: a ring starting at a different vertex
//! is a different geometry.

use geo::{Coord, Geometry, LineString, Polygon};
use tracing::info;

/// Progress is reported each time this many geometries have been checked
pub const PROGRESS_INTERVAL: usize = 500;

/// Indices of geometries that duplicate an earlier retained geometry.
///
/// The first occurrence is always retained. `None` geometries are never
/// duplicates. Progress is logged every [`PROGRESS_INTERVAL`] geometries.
pub fn find_duplicates<'a, I>(geoms: I, tolerance: f64) -> Vec<usize>
where
    I: IntoIterator<Item = Option<&'a Geometry<f64>>>,
{
    find_duplicates_with_progress(geoms, tolerance, |checked| {
        info!("Checked {} geometries for duplicates", checked);
    })
}

/// [`find_duplicates`] with a caller-supplied progress callback.
///
/// The callback receives the number of geometries processed so far.
pub fn find_duplicates_with_progress<'a, I, F>(
    geoms: I,
    tolerance: f64,
    mut progress: F,
) -> Vec<usize>
where
    I: IntoIterator<Item = Option<&'a Geometry<f64>>>,
    F: FnMut(usize),
{
    let mut seen: Vec<&Geometry<f64>> = Vec::new();
    let mut duplicates = Vec::new();

    for (i, geom) in geoms.into_iter().enumerate() {
        if i > 0 && i % PROGRESS_INTERVAL == 0 {
            progress(i);
        }
        let Some(geom) = geom else {
            continue;
        };

        if seen.iter().any(|s| equals_exact(s, geom, tolerance)) {
            duplicates.push(i);
        } else {
            seen.push(geom);
        }
    }

    duplicates
}

/// Structural equality with a per-vertex distance tolerance
pub fn equals_exact(a: &Geometry<f64>, b: &Geometry<f64>, tolerance: f64) -> bool {
    use Geometry::*;

    match (a, b) {
        (Point(p), Point(q)) => coords_close(p.0, q.0, tolerance),
        (Line(l), Line(m)) => {
            coords_close(l.start, m.start, tolerance) && coords_close(l.end, m.end, tolerance)
        }
        (LineString(l), LineString(m)) => rings_close(l, m, tolerance),
        (Polygon(p), Polygon(q)) => polygons_close(p, q, tolerance),
        (MultiPoint(p), MultiPoint(q)) => {
            p.0.len() == q.0.len()
                && p.iter()
                    .zip(q.iter())
                    .all(|(a, b)| coords_close(a.0, b.0, tolerance))
        }
        (MultiLineString(l), MultiLineString(m)) => {
            l.0.len() == m.0.len()
                && l.iter().zip(m.iter()).all(|(a, b)| rings_close(a, b, tolerance))
        }
        (MultiPolygon(p), MultiPolygon(q)) => {
            p.0.len() == q.0.len()
                && p.iter().zip(q.iter()).all(|(a, b)| polygons_close(a, b, tolerance))
        }
        (GeometryCollection(g), GeometryCollection(h)) => {
            g.0.len() == h.0.len()
                && g.iter().zip(h.iter()).all(|(a, b)| equals_exact(a, b, tolerance))
        }
        (Rect(r), Rect(s)) => {
            coords_close(r.min(), s.min(), tolerance) && coords_close(r.max(), s.max(), tolerance)
        }
        (Triangle(t), Triangle(u)) => t
            .to_array()
            .iter()
            .zip(u.to_array().iter())
            .all(|(a, b)| coords_close(*a, *b, tolerance)),
        _ => false,
    }
}

fn coords_close(a: Coord<f64>, b: Coord<f64>, tolerance: f64) -> bool {
    (a.x - b.x).hypot(a.y - b.y) <= tolerance
}

fn rings_close(a: &LineString<f64>, b: &LineString<f64>, tolerance: f64) -> bool {
    a.0.len() == b.0.len()
        && a.0.iter()
            .zip(b.0.iter())
            .all(|(p, q)| coords_close(*p, *q, tolerance))
}

fn polygons_close(a: &Polygon<f64>, b: &Polygon<f64>, tolerance: f64) -> bool {
    rings_close(a.exterior(), b.exterior(), tolerance)
        && a.interiors().len() == b.interiors().len()
        && a.interiors()
            .iter()
            .zip(b.interiors().iter())
            .all(|(r, s)| rings_close(r, s, tolerance))
}
