//! GeoJSON to DXF mapping
//!
//! Coordinates are copied as-is; no reprojection happens. Closed rings
//! become closed polylines without their repeated closing vertex.

use geo::{Coord, Geometry, LineString, Polygon};
use geobatch_core::io::{read_geojson, DxfDocument, DxfEntity};
use geobatch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::vector::HoleMode;

/// Parameters for the DXF converter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DxfParams {
    /// Whether polygon holes are drawn
    pub holes: HoleMode,
    /// Radius of the circle drawn for each point
    pub point_radius: f64,
}

impl Default for DxfParams {
    fn default() -> Self {
        Self {
            holes: HoleMode::Include,
            point_radius: 0.5,
        }
    }
}

impl DxfParams {
    pub fn validate(&self) -> Result<()> {
        if !self.point_radius.is_finite() || self.point_radius <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "point_radius",
                value: self.point_radius.to_string(),
                reason: "must be a positive length".to_string(),
            });
        }
        Ok(())
    }
}

/// DXF entities drawing one geometry
pub fn geometry_to_entities(geom: &Geometry<f64>, params: &DxfParams) -> Vec<DxfEntity> {
    let mut entities = Vec::new();
    push_geometry(geom, params, &mut entities);
    entities
}

fn push_geometry(geom: &Geometry<f64>, params: &DxfParams, out: &mut Vec<DxfEntity>) {
    match geom {
        Geometry::Point(p) => out.push(circle(p.0, params)),
        Geometry::MultiPoint(mp) => out.extend(mp.iter().map(|p| circle(p.0, params))),
        Geometry::Line(l) => out.push(DxfEntity::Polyline {
            points: vec![l.start, l.end],
            closed: false,
        }),
        Geometry::LineString(ls) => out.push(open_polyline(ls)),
        Geometry::MultiLineString(mls) => out.extend(mls.iter().map(open_polyline)),
        Geometry::Polygon(p) => push_polygon(p, params, out),
        Geometry::MultiPolygon(mp) => {
            for p in mp.iter() {
                push_polygon(p, params, out);
            }
        }
        Geometry::Rect(r) => push_polygon(&r.to_polygon(), params, out),
        Geometry::Triangle(t) => push_polygon(&t.to_polygon(), params, out),
        Geometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                push_geometry(g, params, out);
            }
        }
    }
}

fn circle(center: Coord<f64>, params: &DxfParams) -> DxfEntity {
    DxfEntity::Circle {
        center,
        radius: params.point_radius,
    }
}

fn open_polyline(ls: &LineString<f64>) -> DxfEntity {
    DxfEntity::Polyline {
        points: ls.0.clone(),
        closed: false,
    }
}

fn closed_polyline(ring: &LineString<f64>) -> DxfEntity {
    let mut points = ring.0.clone();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    DxfEntity::Polyline {
        points,
        closed: true,
    }
}

fn push_polygon(polygon: &Polygon<f64>, params: &DxfParams, out: &mut Vec<DxfEntity>) {
    out.push(closed_polyline(polygon.exterior()));
    if params.holes.includes_holes() {
        out.extend(polygon.interiors().iter().map(closed_polyline));
    }
}

/// Convert a GeoJSON file into `<stem>.dxf` next to it, returning the output path
pub fn geojson_to_dxf(input: &Path, params: &DxfParams) -> Result<PathBuf> {
    params.validate()?;
    let collection = read_geojson(input)?;

    let mut doc = DxfDocument::new();
    let mut skipped = 0usize;
    for geometry in collection.geometries() {
        match geometry {
            Some(geom) => doc.extend(geometry_to_entities(geom, params)),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("{}: skipped {} features without geometry", input.display(), skipped);
    }

    let output = input.with_extension("dxf");
    doc.save(&output)?;
    info!("Saved DXF {} ({} entities)", output.display(), doc.len());
    Ok(output)
}
