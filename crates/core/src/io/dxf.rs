//! Minimal ASCII DXF writer
//!
//! Emits an AutoCAD R12 (`AC1009`) drawing holding only an ENTITIES
//! section. Polylines use the R12 `POLYLINE`/`VERTEX`/`SEQEND` sequence and
//! every entity sits on layer `0`.

use geo_types::Coord;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// A drawable DXF entity in model space
#[derive(Debug, Clone, PartialEq)]
pub enum DxfEntity {
    /// Open or closed 2D polyline
    Polyline { points: Vec<Coord<f64>>, closed: bool },
    /// Circle given by center and radius
    Circle { center: Coord<f64>, radius: f64 },
}

impl DxfEntity {
    fn write_codes(&self, out: &mut String) {
        match self {
            DxfEntity::Polyline { points, closed } => {
                group(out, 0, "POLYLINE");
                group(out, 8, "0");
                group(out, 66, "1");
                group(out, 10, "0.0");
                group(out, 20, "0.0");
                group(out, 30, "0.0");
                group(out, 70, if *closed { "1" } else { "0" });
                for point in points {
                    group(out, 0, "VERTEX");
                    group(out, 8, "0");
                    coordinate(out, *point);
                }
                group(out, 0, "SEQEND");
                group(out, 8, "0");
            }
            DxfEntity::Circle { center, radius } => {
                group(out, 0, "CIRCLE");
                group(out, 8, "0");
                coordinate(out, *center);
                group(out, 40, &radius.to_string());
            }
        }
    }
}

fn group(out: &mut String, code: u16, value: &str) {
    // Writing to a String cannot fail
    let _ = write!(out, "{}\n{}\n", code, value);
}

fn coordinate(out: &mut String, c: Coord<f64>) {
    group(out, 10, &c.x.to_string());
    group(out, 20, &c.y.to_string());
    group(out, 30, "0.0");
}

/// An in-memory DXF drawing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxfDocument {
    entities: Vec<DxfEntity>,
}

impl DxfDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entity
    pub fn push(&mut self, entity: DxfEntity) {
        self.entities.push(entity);
    }

    /// Append several entities
    pub fn extend<I: IntoIterator<Item = DxfEntity>>(&mut self, entities: I) {
        self.entities.extend(entities);
    }

    pub fn entities(&self) -> &[DxfEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Render the whole drawing as DXF text
    pub fn to_dxf_string(&self) -> String {
        let mut out = String::new();
        group(&mut out, 0, "SECTION");
        group(&mut out, 2, "HEADER");
        group(&mut out, 9, "$ACADVER");
        group(&mut out, 1, "AC1009");
        group(&mut out, 0, "ENDSEC");

        group(&mut out, 0, "SECTION");
        group(&mut out, 2, "ENTITIES");
        for entity in &self.entities {
            entity.write_codes(&mut out);
        }
        group(&mut out, 0, "ENDSEC");
        group(&mut out, 0, "EOF");
        out
    }

    /// Write the drawing to any sink
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.to_dxf_string().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Write the drawing to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))
    }
}
