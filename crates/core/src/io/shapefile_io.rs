//! ESRI Shapefile reading and writing
//!
//! Geometry and attributes come from `.shp`/`.dbf` through the `shapefile`
//! crate; the CRS comes from the `.prj` sidecar when one exists.

use geo_types::Geometry;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::Shape;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::warn;

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};

/// Read a shapefile (plus `.dbf` attributes and `.prj` CRS)
pub fn read_shapefile<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let mut reader = shapefile::Reader::from_path(path)?;

    let mut features = Vec::new();
    for item in reader.iter_shapes_and_records() {
        let (shape, record) = item?;
        let mut feature = Feature {
            geometry: shape_to_geometry(shape)?,
            ..Feature::empty()
        };
        let fields: HashMap<String, FieldValue> = record.into();
        for (name, value) in fields {
            feature.set_property(name, field_to_attribute(value));
        }
        features.push(feature);
    }

    let crs = match read_prj(path)? {
        Some(crs) => crs,
        None => {
            warn!("{} has no .prj sidecar, assuming EPSG:4326", path.display());
            CRS::wgs84()
        }
    };

    Ok(FeatureCollection::from_features(features, crs))
}

/// Read the `.prj` sidecar next to a shapefile, if present
pub fn read_prj(shp_path: &Path) -> Result<Option<CRS>> {
    let prj = shp_path.with_extension("prj");
    if !prj.exists() {
        return Ok(None);
    }
    let wkt = std::fs::read_to_string(prj)?;
    Ok(Some(CRS::from_wkt(wkt.trim())))
}

/// Write a collection as a shapefile, attributes included.
///
/// Every attribute becomes a dBase column typed from its values: logical,
/// numeric (integer or 6 decimals) or character when values are mixed.
/// Columns are ordered by name, except `last_fields`, which close the table
/// in the given order. Names longer than 10 bytes are truncated.
///
/// All geometries must belong to one shapefile family (polygons, lines or
/// points). Features without geometry are skipped. A `.prj` is written when
/// the CRS can be expressed as WKT.
pub fn write_shapefile<P: AsRef<Path>>(
    collection: &FeatureCollection,
    path: P,
    last_fields: &[&str],
) -> Result<()> {
    let path = path.as_ref();
    let family = ShapeFamily::of_collection(collection)?;

    let columns = table_columns(collection, last_fields);
    let mut table = TableWriterBuilder::new();
    for column in &columns {
        let name = FieldName::try_from(column.name.as_str())
            .map_err(|_| Error::Shapefile(format!("invalid field name: {}", column.name)))?;
        table = match column.kind {
            ColumnKind::Logical => table.add_logical_field(name),
            ColumnKind::Integer => table.add_numeric_field(name, 20, 0),
            ColumnKind::Real => table.add_numeric_field(name, 20, 6),
            ColumnKind::Character(width) => table.add_character_field(name, width),
        };
    }

    let mut writer = shapefile::Writer::from_path(path, table)?;

    for (index, feature) in collection.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            warn!("feature {} has no geometry, not written", index);
            continue;
        };
        let record = feature_record(feature, &columns);

        match (family, geometry) {
            (ShapeFamily::Polygon, Geometry::Polygon(p)) => {
                writer.write_shape_and_record(&shapefile::Polygon::from(p.clone()), &record)?
            }
            (ShapeFamily::Polygon, Geometry::MultiPolygon(mp)) => {
                writer.write_shape_and_record(&shapefile::Polygon::from(mp.clone()), &record)?
            }
            (ShapeFamily::Polyline, Geometry::LineString(ls)) => {
                writer.write_shape_and_record(&shapefile::Polyline::from(ls.clone()), &record)?
            }
            (ShapeFamily::Polyline, Geometry::MultiLineString(mls)) => {
                writer.write_shape_and_record(&shapefile::Polyline::from(mls.clone()), &record)?
            }
            (ShapeFamily::Point, Geometry::Point(p)) => {
                writer.write_shape_and_record(&shapefile::Point::from(*p), &record)?
            }
            (_, other) => {
                return Err(Error::UnsupportedGeometry(format!(
                    "{} in a {:?} shapefile",
                    geometry_name(other),
                    family
                )))
            }
        }
    }
    drop(writer);

    if let Some(wkt) = collection.crs().to_prj_wkt() {
        std::fs::write(path.with_extension("prj"), wkt)?;
    }
    Ok(())
}

/// Shapefiles hold a single shape type per file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeFamily {
    Polygon,
    Polyline,
    Point,
}

impl ShapeFamily {
    fn of(geometry: &Geometry<f64>) -> Result<Self> {
        match geometry {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Ok(ShapeFamily::Polygon),
            Geometry::LineString(_) | Geometry::MultiLineString(_) => Ok(ShapeFamily::Polyline),
            Geometry::Point(_) => Ok(ShapeFamily::Point),
            other => Err(Error::UnsupportedGeometry(geometry_name(other).to_string())),
        }
    }

    fn of_collection(collection: &FeatureCollection) -> Result<Self> {
        let mut family = None;
        for geometry in collection.geometries().flatten() {
            let this = Self::of(geometry)?;
            match family {
                None => family = Some(this),
                Some(existing) if existing != this => {
                    return Err(Error::UnsupportedGeometry(format!(
                        "mixed {:?} and {:?} geometries",
                        existing, this
                    )))
                }
                Some(_) => {}
            }
        }
        family.ok_or_else(|| Error::Shapefile("no geometries to write".to_string()))
    }
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

fn shape_to_geometry(shape: Shape) -> Result<Option<Geometry<f64>>> {
    match shape {
        Shape::NullShape => Ok(None),
        other => Geometry::<f64>::try_from(other)
            .map(Some)
            .map_err(|e| Error::Shapefile(e.to_string())),
    }
}

fn field_to_attribute(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) => AttributeValue::String(s),
        FieldValue::Memo(s) => AttributeValue::String(s),
        FieldValue::Numeric(Some(n)) => AttributeValue::Float(n),
        FieldValue::Float(Some(f)) => AttributeValue::Float(f as f64),
        FieldValue::Double(d) => AttributeValue::Float(d),
        FieldValue::Currency(c) => AttributeValue::Float(c),
        FieldValue::Integer(i) => AttributeValue::Int(i as i64),
        FieldValue::Logical(Some(b)) => AttributeValue::Bool(b),
        _ => AttributeValue::Null,
    }
}

const MAX_FIELD_NAME: usize = 10;
const MAX_CHARACTER_WIDTH: usize = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Logical,
    Integer,
    Real,
    Character(u8),
}

/// One dBase column: the attribute key it reads and the name it is stored under
#[derive(Debug, Clone, PartialEq)]
struct Column {
    key: String,
    name: String,
    kind: ColumnKind,
}

fn table_columns(collection: &FeatureCollection, last_fields: &[&str]) -> Vec<Column> {
    let keys: BTreeSet<&str> = collection
        .iter()
        .flat_map(|f| f.properties.keys().map(String::as_str))
        .collect();
    let ordered = keys
        .iter()
        .copied()
        .filter(|k| !last_fields.contains(k))
        .chain(last_fields.iter().copied().filter(|k| keys.contains(k)));

    let mut used = HashSet::new();
    let mut columns = Vec::new();
    for key in ordered {
        let name = field_name(key);
        if !used.insert(name.clone()) {
            warn!("attribute '{}' clashes with another column as '{}', not written", key, name);
            continue;
        }
        columns.push(Column {
            key: key.to_string(),
            name,
            kind: column_kind(collection, key),
        });
    }
    columns
}

/// dBase names hold at most 10 bytes
fn field_name(key: &str) -> String {
    let mut end = key.len().min(MAX_FIELD_NAME);
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    key[..end].to_string()
}

fn column_kind(collection: &FeatureCollection, key: &str) -> ColumnKind {
    let values = collection
        .iter()
        .filter_map(|f| f.get_property(key))
        .filter(|v| !matches!(v, AttributeValue::Null));

    let mut kind: Option<ColumnKind> = None;
    let mut width = 1;
    for value in values {
        width = width.max(attribute_text(value).len());
        let this = match value {
            AttributeValue::Bool(_) => ColumnKind::Logical,
            AttributeValue::Int(_) => ColumnKind::Integer,
            AttributeValue::Float(_) => ColumnKind::Real,
            _ => ColumnKind::Character(0),
        };
        kind = Some(match (kind, this) {
            (None, this) => this,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Integer), ColumnKind::Real) | (Some(ColumnKind::Real), ColumnKind::Integer) => {
                ColumnKind::Real
            }
            _ => ColumnKind::Character(0),
        });
    }

    match kind {
        Some(ColumnKind::Character(_)) | None => {
            ColumnKind::Character(width.min(MAX_CHARACTER_WIDTH) as u8)
        }
        Some(other) => other,
    }
}

fn attribute_text(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Null => String::new(),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Float(f) => f.to_string(),
        AttributeValue::String(s) => s.clone(),
    }
}

fn feature_record(feature: &Feature, columns: &[Column]) -> Record {
    let mut record = Record::default();
    for column in columns {
        let value = feature
            .get_property(&column.key)
            .filter(|v| !matches!(v, AttributeValue::Null));
        let field = match column.kind {
            ColumnKind::Logical => FieldValue::Logical(match value {
                Some(AttributeValue::Bool(b)) => Some(*b),
                _ => None,
            }),
            ColumnKind::Integer | ColumnKind::Real => {
                FieldValue::Numeric(value.and_then(AttributeValue::as_f64))
            }
            ColumnKind::Character(_) => FieldValue::Character(value.map(attribute_text)),
        };
        record.insert(column.name.clone(), field);
    }
    record
}
