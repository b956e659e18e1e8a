//! GeoJSON reading and writing
//!
//! Collections default to WGS84 (RFC 7946). A legacy `crs` member
//! (`{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32631"}}`)
//! is honoured on read and written for any CRS other than WGS84.

use geojson::{feature::Id, GeoJson, JsonObject, JsonValue};
use geo_types::Geometry;
use serde_json::json;
use std::path::Path;

use crate::crs::CRS;
use crate::error::Result;
use crate::vector::{AttributeValue, Feature, FeatureCollection};

/// Read a GeoJSON file into a FeatureCollection
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_geojson(&text)
}

/// Parse GeoJSON text (FeatureCollection, Feature or bare Geometry)
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text.parse()?;

    match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = crs_member(fc.foreign_members.as_ref())?;
            let features = fc
                .features
                .into_iter()
                .map(convert_feature)
                .collect::<Result<Vec<_>>>()?;
            Ok(FeatureCollection::from_features(features, crs))
        }
        GeoJson::Feature(feature) => {
            let crs = crs_member(feature.foreign_members.as_ref())?;
            Ok(FeatureCollection::from_features(
                vec![convert_feature(feature)?],
                crs,
            ))
        }
        GeoJson::Geometry(geometry) => {
            let geometry = Geometry::<f64>::try_from(geometry)?;
            Ok(FeatureCollection::from_geometries(vec![geometry], CRS::wgs84()))
        }
    }
}

/// Write a FeatureCollection as GeoJSON
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    std::fs::write(path.as_ref(), to_geojson_string(collection))?;
    Ok(())
}

/// Serialize a FeatureCollection to GeoJSON text
pub fn to_geojson_string(collection: &FeatureCollection) -> String {
    let features = collection.iter().map(export_feature).collect();

    let foreign_members = if collection.crs().epsg() == Some(4326) {
        None
    } else {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:{}", urn_code(collection.crs())) }
            }),
        );
        Some(members)
    };

    GeoJson::FeatureCollection(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    })
    .to_string()
}

fn urn_code(crs: &CRS) -> String {
    match crs.epsg() {
        Some(code) => format!("EPSG::{}", code),
        None => crs.identifier(),
    }
}

fn crs_member(foreign_members: Option<&JsonObject>) -> Result<CRS> {
    let name = foreign_members
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(JsonValue::as_str);

    match name {
        Some(name) => name.parse(),
        None => Ok(CRS::wgs84()),
    }
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = match feature.geometry {
        Some(geometry) => Some(Geometry::<f64>::try_from(geometry)?),
        None => None,
    };

    let properties = feature
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, json_to_attribute(value)))
        .collect();

    let id = feature.id.map(|id| match id {
        Id::String(s) => s,
        Id::Number(n) => n.to_string(),
    });

    Ok(Feature {
        geometry,
        properties,
        id,
    })
}

fn export_feature(feature: &Feature) -> geojson::Feature {
    let properties: JsonObject = feature
        .properties
        .iter()
        .map(|(key, value)| (key.clone(), attribute_to_json(value)))
        .collect();

    geojson::Feature {
        bbox: None,
        geometry: feature
            .geometry
            .as_ref()
            .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
        id: feature.id.clone().map(Id::String),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn json_to_attribute(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(b) => JsonValue::Bool(*b),
        AttributeValue::Int(i) => json!(i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        AttributeValue::String(s) => JsonValue::String(s.clone()),
    }
}
