//! Serde adapter storing a `CRS` as its identifier
//!
//! Accepts `"EPSG:32631"`, any other string `CRS::from_str` understands,
//! or a bare EPSG number.

use geobatch_core::CRS;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum CrsSpec {
    Code(u32),
    Text(String),
}

pub fn serialize<S: Serializer>(crs: &CRS, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&crs.identifier())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CRS, D::Error> {
    match CrsSpec::deserialize(deserializer)? {
        CrsSpec::Code(code) => Ok(CRS::from_epsg(code)),
        CrsSpec::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}
