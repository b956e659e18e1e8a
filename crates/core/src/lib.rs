//! # geobatch core
//!
//! Core types and I/O shared by the geobatch utilities.
//!
//! This crate provides:
//! - `FeatureCollection`: vector features tagged with an explicit `CRS`
//! - `CRS` plus pure-Rust reprojection between WGS84, UTM and Web Mercator
//! - `Raster<T>` and `GeoTransform` for georeferenced grids
//! - I/O for GeoJSON, Shapefile, DXF, GeoTIFF and Idrisi RST

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
}
