//! I/O operations for reading and writing geospatial data
//!
//! Vector formats: GeoJSON, ESRI Shapefile (read/write), DXF (write).
//! Raster formats: GeoTIFF and Idrisi RST (read/write).

mod dxf;
mod geojson_io;
mod geotiff;
mod rst;
mod shapefile_io;

pub use dxf::{DxfDocument, DxfEntity};
pub use geojson_io::{parse_geojson, read_geojson, to_geojson_string, write_geojson};
pub use geotiff::{read_geotiff, read_geotiff_with_type, write_geotiff, PixelType};
pub use rst::{read_rst, write_rst, RstDataType};
pub use shapefile_io::{read_prj, read_shapefile, write_shapefile};

use crate::error::{Error, Result};
use crate::vector::FeatureCollection;
use std::path::Path;

/// Lower-cased file extension, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Read a vector file, choosing the reader from its extension
pub fn read_vector<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    match extension_of(path).as_deref() {
        Some("geojson") | Some("json") => read_geojson(path),
        Some("shp") => read_shapefile(path),
        _ => Err(Error::UnsupportedFormat(path.display().to_string())),
    }
}
