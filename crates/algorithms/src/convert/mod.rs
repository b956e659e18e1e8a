//! Format conversions
//!
//! - GeoJSON vector layers to DXF drawings
//! - GeoTIFF and Idrisi RST rasters in both directions

mod dxf;
mod raster;

pub use dxf::{geojson_to_dxf, geometry_to_entities, DxfParams};
pub use raster::{convert_raster, rst_data_type, rst_to_tiff, tiff_to_rst, DEFAULT_TIFF_EPSG};
