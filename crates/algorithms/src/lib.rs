//! # geobatch algorithms
//!
//! Batch geoprocessing built on `geobatch-core`.
//!
//! ## Available Algorithm Categories
//!
//! - **vector**: duplicate detection, boundary segmentation, length filter, area
//! - **cleaning**: the road cleaning pipeline (duplicates, segments, length filter)
//! - **area**: per-feature hectares and the area report
//! - **convert**: GeoJSON to DXF, GeoTIFF <-> Idrisi RST
//! - **batch**: directory runners collecting per-file outcomes

pub mod area;
pub mod batch;
pub mod cleaning;
pub mod convert;
pub mod vector;

mod crs_serde;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::area::{area_file, compute_areas, AreaParams, AreaReport, AreaSummary};
    pub use crate::batch::{
        area_directory, clean_directory, dxf_directory, find_files, BatchReport, FileOutcome,
    };
    pub use crate::cleaning::{
        clean_collection, clean_file, CleanParams, CleanResult, CleanSummary,
    };
    pub use crate::convert::{
        convert_raster, geojson_to_dxf, geometry_to_entities, rst_to_tiff, tiff_to_rst, DxfParams,
        DEFAULT_TIFF_EPSG,
    };
    pub use crate::vector::{
        equals_exact, explode_to_segments, filter_by_length, find_duplicates,
        find_duplicates_with_progress, segments_iter, HoleMode,
    };
    pub use geobatch_core::prelude::*;
}
