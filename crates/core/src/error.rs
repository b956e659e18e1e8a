//! Error types for geobatch

use thiserror::Error;

/// Main error type for geobatch operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("Shapefile error: {0}")]
    Shapefile(String),

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("RST error: {0}")]
    Rst(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Reprojection produced a non-finite coordinate for feature {index}")]
    Projection { index: usize },

    #[error("{0}")]
    Other(String),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

impl From<shapefile::Error> for Error {
    fn from(e: shapefile::Error) -> Self {
        Error::Shapefile(e.to_string())
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Tiff(e.to_string())
    }
}

/// Result type alias for geobatch operations
pub type Result<T> = std::result::Result<T, Error>;
