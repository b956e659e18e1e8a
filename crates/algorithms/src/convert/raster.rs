//! GeoTIFF <-> Idrisi RST conversion

use geobatch_core::io::{
    extension_of, read_geotiff_with_type, read_rst, write_geotiff, write_rst, PixelType, RstDataType,
};
use geobatch_core::{Error, Raster, Result, CRS};
use std::path::Path;
use tracing::info;

/// EPSG code written to GeoTIFFs converted from RST unless told otherwise
pub const DEFAULT_TIFF_EPSG: u32 = 32631;

/// Convert band 1 of a GeoTIFF to an Idrisi raster, keeping georeferencing
/// and the closest RST cell type to the source samples
pub fn tiff_to_rst(input: &Path, output: &Path) -> Result<()> {
    let (raster, pixel_type): (Raster<f64>, _) = read_geotiff_with_type(input)?;
    let data_type = rst_data_type(pixel_type, &raster);
    write_rst(&raster, output, data_type)?;
    info!(
        "Converted {} to {} ({}x{}, {})",
        input.display(),
        output.display(),
        raster.cols(),
        raster.rows(),
        data_type.name()
    );
    Ok(())
}

/// RST cell type for a TIFF sample type.
///
/// Wider integers are stored as `integer` when every cell and the no-data
/// value fit in 16 bits, and as `real` otherwise.
pub fn rst_data_type(pixel_type: PixelType, raster: &Raster<f64>) -> RstDataType {
    match pixel_type {
        PixelType::U8 => RstDataType::Byte,
        PixelType::I8 | PixelType::I16 => RstDataType::Integer,
        PixelType::U16 | PixelType::U32 | PixelType::I32 if fits_i16(raster) => RstDataType::Integer,
        _ => RstDataType::Real,
    }
}

fn fits_i16(raster: &Raster<f64>) -> bool {
    let range = f64::from(i16::MIN)..=f64::from(i16::MAX);
    raster.iter().chain(raster.nodata().as_ref()).all(|v| range.contains(v))
}

/// Convert an Idrisi raster to a Float32 GeoTIFF tagged with `epsg`
pub fn rst_to_tiff(input: &Path, output: &Path, epsg: u32) -> Result<()> {
    let mut raster = read_rst(input)?;
    raster.set_crs(Some(CRS::from_epsg(epsg)));
    write_geotiff(&raster, output)?;
    info!(
        "Converted {} to {} (EPSG:{})",
        input.display(),
        output.display(),
        epsg
    );
    Ok(())
}

/// Pick the conversion direction from the input extension
pub fn convert_raster(input: &Path, output: &Path, epsg: u32) -> Result<()> {
    match extension_of(input).as_deref() {
        Some("tif") | Some("tiff") => tiff_to_rst(input, output),
        Some("rst") => rst_to_tiff(input, output, epsg),
        _ => Err(Error::UnsupportedFormat(input.display().to_string())),
    }
}
