//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate directly. Georeferencing is carried by the
//! ModelPixelScale/ModelTiepoint tags, the CRS by the EPSG entry of the
//! GeoKeyDirectory and no-data by the GDAL_NODATA ASCII tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use num_traits::NumCast;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;
const USER_DEFINED: u16 = 32767;

/// Sample type stored in a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

/// Read band 1 of a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    read_geotiff_with_type(path).map(|(raster, _)| raster)
}

/// Read band 1 of a GeoTIFF file together with the file's sample type
pub fn read_geotiff_with_type<T, P>(path: P) -> Result<(Raster<T>, PixelType)>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

fn decode_geotiff<T, R>(reader: R) -> Result<(Raster<T>, PixelType)>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let (data, pixel_type): (Vec<T>, PixelType) = match decoder.read_image()? {
        DecodingResult::F32(buf) => (cast_buffer(buf), PixelType::F32),
        DecodingResult::F64(buf) => (cast_buffer(buf), PixelType::F64),
        DecodingResult::U8(buf) => (cast_buffer(buf), PixelType::U8),
        DecodingResult::U16(buf) => (cast_buffer(buf), PixelType::U16),
        DecodingResult::U32(buf) => (cast_buffer(buf), PixelType::U32),
        DecodingResult::I8(buf) => (cast_buffer(buf), PixelType::I8),
        DecodingResult::I16(buf) => (cast_buffer(buf), PixelType::I16),
        DecodingResult::I32(buf) => (cast_buffer(buf), PixelType::I32),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    // Multi-band images decode interleaved; only band 1 is kept
    let samples = data.len() / (rows * cols).max(1);
    let data: Vec<T> = if samples > 1 {
        data.into_iter().step_by(samples).collect()
    } else {
        data
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_epsg(&mut decoder).map(CRS::from_epsg));

    if let Ok(text) = decoder.get_tag_ascii_string(Tag::GdalNodata) {
        if let Ok(value) = text.trim_matches(char::from(0)).trim().parse::<f64>() {
            raster.set_nodata(Some(T::from_f64(value)));
        }
    }

    Ok((raster, pixel_type))
}

fn cast_buffer<S: NumCast + Copy, T: RasterElement>(buf: Vec<S>) -> Vec<T> {
    buf.into_iter()
        .map(|v| <T as NumCast>::from(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// EPSG code from the GeoKeyDirectory (projected first, then geographic)
fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    epsg_from_geokeys(&keys)
}

fn epsg_from_geokeys(keys: &[u16]) -> Option<u32> {
    if keys.len() < 4 {
        return None;
    }
    let count = keys[3] as usize;
    let entries: Vec<&[u16]> = keys[4..].chunks_exact(4).take(count).collect();

    let lookup = |wanted: u16| {
        entries
            .iter()
            .find(|e| e[0] == wanted && e[1] == 0 && e[3] != USER_DEFINED && e[3] != 0)
            .map(|e| e[3] as u32)
    };
    lookup(PROJECTED_CS_TYPE).or_else(|| lookup(GEOGRAPHIC_TYPE))
}

/// Write a Raster as a single-band Float32 GeoTIFF
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    encode_geotiff(raster, file)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .iter()
        .map(|&v| <f32 as NumCast>::from(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;

    let geokeys = geokey_directory(raster.crs());
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())?;

    if let Some(nodata) = raster.nodata().and_then(|nd| nd.to_f64()) {
        let text = nodata.to_string();
        image
            .encoder()
            .write_tag(Tag::GdalNodata, text.as_str())?;
    }

    image.write_data(&data)?;
    Ok(())
}

/// GeoKeyDirectory entries: model type, raster type and the EPSG code when known
fn geokey_directory(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs
        .and_then(CRS::epsg)
        .and_then(|code| u16::try_from(code).ok());
    let geographic = crs.is_some_and(CRS::is_geographic);

    let model_type = if geographic { 2 } else { 1 };
    let mut entries: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE, 0, 1, model_type],
        [GT_RASTER_TYPE, 0, 1, 1], // RasterPixelIsArea
    ];
    if let Some(code) = epsg {
        let key = if geographic {
            GEOGRAPHIC_TYPE
        } else {
            PROJECTED_CS_TYPE
        };
        entries.push([key, 0, 1, code]);
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.into_iter().flatten());
    keys
}
