//! Idrisi raster (RST) reading and writing
//!
//! An Idrisi raster is a headerless binary grid (`.rst`, little-endian,
//! row-major from the north edge) plus an ASCII documentation file
//! (`.rdc`) of `key : value` lines.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_traits::NumCast;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::warn;

use crate::crs::{parse_utm_epsg, CRS};
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};

/// Cell encodings an Idrisi binary raster may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RstDataType {
    /// Unsigned 8-bit
    Byte,
    /// Signed 16-bit
    Integer,
    /// 32-bit float
    Real,
}

impl RstDataType {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "byte" => Ok(RstDataType::Byte),
            "integer" => Ok(RstDataType::Integer),
            "real" => Ok(RstDataType::Real),
            other => Err(Error::UnsupportedDataType(format!("RST data type '{}'", other))),
        }
    }

    /// Name used in the `data type` entry of the `.rdc`
    pub fn name(self) -> &'static str {
        match self {
            RstDataType::Byte => "byte",
            RstDataType::Integer => "integer",
            RstDataType::Real => "real",
        }
    }

    /// Bytes per cell in the `.rst`
    pub fn cell_size(self) -> usize {
        match self {
            RstDataType::Byte => 1,
            RstDataType::Integer => 2,
            RstDataType::Real => 4,
        }
    }
}

/// Read an Idrisi raster (`.rst` plus its `.rdc`) as 32-bit floats
pub fn read_rst<P: AsRef<Path>>(path: P) -> Result<Raster<f32>> {
    let path = path.as_ref();
    let doc = parse_rdc(&std::fs::read_to_string(path.with_extension("rdc"))?);

    let file_type = doc.get("file type").map(String::as_str).unwrap_or("binary");
    if !file_type.eq_ignore_ascii_case("binary") {
        return Err(Error::Rst(format!("unsupported file type '{}'", file_type)));
    }

    let data_type = RstDataType::parse(required(&doc, "data type")?)?;
    let cols: usize = parse_field(&doc, "columns")?;
    let rows: usize = parse_field(&doc, "rows")?;

    let too_large = || Error::Rst(format!("{} x {} cells overflow the address space", cols, rows));
    let len = rows.checked_mul(cols).ok_or_else(too_large)?;
    let expected = len.checked_mul(data_type.cell_size()).ok_or_else(too_large)?;

    let file = File::open(path)?;
    let actual = file.metadata()?.len();
    if actual != expected as u64 {
        return Err(Error::Rst(format!(
            "{} holds {} bytes but {} x {} {} cells need {}",
            path.display(),
            actual,
            cols,
            rows,
            data_type.name(),
            expected
        )));
    }

    let mut reader = BufReader::new(file);
    let mut data = vec![0f32; len];
    match data_type {
        RstDataType::Real => reader.read_f32_into::<LittleEndian>(&mut data)?,
        RstDataType::Integer => {
            let mut buf = vec![0i16; len];
            reader.read_i16_into::<LittleEndian>(&mut buf)?;
            for (cell, v) in data.iter_mut().zip(buf) {
                *cell = v as f32;
            }
        }
        RstDataType::Byte => {
            for cell in data.iter_mut() {
                *cell = reader.read_u8()? as f32;
            }
        }
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    let bounds = (
        parse_field(&doc, "min. x")?,
        parse_field(&doc, "min. y")?,
        parse_field(&doc, "max. x")?,
        parse_field(&doc, "max. y")?,
    );
    raster.set_transform(GeoTransform::from_bounds(bounds, cols, rows));

    let ref_system = doc.get("ref. system").map(String::as_str).unwrap_or("plane");
    let crs = crs_from_ref_system(ref_system);
    if crs.is_none() {
        warn!("{}: reference system '{}' has no EPSG mapping", path.display(), ref_system);
    }
    raster.set_crs(crs);

    if let Some(flag) = doc.get("flag value").and_then(|v| v.parse::<f32>().ok()) {
        raster.set_nodata(Some(flag));
    }

    Ok(raster)
}

/// Write a raster as Idrisi binary data of the given type, plus its `.rdc`.
///
/// Every cell must be representable in `data_type`; `Real` stores 32-bit floats.
pub fn write_rst<T, P>(raster: &Raster<T>, path: P, data_type: RstDataType) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let gt = raster.transform();
    if !gt.is_north_up() {
        return Err(Error::Rst("only north-up rasters can be written".to_string()));
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for &value in raster.iter() {
        write_cell(&mut writer, value, data_type)?;
    }
    writer.flush()?;

    std::fs::write(path.with_extension("rdc"), rdc_text(raster, path, data_type))?;
    Ok(())
}

fn write_cell<T: RasterElement, W: Write>(writer: &mut W, value: T, data_type: RstDataType) -> Result<()> {
    let out_of_range = || {
        Error::Rst(format!(
            "value {:?} does not fit {} data",
            value,
            data_type.name()
        ))
    };
    match data_type {
        RstDataType::Byte => writer.write_u8(<u8 as NumCast>::from(value).ok_or_else(out_of_range)?)?,
        RstDataType::Integer => {
            writer.write_i16::<LittleEndian>(<i16 as NumCast>::from(value).ok_or_else(out_of_range)?)?
        }
        RstDataType::Real => {
            writer.write_f32::<LittleEndian>(<f32 as NumCast>::from(value).unwrap_or(f32::NAN))?
        }
    }
    Ok(())
}

fn rdc_text<T: RasterElement>(raster: &Raster<T>, path: &Path, data_type: RstDataType) -> String {
    let (min_x, min_y, max_x, max_y) = raster.bounds();
    let stats = raster.statistics();
    let (ref_system, ref_units) = ref_system_for(raster.crs());
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let flag = raster
        .nodata()
        .and_then(|v| v.to_f64())
        .map_or_else(|| "none".to_string(), |v| v.to_string());
    let flag_def = if raster.nodata().is_some() {
        "missing data"
    } else {
        "none"
    };

    let entries = [
        ("file format", "IDRISI Raster A.1".to_string()),
        ("file title", title.to_string()),
        ("data type", data_type.name().to_string()),
        ("file type", "binary".to_string()),
        ("columns", raster.cols().to_string()),
        ("rows", raster.rows().to_string()),
        ("ref. system", ref_system),
        ("ref. units", ref_units.to_string()),
        ("unit dist.", "1.0000000".to_string()),
        ("min. X", format!("{:.7}", min_x)),
        ("max. X", format!("{:.7}", max_x)),
        ("min. Y", format!("{:.7}", min_y)),
        ("max. Y", format!("{:.7}", max_y)),
        ("pos'n error", "unknown".to_string()),
        ("resolution", format!("{:.7}", raster.transform().cell_size())),
        ("min. value", format!("{:.7}", stats.min.unwrap_or(0.0))),
        ("max. value", format!("{:.7}", stats.max.unwrap_or(0.0))),
        ("display min", format!("{:.7}", stats.min.unwrap_or(0.0))),
        ("display max", format!("{:.7}", stats.max.unwrap_or(0.0))),
        ("value units", "unspecified".to_string()),
        ("value error", "unknown".to_string()),
        ("flag value", flag),
        ("flag def'n", flag_def.to_string()),
        ("legend cats", "0".to_string()),
    ];

    entries
        .iter()
        .map(|(key, value)| format!("{:<12}: {}\n", key, value))
        .collect()
}

/// Keys are lower-cased and trimmed; everything after the first `:` is the value
fn parse_rdc(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect()
}

fn required<'a>(doc: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    doc.get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::Rst(format!("missing '{}' in documentation file", key)))
}

fn parse_field<T: std::str::FromStr>(doc: &HashMap<String, String>, key: &str) -> Result<T> {
    let value = required(doc, key)?;
    value
        .parse()
        .map_err(|_| Error::Rst(format!("invalid '{}': {}", key, value)))
}

/// `latlong` -> EPSG:4326, `utm-31n` -> EPSG:32631, `utm-31s` -> EPSG:32731
fn crs_from_ref_system(ref_system: &str) -> Option<CRS> {
    let name = ref_system.trim().to_ascii_lowercase();
    if name == "latlong" {
        return Some(CRS::wgs84());
    }
    let zone = name.strip_prefix("utm-")?;
    let (digits, north) = match zone.strip_suffix('n') {
        Some(digits) => (digits, true),
        None => (zone.strip_suffix('s')?, false),
    };
    let zone: u32 = digits.parse().ok()?;
    (1..=60).contains(&zone).then(|| CRS::utm(zone, north))
}

fn ref_system_for(crs: Option<&CRS>) -> (String, &'static str) {
    match crs.and_then(CRS::epsg) {
        Some(4326) => ("latlong".to_string(), "deg"),
        Some(code) => match parse_utm_epsg(code) {
            Some((zone, north)) => (
                format!("utm-{}{}", zone, if north { 'n' } else { 's' }),
                "m",
            ),
            None => ("plane".to_string(), "m"),
        },
        None => ("plane".to_string(), "m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Raster<f32> {
        let mut raster = Raster::from_vec(vec![1.0, 2.5, -3.0, 4.0, 5.0, 6.25], 2, 3).unwrap();
        raster.set_transform(GeoTransform::new(540_000.0, 720_060.0, 30.0, -30.0));
        raster.set_crs(Some(CRS::utm(31, true)));
        raster
    }

    #[test]
    fn round_trip_keeps_grid_and_georeferencing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.rst");
        write_rst(&grid(), &path, RstDataType::Real).unwrap();
        assert!(path.with_extension("rdc").exists());

        let back = read_rst(&path).unwrap();
        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back.get(0, 2).unwrap(), -3.0);
        assert_eq!(back.get(1, 2).unwrap(), 6.25);
        assert_eq!(back.crs().and_then(CRS::epsg), Some(32631));
        assert_eq!(back.nodata(), None);

        let gt = back.transform();
        assert_relative_eq!(gt.origin_x, 540_000.0, epsilon = 1e-6);
        assert_relative_eq!(gt.origin_y, 720_060.0, epsilon = 1e-6);
        assert_relative_eq!(gt.pixel_width, 30.0, epsilon = 1e-6);
        assert_relative_eq!(gt.pixel_height, -30.0, epsilon = 1e-6);
    }

    #[test]
    fn documentation_keys_are_padded() {
        let text = rdc_text(&grid(), Path::new("grid.rst"), RstDataType::Real);
        assert!(text.starts_with("file format : IDRISI Raster A.1\n"));
        assert!(text.contains("data type   : real\n"));
        assert!(text.contains("ref. system : utm-31n\n"));
        assert!(text.contains("min. value  : -3.0000000\n"));
        assert!(text.contains("flag value  : none\n"));
    }

    #[test]
    fn reads_integer_and_byte_grids() {
        let dir = tempfile::tempdir().unwrap();

        let int_path = dir.path().join("classes.rst");
        let mut bytes = Vec::new();
        for v in [-2i16, 300] {
            bytes.write_i16::<LittleEndian>(v).unwrap();
        }
        std::fs::write(&int_path, bytes).unwrap();
        std::fs::write(
            int_path.with_extension("rdc"),
            "data type   : integer\ncolumns     : 2\nrows        : 1\n\
             ref. system : latlong\nmin. X      : 0\nmax. X      : 2\n\
             min. Y      : 0\nmax. Y      : 1\nflag value  : -2\n",
        )
        .unwrap();
        let ints = read_rst(&int_path).unwrap();
        assert_eq!(ints.get(0, 1).unwrap(), 300.0);
        assert_eq!(ints.nodata(), Some(-2.0));
        assert_eq!(ints.crs().and_then(CRS::epsg), Some(4326));

        let byte_path = dir.path().join("mask.rst");
        std::fs::write(&byte_path, [0u8, 255]).unwrap();
        std::fs::write(
            byte_path.with_extension("rdc"),
            "data type   : byte\ncolumns     : 1\nrows        : 2\n\
             ref. system : plane\nmin. X      : 0\nmax. X      : 1\n\
             min. Y      : 0\nmax. Y      : 2\n",
        )
        .unwrap();
        let mask = read_rst(&byte_path).unwrap();
        assert_eq!(mask.get(1, 0).unwrap(), 255.0);
        assert!(mask.crs().is_none());
    }

    #[test]
    fn missing_columns_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.rst");
        std::fs::write(&path, b"").unwrap();
        std::fs::write(path.with_extension("rdc"), "data type : real\nrows : 1\n").unwrap();
        assert!(matches!(read_rst(&path), Err(Error::Rst(_))));
    }

    #[test]
    fn byte_and_integer_grids_are_written_compactly() {
        let dir = tempfile::tempdir().unwrap();

        let mut classes = Raster::from_vec(vec![0u8, 1, 2, 3, 4, 255], 2, 3).unwrap();
        classes.set_transform(GeoTransform::new(0.0, 2.0, 1.0, -1.0));
        classes.set_nodata(Some(255));
        let byte_path = dir.path().join("classes.rst");
        write_rst(&classes, &byte_path, RstDataType::Byte).unwrap();
        assert_eq!(std::fs::metadata(&byte_path).unwrap().len(), 6);
        let rdc = std::fs::read_to_string(byte_path.with_extension("rdc")).unwrap();
        assert!(rdc.contains("data type   : byte\n"));
        assert!(rdc.contains("flag value  : 255\n"));
        let back = read_rst(&byte_path).unwrap();
        assert_eq!(back.get(1, 2).unwrap(), 255.0);
        assert_eq!(back.nodata(), Some(255.0));

        let depths = Raster::from_vec(vec![-120i32, 0, 30_000, 7], 2, 2).unwrap();
        let int_path = dir.path().join("depths.rst");
        write_rst(&depths, &int_path, RstDataType::Integer).unwrap();
        assert_eq!(std::fs::metadata(&int_path).unwrap().len(), 8);
        assert_eq!(read_rst(&int_path).unwrap().get(1, 0).unwrap(), 30_000.0);
    }

    #[test]
    fn value_outside_data_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let raster = Raster::from_vec(vec![1.0f64, 300.0], 1, 2).unwrap();
        let result = write_rst(&raster, dir.path().join("bad.rst"), RstDataType::Byte);
        assert!(matches!(result, Err(Error::Rst(_))));
    }

    #[test]
    fn header_larger_than_data_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.rst");
        std::fs::write(&path, [0u8; 4]).unwrap();
        std::fs::write(
            path.with_extension("rdc"),
            "data type   : real\ncolumns     : 3\nrows        : 3\n\
             min. X      : 0\nmax. X      : 3\nmin. Y      : 0\nmax. Y      : 3\n",
        )
        .unwrap();
        assert!(matches!(read_rst(&path), Err(Error::Rst(_))));
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.rst");
        std::fs::write(&path, [0u8; 4]).unwrap();
        std::fs::write(
            path.with_extension("rdc"),
            format!(
                "data type   : real\ncolumns     : {max}\nrows        : {max}\n",
                max = usize::MAX
            ),
        )
        .unwrap();
        assert!(matches!(read_rst(&path), Err(Error::Rst(_))));
    }

    #[test]
    fn ascii_rasters_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.rst");
        std::fs::write(&path, "1 2").unwrap();
        std::fs::write(path.with_extension("rdc"), "file type : ascii\n").unwrap();
        assert!(matches!(read_rst(&path), Err(Error::Rst(_))));
    }

    #[test]
    fn reference_system_mapping() {
        assert_eq!(crs_from_ref_system("utm-31s").and_then(|c| c.epsg()), Some(32731));
        assert_eq!(crs_from_ref_system("UTM-5N").and_then(|c| c.epsg()), Some(32605));
        assert!(crs_from_ref_system("utm-61n").is_none());
        assert!(crs_from_ref_system("plane").is_none());
        assert_eq!(ref_system_for(Some(&CRS::utm(33, false))).0, "utm-33s");
    }
}
