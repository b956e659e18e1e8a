//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in row-major order, row 0 being
/// the northern edge, with its geotransform, CRS and no-data value.
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        })
    }

    /// Convert every cell to another element type, keeping the metadata
    pub fn cast<U: RasterElement>(&self) -> Raster<U> {
        Raster {
            data: self
                .data
                .mapv(|v| v.to_f64().map(U::from_f64).unwrap_or_else(U::default_nodata)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: self
                .nodata
                .and_then(|nd| nd.to_f64())
                .map(U::from_f64),
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            }),
        }
    }

    /// Cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Map bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Min, max and mean over valid (non no-data) cells
    pub fn statistics(&self) -> RasterStatistics {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter() {
            if value.is_nodata(self.nodata) {
                continue;
            }
            if let Some(v) = value.to_f64() {
                min = min.min(v);
                max = max.max(v);
                sum += v;
                count += 1;
            }
        }

        if count == 0 {
            return RasterStatistics {
                min: None,
                max: None,
                mean: None,
                valid_count: 0,
            };
        }

        RasterStatistics {
            min: Some(min),
            max: Some(max),
            mean: Some(sum / count as f64),
            valid_count: count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        let result = Raster::<f32>::from_vec(vec![1.0; 5], 2, 3);
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.set(10, 0, 1.0).is_err());
    }

    #[test]
    fn test_statistics_skip_nodata() {
        let mut raster = Raster::from_vec(vec![1.0f32, 2.0, -9999.0, 5.0], 2, 2).unwrap();
        raster.set_nodata(Some(-9999.0));
        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(5.0));
        assert_eq!(stats.valid_count, 3);
    }

    #[test]
    fn test_cast_keeps_metadata() {
        let mut raster = Raster::from_vec(vec![1u8, 2, 3, 4], 2, 2).unwrap();
        raster.set_crs(Some(CRS::utm(31, true)));
        raster.set_transform(GeoTransform::new(10.0, 20.0, 1.0, -1.0));

        let floats: Raster<f32> = raster.cast();
        assert_eq!(floats.get(1, 1).unwrap(), 4.0);
        assert_eq!(floats.crs(), raster.crs());
        assert_eq!(floats.transform(), raster.transform());
    }
}
