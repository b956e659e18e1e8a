//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Covers the cell types the supported formats can hold: unsigned bytes,
/// 16-bit integers (Idrisi `integer`) and 32/64-bit floats.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Default no-data value for this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert from f64, saturating to no-data when out of range
    fn from_f64(value: f64) -> Self {
        <Self as NumCast>::from(value).unwrap_or_else(Self::default_nodata)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }
        }
    };
}

impl_raster_element_int!(u8);
impl_raster_element_int!(i16);
impl_raster_element_int!(i32);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_nan_is_always_nodata() {
        assert!(f32::NAN.is_nodata(None));
        assert!(!1.0f32.is_nodata(None));
        assert!((-9999.0f32).is_nodata(Some(-9999.0)));
    }

    #[test]
    fn int_nodata_matches_exactly() {
        assert!(0u8.is_nodata(Some(0)));
        assert!(!1u8.is_nodata(Some(0)));
        assert!(!1i16.is_nodata(None));
    }

    #[test]
    fn from_f64_saturates_to_nodata() {
        assert_eq!(u8::from_f64(12.0), 12);
        assert_eq!(u8::from_f64(1000.0), u8::MIN);
        assert_eq!(i16::from_f64(-3.0), -3);
    }
}
