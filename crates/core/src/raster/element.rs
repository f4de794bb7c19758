//! Cell value trait for rasters

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Numeric types a [`Raster`](super::Raster) cell can hold.
///
/// Archive bands arrive as integer digital numbers (`u16` for Landsat SR),
/// uploaded bands as anything the TIFF decoder yields; every index is
/// computed on `f64`.
pub trait RasterElement:
    Copy + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Value substituted when a decoded sample cannot be represented.
    fn fill_value() -> Self;

    /// Whether `self` is a missing sample, given the raster's declared nodata.
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Lossy widening to `f64`.
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! integer_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn fill_value() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    )*};
}

macro_rules! float_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn fill_value() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) if nd.is_nan() => false,
                    Some(nd) => (self - nd).abs() <= <$t>::EPSILON * 100.0,
                    None => false,
                }
            }
        }
    )*};
}

integer_element!(i8, i16, i32, i64, u8, u16, u32, u64);
float_element!(f32, f64);
