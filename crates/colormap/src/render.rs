//! Raster → RGBA hand-off for external renderers.

use crate::scheme::{evaluate, ColorScheme, Rgb};
use verdex_core::raster::{Raster, RasterElement};

/// Value range and ramp used to color a grid.
#[derive(Debug, Clone)]
pub struct ColormapParams {
    pub scheme: ColorScheme,
    /// Values below are clamped to the first stop.
    pub min: f64,
    /// Values above are clamped to the last stop.
    pub max: f64,
    /// RGBA for nodata and non-finite cells. Default: transparent.
    pub nodata_color: [u8; 4],
}

impl ColormapParams {
    pub fn with_range(scheme: ColorScheme, min: f64, max: f64) -> Self {
        Self {
            scheme,
            min,
            max,
            nodata_color: [0, 0, 0, 0],
        }
    }
}

/// Range of the finite, non-nodata cells of `raster`.
///
/// An empty or constant grid gets a unit-wide range.
pub fn auto_params<T: RasterElement>(raster: &Raster<T>, scheme: ColorScheme) -> ColormapParams {
    let nodata = raster.nodata();
    let (min, max) = raster
        .data()
        .iter()
        .filter(|v| !v.is_nodata(nodata))
        .filter_map(|v| v.to_f64())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() {
        ColormapParams::with_range(scheme, 0.0, 1.0)
    } else if (max - min).abs() < f64::EPSILON {
        ColormapParams::with_range(scheme, min, min + 1.0)
    } else {
        ColormapParams::with_range(scheme, min, max)
    }
}

/// Row-major RGBA buffer, `rows * cols * 4` bytes.
pub fn raster_to_rgba<T: RasterElement>(raster: &Raster<T>, params: &ColormapParams) -> Vec<u8> {
    let nodata = raster.nodata();
    let range = params.max - params.min;
    let inv_range = if range.abs() > f64::EPSILON { 1.0 / range } else { 1.0 };

    let mut rgba = Vec::with_capacity(raster.len() * 4);
    for val in raster.data().iter() {
        let value = if val.is_nodata(nodata) { None } else { val.to_f64() };
        match value {
            Some(v) if v.is_finite() => {
                let Rgb { r, g, b } = evaluate(params.scheme, (v - params.min) * inv_range);
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
            _ => rgba.extend_from_slice(&params.nodata_color),
        }
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_layout() {
        let r = Raster::from_vec(vec![-0.2, 0.3, 0.8, f64::NAN], 2, 2).unwrap();
        let params = ColormapParams::with_range(ColorScheme::RedYellowGreen, -0.2, 0.8);
        let rgba = raster_to_rgba(&r, &params);

        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[0..4], &[255, 0, 0, 255]);
        assert_eq!(&rgba[4..8], &[255, 255, 0, 255]);
        assert_eq!(&rgba[8..12], &[0, 128, 0, 255]);
        assert_eq!(&rgba[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn auto_range() {
        let r = Raster::from_vec(vec![10.0, 50.0, 100.0], 1, 3).unwrap();
        let params = auto_params(&r, ColorScheme::Grayscale);
        assert_eq!((params.min, params.max), (10.0, 100.0));
    }

    #[test]
    fn auto_range_degenerate() {
        let empty = Raster::from_vec(vec![f64::NAN, f64::NAN], 1, 2).unwrap();
        let p = auto_params(&empty, ColorScheme::Grayscale);
        assert_eq!((p.min, p.max), (0.0, 1.0));

        let constant = Raster::<f64>::filled(2, 2, 2.0);
        let p = auto_params(&constant, ColorScheme::Grayscale);
        assert_eq!((p.min, p.max), (2.0, 3.0));
    }
}
