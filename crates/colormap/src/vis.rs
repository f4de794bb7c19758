//! Visualization parameters derived from the index type.

use crate::render::{auto_params, ColormapParams};
use crate::scheme::ColorScheme;
use serde::{Deserialize, Serialize};
use verdex_core::{IndexType, Raster};

/// Fixed value range and ramp handed to an external renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub scheme: ColorScheme,
    /// Ramp colors, low to high, as `#rrggbb`.
    pub palette: Vec<String>,
}

impl VisParams {
    fn new(min: f64, max: f64, scheme: ColorScheme) -> Self {
        Self {
            min,
            max,
            scheme,
            palette: scheme.palette_hex(),
        }
    }

    pub fn colormap(&self) -> ColormapParams {
        ColormapParams::with_range(self.scheme, self.min, self.max)
    }
}

/// Parameters for annual time-series frames.
///
/// NDVI: `[-0.2, 0.8]` red → yellow → green. NDWI: `[-0.5, 0.5]`
/// brown → white → blue. Indices without a two-band form have none.
pub fn timeseries_vis_params(index: IndexType) -> Option<VisParams> {
    match index {
        IndexType::NDVI => Some(VisParams::new(-0.2, 0.8, ColorScheme::RedYellowGreen)),
        IndexType::NDWI => Some(VisParams::new(-0.5, 0.5, ColorScheme::BrownWhiteBlue)),
        IndexType::MNDWI | IndexType::EVI => None,
    }
}

/// Ramp for a single-grid preview: RdYlGn for NDVI, BrBG otherwise.
pub fn preview_scheme(index: IndexType) -> ColorScheme {
    match index {
        IndexType::NDVI => ColorScheme::RdYlGn,
        _ => ColorScheme::BrBG,
    }
}

/// Preview parameters with the range taken from the grid's finite values.
pub fn preview_vis_params(grid: &Raster<f64>, index: IndexType) -> VisParams {
    let params = auto_params(grid, preview_scheme(index));
    VisParams::new(params.min, params.max, params.scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annual_params_per_index() {
        let ndvi = timeseries_vis_params(IndexType::NDVI).unwrap();
        assert_eq!((ndvi.min, ndvi.max), (-0.2, 0.8));
        assert_eq!(ndvi.palette, vec!["#ff0000", "#ffff00", "#008000"]);

        let ndwi = timeseries_vis_params(IndexType::NDWI).unwrap();
        assert_eq!((ndwi.min, ndwi.max), (-0.5, 0.5));
        assert_eq!(ndwi.scheme, ColorScheme::BrownWhiteBlue);

        assert!(timeseries_vis_params(IndexType::EVI).is_none());
    }

    #[test]
    fn preview_uses_data_range() {
        let grid = Raster::from_vec(vec![-0.1, 0.3, f64::NAN, 0.7], 2, 2).unwrap();
        let vis = preview_vis_params(&grid, IndexType::NDVI);
        assert_eq!(vis.scheme, ColorScheme::RdYlGn);
        assert!((vis.min + 0.1).abs() < 1e-12);
        assert!((vis.max - 0.7).abs() < 1e-12);

        assert_eq!(preview_vis_params(&grid, IndexType::MNDWI).scheme, ColorScheme::BrBG);
    }

    #[test]
    fn serializes_for_manifest() {
        let json = serde_json::to_value(timeseries_vis_params(IndexType::NDVI).unwrap()).unwrap();
        assert_eq!(json["scheme"], "red-yellow-green");
        assert_eq!(json["min"], -0.2);
    }
}
