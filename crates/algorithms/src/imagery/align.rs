//! Grid alignment: read one band per source and fix the reference transform.

use ndarray::Array2;
use tracing::{debug, warn};
use verdex_core::io::RasterSource;
use verdex_core::{Error, GeoTransform, Result};

/// Minimum number of sources (B2..B6).
pub const MIN_BANDS: usize = 5;

/// How differing geotransforms across sources are treated.
///
/// Differing shapes are always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentPolicy {
    /// The first source's transform is used; differences are logged.
    #[default]
    Lenient,
    /// Any transform difference is an error.
    Strict,
}

/// Parameters for [`align_bands`]
#[derive(Debug, Clone)]
pub struct AlignOptions {
    pub policy: AlignmentPolicy,
    /// Coefficient tolerance when comparing transforms.
    pub tolerance: f64,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            policy: AlignmentPolicy::Lenient,
            tolerance: 1e-9,
        }
    }
}

impl AlignOptions {
    pub fn strict() -> Self {
        Self {
            policy: AlignmentPolicy::Strict,
            ..Default::default()
        }
    }
}

/// One grid per source, in input order, with the reference transform.
#[derive(Debug, Clone)]
pub struct AlignedBands {
    pub grids: Vec<Array2<f64>>,
    pub reference: GeoTransform,
}

impl AlignedBands {
    pub fn shape(&self) -> (usize, usize) {
        self.grids.first().map(|g| g.dim()).unwrap_or((0, 0))
    }
}

/// Read exactly one band from each source.
///
/// At least [`MIN_BANDS`] sources are required and the count is checked
/// before anything is read. The first source's transform becomes the
/// reference for all coordinate work.
pub fn align_bands<S: RasterSource>(sources: &[S], options: &AlignOptions) -> Result<AlignedBands> {
    if sources.len() < MIN_BANDS {
        return Err(Error::InsufficientBands {
            required: MIN_BANDS,
            got: sources.len(),
        });
    }

    let reference = sources[0].transform();
    let mut grids: Vec<Array2<f64>> = Vec::with_capacity(sources.len());

    for (i, source) in sources.iter().enumerate() {
        let grid = source.read_band()?;
        debug!(band = i, source = %source.describe(), shape = ?grid.dim(), "read band");

        if let Some(first) = grids.first() {
            let (er, ec) = first.dim();
            let (ar, ac) = grid.dim();
            if (er, ec) != (ar, ac) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }

        if i > 0 && !source.transform().approx_eq(&reference, options.tolerance) {
            match options.policy {
                AlignmentPolicy::Strict => return Err(Error::TransformMismatch { band: i }),
                AlignmentPolicy::Lenient => warn!(
                    band = i,
                    source = %source.describe(),
                    "geotransform differs from the reference band; using the reference"
                ),
            }
        }

        grids.push(grid);
    }

    Ok(AlignedBands { grids, reference })
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdex_core::Raster;

    fn band(value: f64, transform: GeoTransform) -> Raster<f64> {
        Raster::filled(3, 4, value).with_transform(transform)
    }

    fn gt() -> GeoTransform {
        GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0)
    }

    #[test]
    fn reads_in_order_with_first_transform() {
        let sources: Vec<_> = (0..6).map(|i| band(i as f64, gt())).collect();
        let aligned = align_bands(&sources, &AlignOptions::default()).unwrap();

        assert_eq!(aligned.grids.len(), 6);
        assert_eq!(aligned.shape(), (3, 4));
        assert_eq!(aligned.reference, gt());
        for (i, grid) in aligned.grids.iter().enumerate() {
            assert_eq!(grid[[2, 3]], i as f64);
        }
    }

    #[test]
    fn too_few_sources() {
        let sources: Vec<_> = (0..4).map(|_| band(0.0, gt())).collect();
        let err = align_bands(&sources, &AlignOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InsufficientBands { required: 5, got: 4 }));
    }

    #[test]
    fn shape_mismatch_always_rejected() {
        let mut sources: Vec<_> = (0..5).map(|_| band(0.0, gt())).collect();
        sources[2] = Raster::filled(2, 4, 0.0).with_transform(gt());
        let err = align_bands(&sources, &AlignOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { er: 3, ec: 4, ar: 2, ac: 4 }));
    }

    #[test]
    fn transform_mismatch_by_policy() {
        let mut sources: Vec<_> = (0..5).map(|_| band(0.1, gt())).collect();
        sources[3] = band(0.1, gt().shifted(1, 0));

        let lenient = align_bands(&sources, &AlignOptions::default()).unwrap();
        assert_eq!(lenient.reference, gt());

        let err = align_bands(&sources, &AlignOptions::strict()).unwrap_err();
        assert!(matches!(err, Error::TransformMismatch { band: 3 }));
    }
}
