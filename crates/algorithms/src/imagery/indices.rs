//! Spectral vegetation and water indices
//!
//! Indices are computed over the five canonical bands B2..B6
//! (blue, green, red, near-infrared, short-wave infrared). Every
//! denominator carries [`EPSILON`], so an exact zero never divides;
//! NaN and infinite inputs propagate arithmetically.

use crate::maybe_rayon::*;
use ndarray::{Array2, ArrayView2};
use verdex_core::{Error, IndexType, Result};

/// Added to every index denominator.
pub const EPSILON: f64 = 1e-10;

/// The five canonical bands of one index computation, all the same shape.
#[derive(Debug, Clone, Copy)]
pub struct SpectralBands<'a> {
    pub blue: ArrayView2<'a, f64>,
    pub green: ArrayView2<'a, f64>,
    pub red: ArrayView2<'a, f64>,
    pub nir: ArrayView2<'a, f64>,
    pub swir: ArrayView2<'a, f64>,
}

impl<'a> SpectralBands<'a> {
    /// Take B2..B6 from the front of `grids`, in that order.
    ///
    /// Grids past the fifth are ignored. All five must share a shape.
    pub fn from_slice(grids: &'a [Array2<f64>]) -> Result<Self> {
        if grids.len() < 5 {
            return Err(Error::InsufficientBands {
                required: 5,
                got: grids.len(),
            });
        }

        let (er, ec) = grids[0].dim();
        for grid in &grids[1..5] {
            let (ar, ac) = grid.dim();
            if (ar, ac) != (er, ec) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }

        Ok(Self {
            blue: grids[0].view(),
            green: grids[1].view(),
            red: grids[2].view(),
            nir: grids[3].view(),
            swir: grids[4].view(),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.blue.dim()
    }
}

// ---------------------------------------------------------------------------
// Per-cell formulas
// ---------------------------------------------------------------------------

#[inline]
fn nd(a: f64, b: f64) -> f64 {
    (a - b) / (a + b + EPSILON)
}

#[inline]
fn evi(blue: f64, red: f64, nir: f64) -> f64 {
    2.5 * (nir - red) / (nir + 6.0 * red - 7.5 * blue + EPSILON)
}

/// Evaluate `f` for every cell in row-parallel fashion.
fn per_cell<F>(rows: usize, cols: usize, f: F) -> Result<Array2<f64>>
where
    F: Fn(usize, usize) -> f64 + Sync + Send,
{
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| (0..cols).map(|col| f(row, col)).collect::<Vec<_>>())
        .collect();

    Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
}

// ---------------------------------------------------------------------------
// Index engine
// ---------------------------------------------------------------------------

/// Compute `index` over the five bands.
///
/// - NDVI  = (B5 - B4) / (B5 + B4 + ε)
/// - NDWI  = (B3 - B5) / (B3 + B5 + ε)
/// - MNDWI = (B3 - B6) / (B3 + B6 + ε)
/// - EVI   = 2.5 (B5 - B4) / (B5 + 6 B4 - 7.5 B2 + ε)
///
/// Output has the input shape. Values are not clamped.
pub fn compute_index(bands: &SpectralBands<'_>, index: IndexType) -> Result<Array2<f64>> {
    let (rows, cols) = bands.shape();
    let b = *bands;

    match index {
        IndexType::NDVI => per_cell(rows, cols, |r, c| nd(b.nir[[r, c]], b.red[[r, c]])),
        IndexType::NDWI => per_cell(rows, cols, |r, c| nd(b.green[[r, c]], b.nir[[r, c]])),
        IndexType::MNDWI => per_cell(rows, cols, |r, c| nd(b.green[[r, c]], b.swir[[r, c]])),
        IndexType::EVI => per_cell(rows, cols, |r, c| {
            evi(b.blue[[r, c]], b.red[[r, c]], b.nir[[r, c]])
        }),
    }
}

/// Parse `name` and compute it over `grids` (B2..B6 first).
///
/// The name is validated before any band is looked at, so an unknown
/// index fails with [`Error::UnsupportedIndex`] whatever the bands hold.
pub fn compute_named(grids: &[Array2<f64>], name: &str) -> Result<Array2<f64>> {
    let index: IndexType = name.parse()?;
    let bands = SpectralBands::from_slice(grids)?;
    compute_index(&bands, index)
}

/// Two-band normalized difference `(a - b) / (a + b + ε)`.
///
/// Used for archive scenes, which expose only green, red and
/// near-infrared.
pub fn normalized_difference(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let (er, ec) = a.dim();
    let (ar, ac) = b.dim();
    if (er, ec) != (ar, ac) {
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }

    per_cell(er, ec, |r, c| nd(a[[r, c]], b[[r, c]]))
}
