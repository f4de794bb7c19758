//! Spectral analysis of single-band rasters
//!
//! - Alignment: read N single-band sources, fix the reference transform
//! - Indices: NDVI, NDWI, MNDWI, EVI over five canonical bands, plus the
//!   two-band normalized difference used for archive scenes
//! - Sampling: geographic coordinates to index values, fault-isolated per point
//! - Analysis: the align → compute → sample request

mod align;
mod analysis;
mod indices;
mod sample;

pub use align::{align_bands, AlignOptions, AlignedBands, AlignmentPolicy, MIN_BANDS};
pub use analysis::{run_band_analysis, BandAnalysis, BandAnalysisRequest};
pub use indices::{
    compute_index, compute_named, normalized_difference, SpectralBands, EPSILON,
};
pub use sample::{
    points_from_indexed_form, resolve_point, sample_points, GeoPoint, SamplePointError,
    SampleResult,
};
