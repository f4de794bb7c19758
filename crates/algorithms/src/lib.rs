//! # Verdex Algorithms
//!
//! The numerical core of verdex.
//!
//! - **imagery**: band alignment, spectral index computation, coordinate
//!   sampling and the single-request band analysis that chains them
//! - **timeseries**: least-cloudy annual scene selection from a remote
//!   archive and the year-tagged index sequence built from it

pub mod imagery;
pub mod timeseries;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{
        align_bands, compute_index, compute_named, normalized_difference, run_band_analysis,
        sample_points, AlignOptions, AlignedBands, AlignmentPolicy, BandAnalysis,
        BandAnalysisRequest, GeoPoint, SampleResult, SpectralBands,
    };
    pub use crate::timeseries::{
        AnnualComposite, AnnualCompositeSelector, BandTriple, CompositeOptions, TimeSeriesBuilder,
    };
    pub use verdex_core::prelude::*;
}
