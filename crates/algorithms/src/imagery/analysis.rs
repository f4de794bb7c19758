//! Band analysis: align uploaded bands, compute one index, sample points.

use super::align::{align_bands, AlignOptions};
use super::indices::{compute_index, SpectralBands};
use super::sample::{sample_points, GeoPoint, SampleResult};
use tracing::info;
use verdex_core::io::RasterSource;
use verdex_core::{GeoTransform, IndexType, Raster, Result};

/// One analysis request over user-supplied band sources.
#[derive(Debug, Clone)]
pub struct BandAnalysisRequest<S> {
    /// Index name, parsed case-insensitively.
    pub index: String,
    pub study_area: String,
    pub year: String,
    /// B2..B6 in order; extra sources are read but unused.
    pub bands: Vec<S>,
    pub points: Vec<GeoPoint>,
}

impl<S> BandAnalysisRequest<S> {
    /// Request with the default index (NDVI), study area and year.
    pub fn new(bands: Vec<S>) -> Self {
        Self {
            index: IndexType::NDVI.name().to_string(),
            study_area: "Study Area".to_string(),
            year: "2023".to_string(),
            bands,
            points: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    pub fn with_study_area(mut self, study_area: impl Into<String>) -> Self {
        self.study_area = study_area.into();
        self
    }

    pub fn with_points(mut self, points: Vec<GeoPoint>) -> Self {
        self.points = points;
        self
    }
}

/// Result of [`run_band_analysis`]
#[derive(Debug, Clone)]
pub struct BandAnalysis {
    pub index: IndexType,
    /// `"{INDEX} - {year}"`
    pub title: String,
    pub study_area: String,
    /// Derived grid georeferenced with the reference transform.
    pub grid: Raster<f64>,
    pub samples: Vec<SampleResult>,
}

impl BandAnalysis {
    pub fn transform(&self) -> &GeoTransform {
        self.grid.transform()
    }
}

/// Run align → compute → sample for one request.
///
/// The index name and the band count are validated before any band is
/// read. Point failures never fail the request.
pub fn run_band_analysis<S: RasterSource>(
    request: &BandAnalysisRequest<S>,
    options: &AlignOptions,
) -> Result<BandAnalysis> {
    let index: IndexType = request.index.parse()?;

    let aligned = align_bands(&request.bands, options)?;
    let bands = SpectralBands::from_slice(&aligned.grids)?;
    let values = compute_index(&bands, index)?;
    let grid = Raster::from_array(values).with_transform(aligned.reference);

    let samples = sample_points(&request.points, &aligned.reference, grid.view());
    let resolved = samples.iter().filter(|s| s.value.is_some()).count();
    info!(
        index = %index,
        shape = ?grid.shape(),
        points = samples.len(),
        resolved,
        "band analysis complete"
    );

    Ok(BandAnalysis {
        index,
        title: format!("{} - {}", index.name(), request.year),
        study_area: request.study_area.clone(),
        grid,
        samples,
    })
}
