use tracing::{debug, info};
use verdex_core::{DateRange, ImageArchive, Raster, RegionOfInterest, Result, SceneHandle};

/// Archive collection and band names for annual composites.
///
/// Defaults target Landsat 8-9 Collection 2 Level-2 surface reflectance.
#[derive(Debug, Clone)]
pub struct CompositeOptions {
    pub collection: String,
    pub green_band: String,
    pub red_band: String,
    pub nir_band: String,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            collection: "landsat-c2-l2".to_string(),
            green_band: "green".to_string(),
            red_band: "red".to_string(),
            nir_band: "nir08".to_string(),
        }
    }
}

/// The three bands of the chosen scene, on the scene's grid.
#[derive(Debug, Clone)]
pub struct BandTriple {
    pub scene_id: String,
    pub cloud_cover: Option<f64>,
    pub green: Raster<f64>,
    pub red: Raster<f64>,
    pub nir: Raster<f64>,
}

/// Picks one representative scene per calendar year.
pub struct AnnualCompositeSelector<A> {
    archive: A,
    options: CompositeOptions,
}

impl<A: ImageArchive> AnnualCompositeSelector<A> {
    pub fn new(archive: A) -> Self {
        Self::with_options(archive, CompositeOptions::default())
    }

    pub fn with_options(archive: A, options: CompositeOptions) -> Self {
        Self { archive, options }
    }

    pub fn options(&self) -> &CompositeOptions {
        &self.options
    }

    /// Least cloudy scene acquired in `[year-01-01, year+1-01-01)` that
    /// intersects `roi`, as a green/red/NIR triple.
    ///
    /// `Ok(None)` when the archive has no such scene. Archive and band
    /// read failures are returned as errors.
    pub fn select(&self, year: i32, roi: &RegionOfInterest) -> Result<Option<BandTriple>> {
        let range = DateRange::calendar_year(year);
        let scenes = self.archive.find(&self.options.collection, roi, &range)?;
        debug!(year, candidates = scenes.len(), %range, "archive query");

        let Some(scene) = scenes.into_iter().next() else {
            info!(year, "no scene for year, skipping");
            return Ok(None);
        };

        info!(year, scene = scene.id(), cloud_cover = ?scene.cloud_cover(), "selected scene");
        Ok(Some(BandTriple {
            scene_id: scene.id().to_string(),
            cloud_cover: scene.cloud_cover(),
            green: scene.select_band(&self.options.green_band)?,
            red: scene.select_band(&self.options.red_band)?,
            nir: scene.select_band(&self.options.nir_band)?,
        }))
    }
}
