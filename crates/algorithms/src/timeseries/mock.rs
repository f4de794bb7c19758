//! In-memory archive that records every query.

use std::cell::RefCell;
use std::collections::HashMap;
use verdex_core::{
    DateRange, Error, GeoTransform, ImageArchive, Raster, RegionOfInterest, Result, SceneHandle,
};

#[derive(Debug, Clone)]
pub struct MockScene {
    id: String,
    cloud_cover: f64,
    bands: HashMap<String, Raster<f64>>,
}

impl MockScene {
    /// 4x4 scene with constant green, red and nir08 bands.
    pub fn uniform(id: &str, cloud_cover: f64, green: f64, red: f64, nir: f64) -> Self {
        let gt = GeoTransform::new(340_000.0, 6_300_000.0, 30.0, -30.0);
        let bands = [("green", green), ("red", red), ("nir08", nir)]
            .into_iter()
            .map(|(name, v)| (name.to_string(), Raster::filled(4, 4, v).with_transform(gt)))
            .collect();
        Self {
            id: id.to_string(),
            cloud_cover,
            bands,
        }
    }
}

impl SceneHandle for MockScene {
    fn id(&self) -> &str {
        &self.id
    }

    fn cloud_cover(&self) -> Option<f64> {
        Some(self.cloud_cover)
    }

    fn select_band(&self, name: &str) -> Result<Raster<f64>> {
        self.bands
            .get(name)
            .cloned()
            .ok_or_else(|| verdex_core::archive::band_read_error(&self.id, name, "no such asset"))
    }
}

#[derive(Default)]
pub struct MockArchive {
    years: HashMap<i32, Vec<MockScene>>,
    failing_year: Option<i32>,
    queries: RefCell<Vec<(String, DateRange)>>,
}

impl MockArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: i32, scenes: Vec<MockScene>) -> Self {
        self.years.insert(year, scenes);
        self
    }

    /// Queries for `year` fail with an upstream error.
    pub fn failing_on(mut self, year: i32) -> Self {
        self.failing_year = Some(year);
        self
    }

    pub fn queries(&self) -> Vec<(String, DateRange)> {
        self.queries.borrow().clone()
    }
}

impl ImageArchive for MockArchive {
    type Scene = MockScene;

    fn find(
        &self,
        collection: &str,
        _roi: &RegionOfInterest,
        range: &DateRange,
    ) -> Result<Vec<MockScene>> {
        self.queries
            .borrow_mut()
            .push((collection.to_string(), *range));

        let year = range.start.0;
        if self.failing_year == Some(year) {
            return Err(Error::upstream("searching the archive", "HTTP 503"));
        }
        Ok(self.years.get(&year).cloned().unwrap_or_default())
    }
}
