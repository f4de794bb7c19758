//! [`ImageArchive`] backed by a STAC API.
//!
//! Searches run on an internal single-threaded Tokio runtime, so callers
//! stay synchronous. Bands are fetched whole, converted to `f64`, cropped
//! to the region of interest and scaled with the asset's `raster:bands`
//! scale/offset.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};
use verdex_core::archive::band_read_error;
use verdex_core::io::read_geotiff_from_buffer;
use verdex_core::{DateRange, ImageArchive, Raster, RegionOfInterest, SceneHandle, CRS};

use crate::error::{CloudError, Result};
use crate::reproject::project_bounds;
use crate::stac_client::{StacCatalog, StacClient, StacClientOptions};
use crate::stac_models::{SortDirection, StacItem, StacSearchParams};

/// Configuration for [`StacArchive`].
#[derive(Debug, Clone)]
pub struct StacArchiveOptions {
    pub catalog: StacCatalog,
    pub client: StacClientOptions,
    /// Restrict results to these `platform` values; empty means any.
    pub platforms: Vec<String>,
    /// Apply `raster:bands` scale/offset to fetched bands.
    pub apply_scale_offset: bool,
}

impl Default for StacArchiveOptions {
    fn default() -> Self {
        Self {
            catalog: StacCatalog::PlanetaryComputer,
            client: StacClientOptions::default(),
            platforms: vec!["landsat-8".to_string()],
            apply_scale_offset: true,
        }
    }
}

struct Shared {
    rt: tokio::runtime::Runtime,
    client: StacClient,
    apply_scale_offset: bool,
}

/// Remote archive over STAC Item Search.
pub struct StacArchive {
    shared: Arc<Shared>,
    platforms: Vec<String>,
}

impl StacArchive {
    pub fn new(options: StacArchiveOptions) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CloudError::Network(e.to_string()))?;
        let client = StacClient::new(options.catalog, options.client)?;

        Ok(Self {
            shared: Arc::new(Shared {
                rt,
                client,
                apply_scale_offset: options.apply_scale_offset,
            }),
            platforms: options.platforms,
        })
    }

    pub fn catalog(&self) -> &StacCatalog {
        self.shared.client.catalog()
    }

    fn search_params(
        &self,
        collection: &str,
        roi: &RegionOfInterest,
        range: &DateRange,
    ) -> StacSearchParams {
        let mut params = StacSearchParams::new()
            .collections(&[collection])
            .intersects(roi.to_geojson())
            .datetime(&range.to_stac_interval())
            .limit(self.shared.client.options().page_limit)
            .sort_by("eo:cloud_cover", SortDirection::Asc);
        if !self.platforms.is_empty() {
            params = params.query("platform", "in", json!(self.platforms));
        }
        params
    }
}

impl ImageArchive for StacArchive {
    type Scene = StacScene;

    fn find(
        &self,
        collection: &str,
        roi: &RegionOfInterest,
        range: &DateRange,
    ) -> verdex_core::Result<Vec<StacScene>> {
        let params = self.search_params(collection, roi, range);
        let items = self
            .shared
            .rt
            .block_on(self.shared.client.search_all(&params))
            .map_err(|e| e.into_upstream(format!("searching {collection} for {range}")))?;

        let fetched = items.len();
        let ranked = rank_by_cloud_cover(items, range);
        info!(collection, %range, fetched, kept = ranked.len(), "archive search");

        let bounds = roi.bbox();
        Ok(ranked
            .into_iter()
            .map(|item| StacScene {
                item,
                roi_bounds: bounds,
                shared: Arc::clone(&self.shared),
            })
            .collect())
    }
}

/// Drop items acquired outside `range` and order the rest by ascending
/// cloud cover. The sort is stable and items without cloud cover go last,
/// so server order breaks ties.
pub fn rank_by_cloud_cover(items: Vec<StacItem>, range: &DateRange) -> Vec<StacItem> {
    let mut kept: Vec<StacItem> = items
        .into_iter()
        .filter(|item| match item.datetime() {
            Some(dt) => range.contains_timestamp(dt),
            None => false,
        })
        .collect();

    kept.sort_by(|a, b| match (a.cloud_cover(), b.cloud_cover()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    kept
}

/// One STAC item returned by [`StacArchive::find`].
pub struct StacScene {
    item: StacItem,
    roi_bounds: (f64, f64, f64, f64),
    shared: Arc<Shared>,
}

impl StacScene {
    pub fn item(&self) -> &StacItem {
        &self.item
    }

    fn fetch(&self, name: &str) -> Result<Raster<f64>> {
        let asset = self.item.asset(name).ok_or_else(|| CloudError::MissingAsset {
            item: self.item.id.clone(),
            asset: name.to_string(),
        })?;

        let client = &self.shared.client;
        let bytes = self.shared.rt.block_on(async {
            let href = client.sign_asset_href(&asset.href).await?;
            client.download(&href).await
        })?;

        let raster: Raster<f64> =
            read_geotiff_from_buffer(&bytes, Some(0)).map_err(|e| CloudError::Decode {
                href: asset.href.clone(),
                reason: e.to_string(),
            })?;
        let mut band = self.crop_to_roi(raster.to_f64())?;

        if self.shared.apply_scale_offset {
            if let Some((scale, offset)) = asset.scale_offset() {
                apply_scale_offset(&mut band, scale, offset);
            }
        }
        Ok(band)
    }

    fn crop_to_roi(&self, raster: Raster<f64>) -> Result<Raster<f64>> {
        let crs = self
            .item
            .epsg()
            .map(CRS::from_epsg)
            .or_else(|| raster.crs().copied());

        let Some(crs) = crs else {
            warn!(item = %self.item.id, "no CRS advertised, band left uncropped");
            return Ok(raster);
        };
        let Some(bounds) = project_bounds(self.roi_bounds, crs) else {
            warn!(item = %self.item.id, %crs, "unsupported CRS, band left uncropped");
            return Ok(raster);
        };

        let window = raster
            .window_for_bounds(bounds)
            .ok_or_else(|| CloudError::OutsideScene {
                item: self.item.id.clone(),
            })?;
        debug!(item = %self.item.id, ?window, "cropping to region of interest");
        Ok(raster.crop(window)?)
    }
}

/// `v * scale + offset` on every finite cell.
pub fn apply_scale_offset(raster: &mut Raster<f64>, scale: f64, offset: f64) {
    raster
        .data_mut()
        .mapv_inplace(|v| if v.is_finite() { v * scale + offset } else { v });
}

impl SceneHandle for StacScene {
    fn id(&self) -> &str {
        &self.item.id
    }

    fn cloud_cover(&self) -> Option<f64> {
        self.item.cloud_cover()
    }

    fn select_band(&self, name: &str) -> verdex_core::Result<Raster<f64>> {
        self.fetch(name)
            .map_err(|e| band_read_error(&self.item.id, name, e))
    }
}
