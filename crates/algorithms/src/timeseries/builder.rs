use super::selector::{AnnualCompositeSelector, BandTriple, CompositeOptions};
use crate::imagery::normalized_difference;
use tracing::info;
use verdex_core::{Error, ImageArchive, IndexType, Raster, RegionOfInterest, Result};

/// Index grid of one year, tagged with the scene it came from.
#[derive(Debug, Clone)]
pub struct AnnualComposite {
    pub year: i32,
    pub grid: Raster<f64>,
    pub scene_id: String,
    pub cloud_cover: Option<f64>,
}

/// Builds an ordered, year-tagged index sequence over an inclusive year
/// range. Years without a scene are omitted, so the output may be shorter
/// than the range.
pub struct TimeSeriesBuilder<A> {
    selector: AnnualCompositeSelector<A>,
}

impl<A: ImageArchive> TimeSeriesBuilder<A> {
    pub fn new(archive: A) -> Self {
        Self {
            selector: AnnualCompositeSelector::new(archive),
        }
    }

    pub fn with_options(archive: A, options: CompositeOptions) -> Self {
        Self {
            selector: AnnualCompositeSelector::with_options(archive, options),
        }
    }

    /// Build the series for `start..=end`.
    ///
    /// The year range and index are validated before the archive is
    /// queried. Only NDVI (NIR, red) and NDWI (green, NIR) have a two-band
    /// form. Years are queried sequentially; the first archive failure
    /// aborts the whole request.
    pub fn build(
        &self,
        start: i32,
        end: i32,
        roi: &RegionOfInterest,
        index: IndexType,
    ) -> Result<Vec<AnnualComposite>> {
        if start > end {
            return Err(Error::InvalidYearRange { start, end });
        }
        if !index.has_two_band_form() {
            return Err(Error::UnsupportedIndex(index.name().to_string()));
        }

        let mut series = Vec::new();
        for year in start..=end {
            let Some(triple) = self.selector.select(year, roi)? else {
                continue;
            };
            series.push(composite(year, index, triple)?);
        }

        info!(
            index = %index,
            start,
            end,
            years = series.len(),
            "time series built"
        );
        Ok(series)
    }
}

fn composite(year: i32, index: IndexType, triple: BandTriple) -> Result<AnnualComposite> {
    let (a, b) = match index {
        IndexType::NDVI => (&triple.nir, &triple.red),
        IndexType::NDWI => (&triple.green, &triple.nir),
        other => return Err(Error::UnsupportedIndex(other.name().to_string())),
    };
    let values = normalized_difference(a.view(), b.view())?;

    Ok(AnnualComposite {
        year,
        grid: triple.nir.with_same_meta(values),
        scene_id: triple.scene_id,
        cloud_cover: triple.cloud_cover,
    })
}
