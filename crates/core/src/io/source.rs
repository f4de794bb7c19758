//! Single-band raster sources for grid alignment.

use super::native::{read_geotiff, read_geotiff_from_buffer, read_header};
use crate::crs::CRS;
use crate::error::Result;
use crate::raster::{GeoTransform, Raster};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

/// An opened single-band raster resource.
///
/// The caller opens and releases the underlying resource; readers only
/// pull the band and its georeferencing out of it.
pub trait RasterSource {
    /// Short description used in logs and error messages.
    fn describe(&self) -> String;

    /// The band promoted to `f64`, nodata cells as NaN.
    fn read_band(&self) -> Result<Array2<f64>>;

    /// Georeferencing the band was read with.
    fn transform(&self) -> GeoTransform;
}

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Bytes { label: String, data: Vec<u8> },
}

/// A GeoTIFF on disk or in memory. Opening parses only the header; pixels
/// are decoded by [`RasterSource::read_band`].
#[derive(Debug, Clone)]
pub struct GeoTiffSource {
    origin: Origin,
    band: usize,
    shape: (usize, usize),
    transform: GeoTransform,
    crs: Option<CRS>,
}

impl GeoTiffSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (shape, transform, crs) = read_header(BufReader::new(File::open(&path)?))?;
        Ok(Self {
            origin: Origin::Path(path),
            band: 0,
            shape,
            transform,
            crs,
        })
    }

    /// In-memory GeoTIFF, e.g. an uploaded file. `label` names it in logs.
    pub fn from_bytes(label: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let (shape, transform, crs) = read_header(Cursor::new(data.as_slice()))?;
        Ok(Self {
            origin: Origin::Bytes {
                label: label.into(),
                data,
            },
            band: 0,
            shape,
            transform,
            crs,
        })
    }

    /// Read sample `band` of a multi-sample image instead of the first.
    pub fn with_band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }

    /// `(rows, cols)` from the header
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn crs(&self) -> Option<CRS> {
        self.crs
    }
}

impl RasterSource for GeoTiffSource {
    fn describe(&self) -> String {
        match &self.origin {
            Origin::Path(p) => p.display().to_string(),
            Origin::Bytes { label, .. } => label.clone(),
        }
    }

    fn read_band(&self) -> Result<Array2<f64>> {
        let raster: Raster<f64> = match &self.origin {
            Origin::Path(p) => read_geotiff(p, Some(self.band))?,
            Origin::Bytes { data, .. } => read_geotiff_from_buffer(data, Some(self.band))?,
        };
        Ok(raster.to_f64().into_array())
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }
}

/// In-memory band; used for archive scenes and tests.
impl RasterSource for Raster<f64> {
    fn describe(&self) -> String {
        let (rows, cols) = self.shape();
        format!("in-memory {rows}x{cols} raster")
    }

    fn read_band(&self) -> Result<Array2<f64>> {
        Ok(self.to_f64().into_array())
    }

    fn transform(&self) -> GeoTransform {
        *Raster::transform(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::write_geotiff_to_buffer;

    #[test]
    fn bytes_source_reads_header_then_band() {
        let raster = Raster::<f64>::filled(3, 4, 0.25)
            .with_transform(GeoTransform::new(10.0, 20.0, 0.5, -0.5));
        let bytes = write_geotiff_to_buffer(&raster, None).unwrap();

        let src = GeoTiffSource::from_bytes("B4.tif", bytes).unwrap();
        assert_eq!(src.shape(), (3, 4));
        assert_eq!(src.describe(), "B4.tif");
        assert_eq!(RasterSource::transform(&src), GeoTransform::new(10.0, 20.0, 0.5, -0.5));

        let band = src.read_band().unwrap();
        assert_eq!(band.dim(), (3, 4));
        assert!((band[[2, 3]] - 0.25).abs() < 1e-7);
    }

    #[test]
    fn in_memory_source_masks_nodata() {
        let mut raster = Raster::<f64>::filled(2, 2, 1.0);
        raster.set_nodata(Some(-9999.0));
        raster.set(0, 1, -9999.0).unwrap();

        let band = raster.read_band().unwrap();
        assert!(band[[0, 1]].is_nan());
        assert_eq!(band[[1, 1]], 1.0);
    }
}
