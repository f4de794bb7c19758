//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{s, Array2, ArrayView2};

/// A georeferenced 2-D grid.
///
/// `Raster<T>` stores one band of cell values in row-major `(row, col)`
/// order together with the transform it was read with, an optional CRS and
/// an optional nodata value.
///
/// ```ignore
/// use verdex_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 0.42)?;
/// assert_eq!(raster.get(10, 20)?, 0.42);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

/// Rectangular cell range `[row, row + rows) x [col, col + cols)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl<T: RasterElement> Raster<T> {
    /// Zero-filled raster with the default transform
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Raster filled with `value`
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Raster from row-major samples
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Raster wrapping an existing array
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Replace the transform, builder style.
    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    /// New raster holding `data` with this raster's transform and CRS.
    pub fn with_same_meta<U: RasterElement>(&self, data: Array2<U>) -> Raster<U> {
        Raster {
            data,
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows, cols }),
        }
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Promote every cell to `f64`; nodata cells become NaN.
    pub fn to_f64(&self) -> Raster<f64> {
        let nodata = self.nodata;
        let data = self.data.mapv(|v| {
            if v.is_nodata(nodata) {
                f64::NAN
            } else {
                v.to_f64().unwrap_or(f64::NAN)
            }
        });
        let mut out = self.with_same_meta(data);
        out.set_nodata(Some(f64::NAN));
        out
    }

    /// Copy of the cells inside `window`, with the transform shifted to the
    /// window's upper-left corner.
    pub fn crop(&self, window: Window) -> Result<Raster<T>> {
        let (rows, cols) = self.shape();
        if window.rows == 0
            || window.cols == 0
            || window.row + window.rows > rows
            || window.col + window.cols > cols
        {
            return Err(Error::InvalidParameter {
                name: "window",
                value: format!("{:?}", window),
                reason: format!("outside raster of size ({rows}, {cols})"),
            });
        }

        let data = self
            .data
            .slice(s![
                window.row..window.row + window.rows,
                window.col..window.col + window.cols
            ])
            .to_owned();

        Ok(Raster {
            data,
            transform: self.transform.shifted(window.row, window.col),
            crs: self.crs.clone(),
            nodata: self.nodata,
        })
    }

    /// Cell window covering the geographic box `(min_x, min_y, max_x, max_y)`,
    /// clipped to the raster. `None` when the box misses the raster.
    pub fn window_for_bounds(&self, bounds: (f64, f64, f64, f64)) -> Option<Window> {
        let (min_x, min_y, max_x, max_y) = bounds;
        let corners = [
            self.transform.geo_to_pixel(min_x, min_y),
            self.transform.geo_to_pixel(min_x, max_y),
            self.transform.geo_to_pixel(max_x, min_y),
            self.transform.geo_to_pixel(max_x, max_y),
        ];
        if corners.iter().any(|(c, r)| !c.is_finite() || !r.is_finite()) {
            return None;
        }

        let col0 = corners.iter().map(|p| p.0).fold(f64::MAX, f64::min).floor();
        let col1 = corners.iter().map(|p| p.0).fold(f64::MIN, f64::max).ceil();
        let row0 = corners.iter().map(|p| p.1).fold(f64::MAX, f64::min).floor();
        let row1 = corners.iter().map(|p| p.1).fold(f64::MIN, f64::max).ceil();

        let (rows, cols) = self.shape();
        let c0 = col0.max(0.0) as usize;
        let r0 = row0.max(0.0) as usize;
        let c1 = (col1.max(0.0) as usize).min(cols);
        let r1 = (row1.max(0.0) as usize).min(rows);

        if c1 <= c0 || r1 <= r0 {
            return None;
        }

        Some(Window {
            row: r0,
            col: c0,
            rows: r1 - r0,
            cols: c1 - c0,
        })
    }

    /// Min, max and mean over valid cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter() {
            if value.is_nodata(self.nodata) {
                continue;
            }
            let Some(v) = value.to_f64().filter(|v| v.is_finite()) else {
                continue;
            };

            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }
            sum += v;
            count += 1;
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut raster: Raster<f64> = Raster::new(3, 3);
        assert!(raster.set(3, 0, 1.0).is_err());
        assert!(matches!(
            raster.get(0, 7),
            Err(Error::IndexOutOfBounds { row: 0, col: 7, .. })
        ));
    }

    #[test]
    fn test_statistics_skip_nan() {
        let mut raster: Raster<f64> = Raster::new(2, 2);
        raster.set(0, 0, 1.0).unwrap();
        raster.set(0, 1, 3.0).unwrap();
        raster.set(1, 0, f64::NAN).unwrap();
        raster.set(1, 1, 2.0).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(3.0));
        assert_eq!(stats.mean, Some(2.0));
        assert_eq!(stats.valid_count, 3);
        assert_eq!(stats.nodata_count, 1);
    }

    #[test]
    fn test_promotion_masks_nodata() {
        let mut raster = Raster::<u16>::from_vec(vec![0, 100, 200, 300], 2, 2).unwrap();
        raster.set_nodata(Some(0));
        let promoted = raster.to_f64();
        assert!(promoted.get(0, 0).unwrap().is_nan());
        assert_eq!(promoted.get(1, 1).unwrap(), 300.0);
    }

    #[test]
    fn test_crop_shifts_transform() {
        let raster = Raster::<f64>::from_vec((0..16).map(f64::from).collect(), 4, 4)
            .unwrap()
            .with_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));

        let sub = raster
            .crop(Window { row: 1, col: 2, rows: 2, cols: 2 })
            .unwrap();
        assert_eq!(sub.shape(), (2, 2));
        assert_eq!(sub.get(0, 0).unwrap(), 6.0);
        assert_eq!(sub.transform().origin_x, 2.0);
        assert_eq!(sub.transform().origin_y, 3.0);

        assert!(raster.crop(Window { row: 3, col: 3, rows: 2, cols: 1 }).is_err());
    }

    #[test]
    fn test_window_for_bounds_clips() {
        let raster = Raster::<f64>::new(10, 10)
            .with_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));

        let w = raster.window_for_bounds((2.5, 3.5, 5.5, 8.0)).unwrap();
        assert_eq!(w, Window { row: 2, col: 2, rows: 5, cols: 4 });

        let clipped = raster.window_for_bounds((-5.0, -5.0, 3.0, 20.0)).unwrap();
        assert_eq!(clipped, Window { row: 0, col: 0, rows: 10, cols: 3 });

        assert!(raster.window_for_bounds((20.0, 20.0, 30.0, 30.0)).is_none());
    }
}
