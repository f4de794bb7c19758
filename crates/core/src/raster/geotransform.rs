//! Affine georeferencing for rasters

use serde::{Deserialize, Serialize};

/// Six affine coefficients mapping pixel (col, row) to geographic (x, y):
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// North-up rasters have zero rotation terms and a negative `pixel_height`.
/// A transform is owned by the raster it was read with and never mutated
/// after that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size along X
    pub pixel_width: f64,
    /// Cell size along Y (usually negative)
    pub pixel_height: f64,
    /// Row contribution to X
    pub row_rotation: f64,
    /// Column contribution to Y
    pub col_rotation: f64,
}

const DEGENERATE_DET: f64 = 1e-12;

impl GeoTransform {
    /// North-up transform with no rotation.
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// From GDAL ordering `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// GDAL ordering, see [`GeoTransform::from_gdal`].
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Geographic coordinates of a pixel's upper-left corner.
    pub fn pixel_to_geo_corner(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Geographic coordinates of a pixel's center.
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.pixel_to_geo_corner(col as f64 + 0.5, row as f64 + 0.5)
    }

    fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Whether the transform can be inverted.
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > DEGENERATE_DET
    }

    /// Fractional pixel coordinates `(col, row)` of a geographic point.
    ///
    /// Returns `(NaN, NaN)` for a degenerate transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        if !self.is_invertible() {
            return (f64::NAN, f64::NAN);
        }
        let det = self.determinant();
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;
        (col, row)
    }

    /// Integer `(row, col)` containing a geographic point, flooring the
    /// fractional position. The result may be negative or past the raster
    /// edge; bounds are the caller's concern.
    pub fn row_col(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let (col, row) = self.geo_to_pixel(x, y);
        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        Some((row.floor() as i64, col.floor() as i64))
    }

    /// Cell size (square pixels, no rotation assumed)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Coefficient-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &GeoTransform, tolerance: f64) -> bool {
        self.to_gdal()
            .iter()
            .zip(other.to_gdal().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Envelope `(min_x, min_y, max_x, max_y)` of a `width` x `height` raster.
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.pixel_to_geo_corner(0.0, 0.0),
            self.pixel_to_geo_corner(w, 0.0),
            self.pixel_to_geo_corner(0.0, h),
            self.pixel_to_geo_corner(w, h),
        ];

        corners.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Transform of the sub-grid whose upper-left cell is `(row, col)`.
    pub fn shifted(&self, row: usize, col: usize) -> Self {
        let (origin_x, origin_y) = self.pixel_to_geo_corner(col as f64, row as f64);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_roundtrip() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);

        let (x, y) = gt.pixel_to_geo(5, 10);
        let (col, row) = gt.geo_to_pixel(x, y);

        assert_relative_eq!(col, 5.5, epsilon = 1e-10);
        assert_relative_eq!(row, 10.5, epsilon = 1e-10);
    }

    #[test]
    fn origin_maps_to_first_cell() {
        let gt = GeoTransform::new(30.0, 10.0, 0.01, -0.01);
        assert_eq!(gt.row_col(30.0, 10.0), Some((0, 0)));
    }

    #[test]
    fn row_col_floors_toward_negative() {
        let gt = GeoTransform::new(0.0, 0.0, 1.0, -1.0);
        // West of the origin and north of it
        assert_eq!(gt.row_col(-0.5, 0.5), Some((-1, -1)));
        assert_eq!(gt.row_col(2.5, -3.2), Some((3, 2)));
    }

    #[test]
    fn rotated_transform_inverts() {
        let gt = GeoTransform::from_gdal([10.0, 2.0, 0.5, 50.0, 0.25, -2.0]);
        let (x, y) = gt.pixel_to_geo_corner(3.0, 7.0);
        let (col, row) = gt.geo_to_pixel(x, y);
        assert_relative_eq!(col, 3.0, epsilon = 1e-9);
        assert_relative_eq!(row, 7.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_transform_has_no_cell() {
        let gt = GeoTransform::new(0.0, 0.0, 0.0, -1.0);
        assert!(!gt.is_invertible());
        assert_eq!(gt.row_col(1.0, 1.0), None);
        assert!(gt.geo_to_pixel(1.0, 1.0).0.is_nan());
    }

    #[test]
    fn bounds_of_north_up_grid() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn shifted_moves_origin() {
        let gt = GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0);
        let sub = gt.shifted(10, 4);
        assert_relative_eq!(sub.origin_x, 500_120.0, epsilon = 1e-9);
        assert_relative_eq!(sub.origin_y, 3_999_700.0, epsilon = 1e-9);
        assert_eq!(sub.pixel_width, 30.0);
    }

    #[test]
    fn approx_eq_tolerance() {
        let a = GeoTransform::new(0.0, 0.0, 30.0, -30.0);
        let b = GeoTransform::new(1e-9, 0.0, 30.0, -30.0);
        let c = GeoTransform::new(15.0, 0.0, 30.0, -30.0);
        assert!(a.approx_eq(&b, 1e-6));
        assert!(!a.approx_eq(&c, 1e-6));
    }
}
