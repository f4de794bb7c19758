//! Coordinate sampling of a derived grid.
//!
//! Every point is resolved on its own. A point that cannot be parsed,
//! falls outside the grid or reads a non-finite value is reported with
//! an absent value; the rest of the batch is unaffected.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use verdex_core::GeoTransform;

/// A `(lat, lon)` pair exactly as the caller supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: String,
    pub lon: String,
}

impl GeoPoint {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
        }
    }
}

/// Outcome for one point: the original text plus the value, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleResult {
    pub lat: String,
    pub lon: String,
    pub value: Option<f64>,
}

/// Why a single point produced no value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplePointError {
    #[error("cannot parse {axis} '{text}' as a number")]
    Parse { axis: &'static str, text: String },

    #[error("coordinate ({lat}, {lon}) is not finite")]
    NonFinite { lat: f64, lon: f64 },

    #[error("reference transform is not invertible")]
    DegenerateTransform,

    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },

    #[error("cell ({row}, {col}) holds a non-finite value")]
    NonFiniteValue { row: usize, col: usize },
}

fn parse_axis(axis: &'static str, text: &str) -> Result<f64, SamplePointError> {
    text.trim().parse::<f64>().map_err(|_| SamplePointError::Parse {
        axis,
        text: text.to_string(),
    })
}

/// Grid cell `(row, col)` holding `point`. Longitude is x, latitude is y.
pub fn resolve_point(
    point: &GeoPoint,
    transform: &GeoTransform,
    shape: (usize, usize),
) -> Result<(usize, usize), SamplePointError> {
    let lat = parse_axis("latitude", &point.lat)?;
    let lon = parse_axis("longitude", &point.lon)?;
    if !lat.is_finite() || !lon.is_finite() {
        return Err(SamplePointError::NonFinite { lat, lon });
    }

    let (row, col) = transform
        .row_col(lon, lat)
        .ok_or(SamplePointError::DegenerateTransform)?;

    let (rows, cols) = shape;
    if row < 0 || col < 0 || row as usize >= rows || col as usize >= cols {
        return Err(SamplePointError::OutOfBounds {
            row,
            col,
            rows,
            cols,
        });
    }

    Ok((row as usize, col as usize))
}

fn sample_one(
    point: &GeoPoint,
    transform: &GeoTransform,
    grid: &ArrayView2<'_, f64>,
) -> Result<f64, SamplePointError> {
    let (row, col) = resolve_point(point, transform, grid.dim())?;
    let value = grid[[row, col]];
    if !value.is_finite() {
        return Err(SamplePointError::NonFiniteValue { row, col });
    }
    Ok(value)
}

/// Sample `grid` at every point, preserving order and length.
pub fn sample_points(
    points: &[GeoPoint],
    transform: &GeoTransform,
    grid: ArrayView2<'_, f64>,
) -> Vec<SampleResult> {
    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let value = match sample_one(point, transform, &grid) {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!(point = i, lat = %point.lat, lon = %point.lon, "sample skipped: {e}");
                    None
                }
            };
            SampleResult {
                lat: point.lat.clone(),
                lon: point.lon.clone(),
                value,
            }
        })
        .collect()
}

/// Normalise an index-addressed form (`coordinates[0][lat]`,
/// `coordinates[0][lon]`, `coordinates[1][lat]`, ...) into an ordered list.
///
/// Reading stops at the first index missing either key, or whose lat and
/// lon are both empty.
pub fn points_from_indexed_form(form: &HashMap<String, String>) -> Vec<GeoPoint> {
    let mut points = Vec::new();
    for i in 0.. {
        let lat = form.get(&format!("coordinates[{i}][lat]"));
        let lon = form.get(&format!("coordinates[{i}][lon]"));
        match (lat, lon) {
            (Some(lat), Some(lon)) if !(lat.is_empty() && lon.is_empty()) => {
                points.push(GeoPoint::new(lat.as_str(), lon.as_str()));
            }
            _ => break,
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    /// 10x10 geographic grid, 0.01° cells, upper-left at (-70.0, -33.0).
    fn fixture() -> (GeoTransform, Array2<f64>) {
        let gt = GeoTransform::new(-70.0, -33.0, 0.01, -0.01);
        let grid = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f64 / 100.0);
        (gt, grid)
    }

    #[test]
    fn origin_maps_to_first_cell() {
        let (gt, grid) = fixture();
        let cell = resolve_point(&GeoPoint::new("-33.0", "-70.0"), &gt, grid.dim()).unwrap();
        assert_eq!(cell, (0, 0));
    }

    #[test]
    fn interior_point() {
        let (gt, grid) = fixture();
        // Centre of row 2, col 5.
        let out = sample_points(&[GeoPoint::new("-33.025", "-69.945")], &gt, grid.view());
        assert_relative_eq!(out[0].value.unwrap(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn malformed_point_is_isolated() {
        let (gt, grid) = fixture();
        let points = vec![
            GeoPoint::new("-33.005", "-69.995"),
            GeoPoint::new("abc", "-69.995"),
            GeoPoint::new("-33.095", "-69.905"),
        ];
        let out = sample_points(&points, &gt, grid.view());

        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[0].value.unwrap(), 0.0);
        assert_eq!(out[1].value, None);
        assert_eq!(out[1].lat, "abc");
        assert_relative_eq!(out[2].value.unwrap(), 0.99, epsilon = 1e-12);
    }

    #[test]
    fn out_of_bounds_and_edges() {
        let (gt, grid) = fixture();
        let points = vec![
            GeoPoint::new("-32.999", "-69.995"), // above the top edge
            GeoPoint::new("-33.005", "-70.001"), // left of the left edge
            GeoPoint::new("-33.2", "-69.995"),   // below the bottom edge
            GeoPoint::new("", ""),
        ];
        let out = sample_points(&points, &gt, grid.view());
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|r| r.value.is_none()));
    }

    #[test]
    fn non_finite_values_are_absent() {
        let (gt, mut grid) = fixture();
        grid[[0, 0]] = f64::NAN;
        grid[[0, 1]] = f64::INFINITY;
        let points = vec![
            GeoPoint::new("-33.005", "-69.995"),
            GeoPoint::new("-33.005", "-69.985"),
            GeoPoint::new("NaN", "-69.985"),
        ];
        let out = sample_points(&points, &gt, grid.view());
        assert!(out.iter().all(|r| r.value.is_none()));
    }

    #[test]
    fn degenerate_transform() {
        let gt = GeoTransform::new(0.0, 0.0, 0.0, 0.0);
        let err = resolve_point(&GeoPoint::new("1", "1"), &gt, (2, 2)).unwrap_err();
        assert_eq!(err, SamplePointError::DegenerateTransform);
    }

    #[test]
    fn indexed_form_stops_at_first_gap() {
        let mut form = HashMap::new();
        form.insert("coordinates[0][lat]".to_string(), "-33.4".to_string());
        form.insert("coordinates[0][lon]".to_string(), "-70.6".to_string());
        form.insert("coordinates[1][lat]".to_string(), "x".to_string());
        form.insert("coordinates[1][lon]".to_string(), "-70.5".to_string());
        form.insert("coordinates[3][lat]".to_string(), "-33.0".to_string());
        form.insert("coordinates[3][lon]".to_string(), "-70.0".to_string());

        let points = points_from_indexed_form(&form);
        assert_eq!(
            points,
            vec![GeoPoint::new("-33.4", "-70.6"), GeoPoint::new("x", "-70.5")]
        );
    }

    #[test]
    fn indexed_form_empty_pair_terminates() {
        let mut form = HashMap::new();
        form.insert("coordinates[0][lat]".to_string(), String::new());
        form.insert("coordinates[0][lon]".to_string(), String::new());
        assert!(points_from_indexed_form(&form).is_empty());
    }
}
