//! WGS84 → UTM projection of region-of-interest bounds (Snyder 1987,
//! USGS Professional Paper 1395, pp. 61-64).
//!
//! Landsat and Sentinel-2 scenes are delivered in UTM (EPSG 326xx/327xx);
//! that is the only target family supported.

use verdex_core::CRS;

// WGS84 ellipsoid
const A: f64 = 6_378_137.0;
const F: f64 = 1.0 / 298.257_223_563;
const E2: f64 = 2.0 * F - F * F;
const E_PRIME2: f64 = E2 / (1.0 - E2);

const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Project lon/lat bounds `(west, south, east, north)` into `target`.
///
/// The four corners are projected and their envelope returned. WGS84
/// targets return the input unchanged; `None` for any CRS that is
/// neither WGS84 nor UTM.
pub fn project_bounds(bounds: (f64, f64, f64, f64), target: CRS) -> Option<(f64, f64, f64, f64)> {
    if target.is_wgs84() {
        return Some(bounds);
    }
    let (zone, north) = target.utm_zone()?;

    let (w, s, e, n) = bounds;
    let envelope = [(w, s), (w, n), (e, s), (e, n)]
        .into_iter()
        .map(|(lon, lat)| wgs84_to_utm(lon, lat, zone, north))
        .fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(min_x, min_y, max_x, max_y), (x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        );
    Some(envelope)
}

/// `(easting, northing)` in metres of a lon/lat point in degrees.
pub fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let central_meridian = (zone as f64 * 6.0 - 183.0).to_radians();

    let (sin_lat, cos_lat) = lat.sin_cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a1 = cos_lat * (lon_deg.to_radians() - central_meridian);
    let a2 = a1 * a1;
    let a3 = a2 * a1;
    let a4 = a2 * a2;
    let a5 = a4 * a1;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = FALSE_EASTING
        + K0 * n
            * (a1
                + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a5 / 120.0);

    // Snyder eq. 8-10
    let northing = K0
        * (meridional_arc(lat)
            + n * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    if north {
        (easting, northing)
    } else {
        (easting, northing + FALSE_NORTHING_SOUTH)
    }
}

/// Distance along the meridian from the equator to `lat` (radians),
/// Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}
