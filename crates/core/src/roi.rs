//! Region of interest for archive queries

use crate::error::{Error, Result};
use geo_types::{Coord, LineString, Polygon};
use serde_json::{json, Value};

/// Immutable polygon (lon/lat, WGS84) supplied by the caller.
///
/// Used as the spatial filter when querying the archive and as the extent
/// each fetched band is cropped to. It is never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOfInterest {
    polygon: Polygon<f64>,
}

impl RegionOfInterest {
    /// Wrap an existing polygon.
    pub fn new(polygon: Polygon<f64>) -> Result<Self> {
        validate_ring(polygon.exterior())?;
        for hole in polygon.interiors() {
            validate_ring(hole)?;
        }
        Ok(Self { polygon })
    }

    /// Build from a single `[lon, lat]` ring. The ring is closed if the last
    /// vertex differs from the first.
    pub fn from_lon_lat_ring(ring: &[[f64; 2]]) -> Result<Self> {
        Self::from_rings(&[ring.to_vec()])
    }

    /// Build from GeoJSON-style rings: the first ring is the exterior, any
    /// further rings are holes.
    pub fn from_rings(rings: &[Vec<[f64; 2]>]) -> Result<Self> {
        let (exterior, holes) = rings.split_first().ok_or_else(|| Error::InvalidParameter {
            name: "polygon",
            value: "[]".into(),
            reason: "at least one ring is required".into(),
        })?;

        let to_line = |ring: &Vec<[f64; 2]>| {
            LineString::from(
                ring.iter()
                    .map(|&[x, y]| Coord { x, y })
                    .collect::<Vec<_>>(),
            )
        };

        // Polygon::new closes open rings
        let polygon = Polygon::new(to_line(exterior), holes.iter().map(to_line).collect());
        Self::new(polygon)
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Envelope `(west, south, east, north)` of the exterior ring.
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        self.polygon.exterior().coords().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(w, s, e, n), c| (w.min(c.x), s.min(c.y), e.max(c.x), n.max(c.y)),
        )
    }

    /// GeoJSON `Polygon` geometry, suitable for a STAC `intersects` filter.
    pub fn to_geojson(&self) -> Value {
        let ring = |ls: &LineString<f64>| -> Vec<[f64; 2]> {
            ls.coords().map(|c| [c.x, c.y]).collect()
        };
        let mut rings = vec![ring(self.polygon.exterior())];
        rings.extend(self.polygon.interiors().iter().map(ring));

        json!({
            "type": "Polygon",
            "coordinates": rings,
        })
    }
}

fn validate_ring(ring: &LineString<f64>) -> Result<()> {
    if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "polygon",
            value: format!("{:?}", ring.0),
            reason: "coordinates must be finite".into(),
        });
    }

    let mut distinct: Vec<Coord<f64>> = Vec::new();
    for c in ring.coords() {
        if !distinct.contains(c) {
            distinct.push(*c);
        }
    }
    if distinct.len() < 3 {
        return Err(Error::InvalidParameter {
            name: "polygon",
            value: format!("{:?}", ring.0),
            reason: "a ring needs at least 3 distinct vertices".into(),
        });
    }
    Ok(())
}
