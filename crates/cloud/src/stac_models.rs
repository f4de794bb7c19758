//! STAC (SpatioTemporal Asset Catalog) data types.
//!
//! Serde models for STAC Item Search (`POST /search`): the request body
//! with the `intersects`, `sortby` and `query` extensions, and the subset
//! of the response the archive needs (datetime, cloud cover, projection,
//! asset hrefs and `raster:bands` scaling).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Search request
// ---------------------------------------------------------------------------

/// Sort direction for the `sortby` extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `sortby` term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Body for `POST /search` (STAC API – Item Search).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StacSearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// GeoJSON geometry the items must intersect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersects: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortby: Option<Vec<SortBy>>,

    /// Property filters (`query` extension), e.g. `{"platform": {"in": [..]}}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<serde_json::Map<String, Value>>,

    /// Pagination token (next page).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl StacSearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bounding box `[west, south, east, north]`.
    pub fn bbox(mut self, west: f64, south: f64, east: f64, north: f64) -> Self {
        self.bbox = Some(vec![west, south, east, north]);
        self
    }

    pub fn intersects(mut self, geometry: Value) -> Self {
        self.intersects = Some(geometry);
        self
    }

    /// Set datetime or datetime range (e.g. `"2024-06-01/2024-06-30"`).
    pub fn datetime(mut self, dt: &str) -> Self {
        self.datetime = Some(dt.to_string());
        self
    }

    pub fn collections(mut self, cols: &[&str]) -> Self {
        self.collections = Some(cols.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set maximum items per page.
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Append a sort term.
    pub fn sort_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sortby.get_or_insert_with(Vec::new).push(SortBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Add a property filter: `{ property: { op: value } }`.
    pub fn query(mut self, property: &str, op: &str, value: Value) -> Self {
        let filters = self.query.get_or_insert_with(serde_json::Map::new);
        let entry = filters
            .entry(property.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Value::Object(ops) = entry {
            ops.insert(op.to_string(), value);
        }
        self
    }

    pub fn token(mut self, tok: &str) -> Self {
        self.token = Some(tok.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A STAC Item Collection (GeoJSON FeatureCollection).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItemCollection {
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<StacItem>,

    #[serde(default)]
    pub links: Vec<StacLink>,

    #[serde(rename = "numberMatched", skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<u64>,

    #[serde(rename = "numberReturned", skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<u64>,
}

impl StacItemCollection {
    /// The `"next"` pagination link, if any.
    pub fn next_link(&self) -> Option<&StacLink> {
        self.links.iter().find(|l| l.rel == "next")
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single STAC Item (GeoJSON Feature).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItem {
    #[serde(rename = "type")]
    pub type_: String,

    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,

    /// `[west, south, east, north]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    pub properties: StacItemProperties,

    pub assets: HashMap<String, StacAsset>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

impl StacItem {
    pub fn asset(&self, key: &str) -> Option<&StacAsset> {
        self.assets.get(key)
    }

    pub fn cloud_cover(&self) -> Option<f64> {
        self.properties.eo_cloud_cover
    }

    pub fn datetime(&self) -> Option<&str> {
        self.properties.datetime.as_deref()
    }

    /// EPSG code from the projection extension: `proj:epsg` (v1) or
    /// `proj:code` = `"EPSG:nnnn"` (v2).
    pub fn epsg(&self) -> Option<u32> {
        let extra = &self.properties.extra;
        if let Some(code) = extra.get("proj:epsg").and_then(Value::as_u64) {
            return u32::try_from(code).ok();
        }
        extra
            .get("proj:code")
            .and_then(Value::as_str)
            .and_then(|s| s.strip_prefix("EPSG:"))
            .and_then(|s| s.parse().ok())
    }
}

/// STAC Item properties.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItemProperties {
    /// ISO 8601 datetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Cloud cover percentage (EO extension).
    #[serde(rename = "eo:cloud_cover", skip_serializing_if = "Option::is_none")]
    pub eo_cloud_cover: Option<f64>,

    /// e.g. `"landsat-8"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A single STAC Asset (file reference).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacAsset {
    pub href: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    #[serde(rename = "raster:bands", skip_serializing_if = "Option::is_none")]
    pub raster_bands: Option<Vec<RasterBand>>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl StacAsset {
    /// `(scale, offset)` of the first `raster:bands` entry, if advertised.
    pub fn scale_offset(&self) -> Option<(f64, f64)> {
        let band = self.raster_bands.as_ref()?.first()?;
        if band.scale.is_none() && band.offset.is_none() {
            return None;
        }
        Some((band.scale.unwrap_or(1.0), band.offset.unwrap_or(0.0)))
    }
}

/// One entry of the `raster:bands` extension.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RasterBand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodata: Option<f64>,
}

/// A STAC Link (used for pagination).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacLink {
    pub rel: String,

    pub href: String,

    /// HTTP method (default GET; `"next"` often uses POST).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request body for POST-based pagination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Merge `body` into the previous request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Two Landsat Collection 2 Level-2 items as served by Planetary Computer.
    pub const LANDSAT_PAGE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "LC08_L2SP_233083_20200315_02_T1",
      "bbox": [-71.64, -34.28, -69.12, -32.17],
      "properties": {
        "datetime": "2020-03-15T14:41:32.123456Z",
        "eo:cloud_cover": 12.5,
        "platform": "landsat-8",
        "proj:epsg": 32619
      },
      "assets": {
        "red": {
          "href": "https://landsateuwest.blob.core.windows.net/landsat-c2/level-2/LC08_SR_B4.TIF",
          "type": "image/tiff; application=geotiff; profile=cloud-optimized",
          "roles": ["data"],
          "raster:bands": [{"scale": 2.75e-05, "offset": -0.2, "nodata": 0, "data_type": "uint16"}]
        },
        "nir08": {
          "href": "https://landsateuwest.blob.core.windows.net/landsat-c2/level-2/LC08_SR_B5.TIF",
          "roles": ["data"],
          "raster:bands": [{"scale": 2.75e-05, "offset": -0.2}]
        },
        "thumbnail": {
          "href": "https://example.com/thumb.png",
          "type": "image/png",
          "roles": ["thumbnail"]
        }
      },
      "collection": "landsat-c2-l2"
    },
    {
      "type": "Feature",
      "id": "LC08_L2SP_233083_20200127_02_T1",
      "properties": {
        "datetime": "2020-01-27T14:41:40Z",
        "eo:cloud_cover": 0.8,
        "platform": "landsat-8",
        "proj:code": "EPSG:32619"
      },
      "assets": {},
      "collection": "landsat-c2-l2"
    }
  ],
  "links": [
    {
      "rel": "next",
      "href": "https://planetarycomputer.microsoft.com/api/stac/v1/search",
      "method": "POST",
      "body": {"token": "next:LC08_L2SP_233083_20200127_02_T1"},
      "merge": true
    }
  ],
  "numberReturned": 2
}"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::LANDSAT_PAGE;
    use super::*;
    use serde_json::json;

    fn page() -> StacItemCollection {
        serde_json::from_str(LANDSAT_PAGE).unwrap()
    }

    #[test]
    fn parse_page() {
        let col = page();
        assert_eq!(col.len(), 2);
        assert_eq!(col.number_returned, Some(2));
        assert_eq!(col.number_matched, None);

        let next = col.next_link().unwrap();
        assert_eq!(next.method.as_deref(), Some("POST"));
        assert_eq!(next.merge, Some(true));
    }

    #[test]
    fn item_properties() {
        let col = page();
        let item = &col.features[0];
        assert_eq!(item.datetime(), Some("2020-03-15T14:41:32.123456Z"));
        assert_eq!(item.cloud_cover(), Some(12.5));
        assert_eq!(item.properties.platform.as_deref(), Some("landsat-8"));
        assert_eq!(item.collection.as_deref(), Some("landsat-c2-l2"));
    }

    #[test]
    fn epsg_from_either_projection_version() {
        let col = page();
        assert_eq!(col.features[0].epsg(), Some(32619));
        assert_eq!(col.features[1].epsg(), Some(32619));
    }

    #[test]
    fn raster_band_scaling() {
        let col = page();
        let item = &col.features[0];
        let (scale, offset) = item.asset("red").unwrap().scale_offset().unwrap();
        assert!((scale - 2.75e-5).abs() < 1e-12);
        assert!((offset + 0.2).abs() < 1e-12);
        assert!(item.asset("thumbnail").unwrap().scale_offset().is_none());
        assert!(item.asset("green").is_none());
    }

    #[test]
    fn search_body() {
        let params = StacSearchParams::new()
            .intersects(json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}))
            .datetime("2020-01-01T00:00:00Z/2020-12-31T23:59:59Z")
            .collections(&["landsat-c2-l2"])
            .limit(10)
            .sort_by("eo:cloud_cover", SortDirection::Asc)
            .query("platform", "in", json!(["landsat-8"]));

        let body = serde_json::to_value(&params).unwrap();
        assert_eq!(body["collections"], json!(["landsat-c2-l2"]));
        assert_eq!(body["intersects"]["type"], "Polygon");
        assert_eq!(
            body["sortby"],
            json!([{"field": "eo:cloud_cover", "direction": "asc"}])
        );
        assert_eq!(body["query"], json!({"platform": {"in": ["landsat-8"]}}));
        assert_eq!(body["limit"], 10);
        assert!(body.get("bbox").is_none());
        assert!(body.get("token").is_none());
    }

    #[test]
    fn empty_params_serialize_to_empty_object() {
        let body = serde_json::to_value(StacSearchParams::new()).unwrap();
        assert!(body.as_object().unwrap().is_empty());
    }
}
