//! # Verdex Cloud
//!
//! STAC implementation of the remote image archive used by the annual
//! time series.
//!
//! - [`StacClient`]: async item search with pagination and retries,
//!   Planetary Computer asset signing, asset download
//! - [`StacArchive`]: blocking [`verdex_core::ImageArchive`] over a
//!   [`StacClient`]; scenes fetch their bands whole, crop them to the
//!   region of interest (reprojected to the scene's UTM zone) and apply
//!   `raster:bands` scaling

pub mod archive;
pub mod error;
pub mod reproject;
pub mod stac_client;
pub mod stac_models;

pub use archive::{StacArchive, StacArchiveOptions, StacScene};
pub use error::{CloudError, Result};
pub use stac_client::{StacCatalog, StacClient, StacClientOptions};
pub use stac_models::{StacItem, StacItemCollection, StacSearchParams};
