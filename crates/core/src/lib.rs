//! # Verdex Core
//!
//! Core types and I/O shared by every verdex crate.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2-D grid
//! - `GeoTransform`: six-coefficient affine georeferencing
//! - `IndexType`: the closed set of spectral indices
//! - `RegionOfInterest`: polygon used to filter and crop archive scenes
//! - `ImageArchive` / `SceneHandle`: the remote archive capability
//! - Native GeoTIFF reading and writing

pub mod archive;
pub mod crs;
pub mod error;
pub mod index;
pub mod io;
pub mod raster;
pub mod roi;

pub use archive::{DateRange, ImageArchive, SceneHandle};
pub use crs::CRS;
pub use error::{Error, Result};
pub use index::IndexType;
pub use raster::{GeoTransform, Raster, RasterElement};
pub use roi::RegionOfInterest;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::archive::{DateRange, ImageArchive, SceneHandle};
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::index::IndexType;
    pub use crate::io::RasterSource;
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::roi::RegionOfInterest;
}
