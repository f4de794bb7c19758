//! # Verdex Colormap
//!
//! Per-index visualization parameters and raster → RGBA conversion.
//! Nothing here encodes images; the RGBA buffer and [`VisParams`] are what
//! an external renderer or animator consumes.

mod render;
mod scheme;
mod vis;

pub use render::{auto_params, raster_to_rgba, ColormapParams};
pub use scheme::{evaluate, ColorScheme, ColorStop, Rgb};
pub use vis::{preview_scheme, preview_vis_params, timeseries_vis_params, VisParams};
