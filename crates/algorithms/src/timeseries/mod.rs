//! Annual index time series from a remote image archive
//!
//! [`AnnualCompositeSelector`] picks the least cloudy scene of one
//! calendar year; [`TimeSeriesBuilder`] drives it across a year range and
//! computes the two-band index for every year that has a scene.

mod builder;
mod selector;

pub use builder::{AnnualComposite, TimeSeriesBuilder};
pub use selector::{AnnualCompositeSelector, BandTriple, CompositeOptions};

#[cfg(test)]
pub(crate) mod mock;
