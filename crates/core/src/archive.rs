//! Remote image archive capability.
//!
//! The archive is an opaque collaborator: the composite selector only needs
//! to query it by collection, region and date range, and to pull named
//! bands out of the returned scenes. The STAC implementation lives in
//! `verdex-cloud`; tests use in-memory archives.

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::roi::RegionOfInterest;
use std::fmt;

/// Half-open acquisition window `[start, end)` of whole calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First included day as (year, month, day)
    pub start: (i32, u32, u32),
    /// First excluded day as (year, month, day)
    pub end: (i32, u32, u32),
}

impl DateRange {
    /// `[Jan 1 of year, Jan 1 of year + 1)`
    pub fn calendar_year(year: i32) -> Self {
        Self {
            start: (year, 1, 1),
            end: (year + 1, 1, 1),
        }
    }

    /// Whether an ISO-8601 timestamp (`YYYY-MM-DD...`) falls inside the range.
    ///
    /// Comparison is on the date part only, which is exact for day-aligned
    /// ranges.
    pub fn contains_timestamp(&self, timestamp: &str) -> bool {
        match parse_ymd(timestamp) {
            Some(day) => day >= self.start && day < self.end,
            None => false,
        }
    }

    /// STAC interval string. STAC intervals are closed, so the end is the
    /// last instant before the excluded day.
    pub fn to_stac_interval(&self) -> String {
        let (sy, sm, sd) = self.start;
        let (ey, em, ed) = self.end;
        let (ly, lm, ld) = previous_day(ey, em, ed);
        format!(
            "{sy:04}-{sm:02}-{sd:02}T00:00:00Z/{ly:04}-{lm:02}-{ld:02}T23:59:59Z"
        )
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sy, sm, sd) = self.start;
        let (ey, em, ed) = self.end;
        write!(f, "[{sy:04}-{sm:02}-{sd:02}, {ey:04}-{em:02}-{ed:02})")
    }
}

fn parse_ymd(s: &str) -> Option<(i32, u32, u32)> {
    let date = s.get(..10)?;
    let mut parts = date.split('-');
    let y = parts.next()?.parse().ok()?;
    let m = parts.next()?.parse().ok()?;
    let d = parts.next()?.parse().ok()?;
    Some((y, m, d))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        _ => 28,
    }
}

fn previous_day(year: i32, month: u32, day: u32) -> (i32, u32, u32) {
    if day > 1 {
        (year, month, day - 1)
    } else if month > 1 {
        (year, month - 1, days_in_month(year, month - 1))
    } else {
        (year - 1, 12, 31)
    }
}

/// A single scene returned by an archive query.
pub trait SceneHandle {
    /// Archive-wide scene identifier
    fn id(&self) -> &str;

    /// Cloud cover in percent, when the archive reports it
    fn cloud_cover(&self) -> Option<f64>;

    /// Read one named band as floating-point reflectance, cropped to the
    /// region the scene was queried with.
    fn select_band(&self, name: &str) -> Result<Raster<f64>>;
}

/// Query capability of a remote, time-ordered image archive.
///
/// Implementations return candidates ordered by ascending cloud cover; an
/// empty vector means no scene matched. Transport failures are reported as
/// [`Error::Upstream`].
pub trait ImageArchive {
    type Scene: SceneHandle;

    fn find(
        &self,
        collection: &str,
        roi: &RegionOfInterest,
        range: &DateRange,
    ) -> Result<Vec<Self::Scene>>;
}

impl<A: ImageArchive + ?Sized> ImageArchive for &A {
    type Scene = A::Scene;

    fn find(
        &self,
        collection: &str,
        roi: &RegionOfInterest,
        range: &DateRange,
    ) -> Result<Vec<Self::Scene>> {
        (**self).find(collection, roi, range)
    }
}

/// Build an [`Error::Upstream`] for a failed band read.
pub fn band_read_error(scene: &str, band: &str, reason: impl fmt::Display) -> Error {
    Error::upstream(format!("reading band '{band}' of scene '{scene}'"), reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_year_is_half_open() {
        let r = DateRange::calendar_year(2021);
        assert!(r.contains_timestamp("2021-01-01T00:00:00Z"));
        assert!(r.contains_timestamp("2021-12-31T23:59:59Z"));
        assert!(!r.contains_timestamp("2022-01-01T00:00:00Z"));
        assert!(!r.contains_timestamp("2020-12-31T10:00:00Z"));
        assert!(!r.contains_timestamp("garbage"));
    }

    #[test]
    fn stac_interval_ends_on_last_day() {
        assert_eq!(
            DateRange::calendar_year(2020).to_stac_interval(),
            "2020-01-01T00:00:00Z/2020-12-31T23:59:59Z"
        );
        let march = DateRange {
            start: (2024, 2, 1),
            end: (2024, 3, 1),
        };
        assert_eq!(
            march.to_stac_interval(),
            "2024-02-01T00:00:00Z/2024-02-29T23:59:59Z"
        );
    }

    #[test]
    fn display_shows_half_open_interval() {
        assert_eq!(
            DateRange::calendar_year(2020).to_string(),
            "[2020-01-01, 2021-01-01)"
        );
    }
}
