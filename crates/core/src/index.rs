//! Spectral index selector

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported band-ratio indices.
///
/// Five-band formulas use the canonical bands B2 (blue), B3 (green),
/// B4 (red), B5 (near infrared) and B6 (short-wave infrared).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Normalized Difference Vegetation Index, (B5 - B4) / (B5 + B4)
    NDVI,
    /// Normalized Difference Water Index (McFeeters), (B3 - B5) / (B3 + B5)
    NDWI,
    /// Modified NDWI (Xu), (B3 - B6) / (B3 + B6)
    MNDWI,
    /// Enhanced Vegetation Index, 2.5 (B5 - B4) / (B5 + 6 B4 - 7.5 B2)
    EVI,
}

impl IndexType {
    pub const ALL: [IndexType; 4] = [Self::NDVI, Self::NDWI, Self::MNDWI, Self::EVI];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NDVI => "NDVI",
            Self::NDWI => "NDWI",
            Self::MNDWI => "MNDWI",
            Self::EVI => "EVI",
        }
    }

    /// Whether the index has a two-band (green / red / NIR) form usable on
    /// archive scenes.
    pub fn has_two_band_form(&self) -> bool {
        matches!(self, Self::NDVI | Self::NDWI)
    }
}

impl FromStr for IndexType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnsupportedIndex(s.to_string()))
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("NDVI".parse::<IndexType>().unwrap(), IndexType::NDVI);
        assert_eq!(" mndwi ".parse::<IndexType>().unwrap(), IndexType::MNDWI);
        assert_eq!(IndexType::EVI.to_string(), "EVI");
    }

    #[test]
    fn unknown_name_is_validation_error() {
        let err = "FOO".parse::<IndexType>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedIndex(ref s) if s == "FOO"));
        assert!(err.is_validation());
    }

    #[test]
    fn only_ndvi_and_ndwi_have_two_band_forms() {
        let two_band: Vec<_> = IndexType::ALL
            .into_iter()
            .filter(IndexType::has_two_band_form)
            .collect();
        assert_eq!(two_band, vec![IndexType::NDVI, IndexType::NDWI]);
    }
}
