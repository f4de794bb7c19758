//! Error types for verdex

use thiserror::Error;

/// Main error type for verdex operations.
///
/// Validation variants reject a request before any computation starts.
/// `Upstream` marks a failure of the remote image archive and aborts the
/// whole time-series request.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Geotransform of band {band} differs from the reference band")]
    TransformMismatch { band: usize },

    #[error("At least {required} input bands are required (B2-B6), got {got}")]
    InsufficientBands { required: usize, got: usize },

    #[error("Unsupported index type: {0}")]
    UnsupportedIndex(String),

    #[error("Invalid year range: start year {start} is after end year {end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Image archive failure during {operation}: {reason}")]
    Upstream { operation: String, reason: String },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an archive client failure.
    pub fn upstream(operation: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Upstream {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error rejects the request up front (bad bands, index or
    /// year range) rather than failing during computation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InsufficientBands { .. }
                | Error::UnsupportedIndex(_)
                | Error::InvalidYearRange { .. }
                | Error::InvalidParameter { .. }
                | Error::SizeMismatch { .. }
                | Error::TransformMismatch { .. }
        )
    }
}

/// Result type alias for verdex operations
pub type Result<T> = std::result::Result<T, Error>;
