//! Error types for the STAC archive.

use thiserror::Error;

/// Errors produced while searching a catalog or fetching assets.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("item {item} has no asset '{asset}'")]
    MissingAsset { item: String, asset: String },

    #[error("cannot decode {href}: {reason}")]
    Decode { href: String, reason: String },

    #[error("region of interest does not overlap item {item}")]
    OutsideScene { item: String },

    #[error("core error: {0}")]
    Core(#[from] verdex_core::Error),
}

impl CloudError {
    /// Report as an archive failure of `operation`.
    pub fn into_upstream(self, operation: impl Into<String>) -> verdex_core::Error {
        verdex_core::Error::upstream(operation, self)
    }
}

/// Result alias for cloud operations.
pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_failures_become_upstream() {
        let err = CloudError::Network("HTTP 503".into()).into_upstream("searching landsat-c2-l2");
        match err {
            verdex_core::Error::Upstream { operation, reason } => {
                assert_eq!(operation, "searching landsat-c2-l2");
                assert!(reason.contains("503"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decode_failures_are_upstream_too() {
        let err = CloudError::Core(verdex_core::Error::Other("truncated strip".into()))
            .into_upstream("reading band 'red'");
        assert!(!err.is_validation());
        assert!(err.to_string().contains("truncated strip"));
    }
}
