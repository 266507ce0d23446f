// crates/url-state/src/error.rs
//! Error types for URL state storage

use statesync_core::CoreError;
use statesync_rison::RisonError;
use thiserror::Error;

/// Result type for URL state operations
pub type UrlStateResult<T> = Result<T, UrlStateError>;

/// Errors that can occur while storing or reading state in the URL
#[derive(Debug, Error)]
pub enum UrlStateError {
    /// Session storage cannot hold the item, even after eviction
    #[error("Session storage quota exceeded: item needs {needed} bytes, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    /// The URL parameter does not hold valid rison
    #[error("Malformed state in URL: {0}")]
    Rison(#[from] RisonError),

    /// The decoded value is not a state object
    #[error("Invalid state shape: {0}")]
    Shape(#[from] CoreError),

    /// JSON serialization of hashed state failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_error_display() {
        let err = UrlStateError::QuotaExceeded {
            needed: 2048,
            quota: 1024,
        };
        assert!(err.to_string().contains("2048"));
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn test_rison_error_conversion() {
        let rison_err = statesync_rison::from_str("(").unwrap_err();
        let err = UrlStateError::from(rison_err);
        assert!(matches!(err, UrlStateError::Rison(_)));
    }
}
