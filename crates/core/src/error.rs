// crates/core/src/error.rs
//! Error types for state conversion

use thiserror::Error;

/// Result type for core state operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while turning arbitrary values into state
#[derive(Debug, Error)]
pub enum CoreError {
    /// The value is valid JSON but not an object
    #[error("State must be an object, got {0}")]
    NotAnObject(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_an_object_display() {
        let err = CoreError::NotAnObject("array".to_string());
        assert!(err.to_string().contains("must be an object"));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CoreError::from(serde_err);
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
