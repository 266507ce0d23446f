// crates/rison/src/error.rs
//! Error types for rison parsing

use thiserror::Error;

/// Result type for rison operations
pub type RisonResult<T> = Result<T, RisonError>;

/// Errors that can occur while parsing rison
#[derive(Debug, Error)]
pub enum RisonError {
    /// Malformed input at a byte offset
    #[error("Rison syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },

    /// Input ended in the middle of a value
    #[error("Unexpected end of rison input")]
    UnexpectedEnd,

    /// Conversion between JSON and a typed value failed
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RisonError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        RisonError::Syntax {
            position,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = RisonError::syntax(4, "expected ':'");
        assert_eq!(err.to_string(), "Rison syntax error at 4: expected ':'");
    }

    #[test]
    fn test_unexpected_end_display() {
        assert!(RisonError::UnexpectedEnd.to_string().contains("end"));
    }
}
