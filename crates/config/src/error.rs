// crates/config/src/error.rs
//! Error types for the configuration system

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from loading or saving the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system step failed; `action` names the step
    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config file {} is empty", .0.display())]
    Empty(PathBuf),

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Refused to save a config that fails validation
    #[error("Invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// No platform config directory, or a config path without a parent
    #[error("No config directory: {0}")]
    NoConfigDir(&'static str),
}

impl ConfigError {
    /// Maps an I/O error on `path` during `action`
    pub(crate) fn io(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A config field with an unusable value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path such as `url.min_hash_length`
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
