// crates/config/src/validation.rs
//! Validation for configuration values
//!
//! Each config section implements [`ConfigSection`], which bundles its
//! validation and merge rules.

pub use crate::error::ValidationError;

/// A configuration section that can validate and merge itself
pub trait ConfigSection: Default {
    /// Validates the section
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another section into this one, preferring values from `other`
    fn merge(&mut self, other: Self);

    /// Section name used in field paths and env var names
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a numeric value is within a range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::new(
                field,
                format!("must be between {} and {}, got {}", min, max, value),
            ))
        } else {
            Ok(())
        }
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
