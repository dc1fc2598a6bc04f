//! Shared range-checking helpers.
//!
//! Entity constructors and the scorer use these so every range violation
//! produces the same `CoreError::Validation` shape naming the field.

use crate::error::CoreError;

/// Validate that a value falls within `[0.0, 1.0]`.
pub fn validate_unit_range(value: f64, field: &str) -> Result<(), CoreError> {
    validate_range(value, 0.0, 1.0, field)
}

/// Validate that a value is a percentage in `[0.0, 100.0]`.
pub fn validate_percentage(value: f64, field: &str) -> Result<(), CoreError> {
    validate_range(value, 0.0, 100.0, field)
}

/// Validate that a finite value falls within `[min, max]`.
pub fn validate_range(value: f64, min: f64, max: f64, field: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < min || value > max {
        return Err(CoreError::validation(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ));
    }
    Ok(())
}

/// Validate that an integer rating falls within `[1, max_level]`.
pub fn validate_level(level: u8, max_level: u8, field: &str) -> Result<(), CoreError> {
    if level < 1 || level > max_level {
        return Err(CoreError::validation(
            field,
            format!("must be between 1 and {max_level}, got {level}"),
        ));
    }
    Ok(())
}
