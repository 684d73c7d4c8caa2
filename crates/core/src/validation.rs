//! Input validation utilities.
//!
//! Shared checks applied by resource `validate` implementations before anything reaches the
//! store.

use crate::{EhrError, EhrResult};

/// Maximum length of short free-text columns (units, identifiers, descriptions).
pub const MAX_TEXT_LEN: usize = 255;

/// Validates that a measured value is a finite number.
///
/// # Errors
///
/// Returns `EhrError::InvalidInput` naming `field` for NaN or infinite values.
pub fn validate_finite(field: &str, value: f64) -> EhrResult<()> {
    if !value.is_finite() {
        return Err(EhrError::InvalidInput(format!(
            "{field} must be a finite number"
        )));
    }
    Ok(())
}

/// Validates a pair of optional reference bounds.
///
/// Each present bound must be finite, and when both are present `low` must not exceed
/// `high`.
pub fn validate_bounds(low: Option<f64>, high: Option<f64>) -> EhrResult<()> {
    if let Some(low) = low {
        validate_finite("low bound", low)?;
    }
    if let Some(high) = high {
        validate_finite("high bound", high)?;
    }
    if let (Some(low), Some(high)) = (low, high) {
        if low > high {
            return Err(EhrError::InvalidInput(format!(
                "low bound {low} exceeds high bound {high}"
            )));
        }
    }
    Ok(())
}

/// Validates the length of a free-text column.
pub fn validate_text_len(field: &str, value: &str) -> EhrResult<()> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(EhrError::InvalidInput(format!(
            "{field} exceeds maximum length of {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

/// Optional variant of [`validate_text_len`].
pub fn validate_optional_text_len(field: &str, value: Option<&str>) -> EhrResult<()> {
    value.map_or(Ok(()), |v| validate_text_len(field, v))
}
