//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    static ref RESOLUTION_RE: Regex = Regex::new(r"^[1-9][0-9]{1,4}x[1-9][0-9]{1,4}$").unwrap();
}

/// Validates a caller-chosen identifier (screen ids): alphanumerics, hyphens
/// and underscores only.
pub fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_identifier");
        err.message = Some(
            "Identifier may only contain alphanumeric characters, hyphens, and underscores".into(),
        );
        Err(err)
    }
}

/// Validates a `WIDTHxHEIGHT` resolution string such as `1920x1080`.
pub fn validate_resolution(value: &str) -> Result<(), ValidationError> {
    if RESOLUTION_RE.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_resolution");
        err.message = Some("Resolution must look like 1920x1080".into());
        Err(err)
    }
}

/// Validates that a string is not blank after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}
