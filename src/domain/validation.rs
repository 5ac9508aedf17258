//! Stateless input checks.
//!
//! Each input type validates itself through these free functions; there is no
//! shared validator instance.

use regex::Regex;
use thiserror::Error;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
    #[error("email is not a valid address")]
    InvalidEmail,
}

/// Lightweight email sanity check.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

pub(crate) fn min_length(
    field: &'static str,
    value: &str,
    min: usize,
) -> Result<(), ValidationError> {
    require(field, value)?;
    if value.chars().count() < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}

pub(crate) fn email(value: &str) -> Result<(), ValidationError> {
    require("email", value)?;
    if !valid_email(value.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}
