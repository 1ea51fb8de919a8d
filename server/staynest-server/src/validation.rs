//! Request validation utilities for consistent validation across handlers.

use crate::error::ApiError;

/// Trait for validating request payloads.
///
/// Implemented by all mutating request types so field checks run before any
/// service call and produce consistent error messages.
pub trait RequestValidation {
    /// Returns `Ok(())` if validation passes, or `Err(ApiError)` with a
    /// validation error message if it fails.
    fn validate(&self) -> Result<(), ApiError>;
}

/// Validate a field with a custom predicate.
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Validate that a string field is non-empty after trimming.
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Validate string length bounds.
#[macro_export]
macro_rules! validate_length {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        let len = $field.len();
        validate_field!($field, len >= $min && len <= $max, $message);
    };
}

/// Basic email shape check; full ownership is proven elsewhere.
#[macro_export]
macro_rules! validate_email {
    ($field:expr, $message:expr) => {
        validate_field!($field, $field.contains('@') && $field.contains('.'), $message);
    };
}
