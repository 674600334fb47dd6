//! Request validation utilities for consistent validation across handlers
//!
//! Handlers call [`RequestValidation::validate`] before touching the
//! configuration, so a malformed request never costs a version bump.

use crate::error::ApiError;

/// Trait for validating request payloads
pub trait RequestValidation {
    /// Validates the request and returns an error if validation fails
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] naming the first rule that failed.
    fn validate(&self) -> Result<(), ApiError>;
}

/// Macro for validating fields with custom predicates
///
/// # Usage
///
/// ```rust,ignore
/// validate_field!(self.step_order, self.step_order.map_or(true, |o| o > 0), "Step order must be positive");
/// ```
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Macro for validating required fields (non-blank strings)
///
/// # Usage
///
/// ```rust,ignore
/// validate_required!(self.step_name, "Step name is required");
/// ```
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Macro for validating UUID fields (non-nil)
///
/// # Usage
///
/// ```rust,ignore
/// validate_uuid!(self.field_id, "Field ID is required");
/// ```
#[macro_export]
macro_rules! validate_uuid {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, !$field.is_nil(), $message);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct RenameRequest {
        step_id: Uuid,
        step_name: String,
        step_order: Option<i32>,
    }

    impl RequestValidation for RenameRequest {
        fn validate(&self) -> Result<(), ApiError> {
            validate_uuid!(self.step_id, "Step ID is required");
            validate_required!(self.step_name, "Step name is required");
            validate_field!(
                self.step_order,
                self.step_order.map_or(true, |order| order > 0),
                "Step order must be positive"
            );
            Ok(())
        }
    }

    fn request(step_id: Uuid, step_name: &str, step_order: Option<i32>) -> RenameRequest {
        RenameRequest {
            step_id,
            step_name: step_name.to_string(),
            step_order,
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(request(Uuid::new_v4(), "Consent", Some(2)).validate().is_ok());
        assert!(request(Uuid::new_v4(), "Consent", None).validate().is_ok());
    }

    #[test]
    fn test_validation_blank_name() {
        let err = request(Uuid::new_v4(), "   ", None).validate().unwrap_err();
        assert_eq!(err.public_message(), "Step name is required");
    }

    #[test]
    fn test_validation_nil_id() {
        assert!(request(Uuid::nil(), "Consent", None).validate().is_err());
    }

    #[test]
    fn test_validation_bad_order() {
        assert!(request(Uuid::new_v4(), "Consent", Some(0)).validate().is_err());
    }
}
