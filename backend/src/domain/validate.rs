//! Self-validation capability for request DTOs.
//!
//! The RPC validator interceptor calls [`Validate::validate`] on every
//! request before it reaches a service. Requests without constraints rely on
//! the default implementation, which always succeeds.

/// Reason a request failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    /// Describe a rejected field or combination of fields.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<super::user::UserValidationError> for ValidationError {
    fn from(value: super::user::UserValidationError) -> Self {
        Self(value.to_string())
    }
}

/// Capability exposed by requests that can check their own fields.
pub trait Validate {
    /// Check field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first violated constraint.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Reject an empty or whitespace-only field.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming `field`.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Reject a field longer than `max` characters.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming `field`.
pub fn require_max_chars(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        Err(ValidationError::new(format!(
            "{field} must be at most {max} characters"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    struct Unconstrained;

    impl Validate for Unconstrained {}

    #[rstest]
    fn default_implementation_accepts() {
        assert_eq!(Unconstrained.validate(), Ok(()));
    }

    #[rstest]
    #[case("", false)]
    #[case("  ", false)]
    #[case("x", true)]
    fn non_blank(#[case] value: &str, #[case] ok: bool) {
        assert_eq!(require_non_blank("name", value).is_ok(), ok);
    }

    #[rstest]
    fn max_chars_counts_characters_not_bytes() {
        assert!(require_max_chars("name", "ééé", 3).is_ok());
        assert_eq!(
            require_max_chars("name", "abcd", 3),
            Err(ValidationError::new("name must be at most 3 characters"))
        );
    }
}
