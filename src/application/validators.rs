/// Validation failure for a single input field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Catalog input validation rules. Rejection happens before any storage
/// access, so a failed create is never partially applied.
pub struct CatalogValidator;

impl CatalogValidator {
    pub const NAME_MIN: usize = 3;
    pub const NAME_MAX: usize = 100;

    /// Validates a permission or role name: 3 to 100 characters.
    pub fn validate_name(name: &str) -> Result<(), FieldError> {
        let length = name.chars().count();
        if !(Self::NAME_MIN..=Self::NAME_MAX).contains(&length) {
            return Err(FieldError::new(
                "name",
                format!(
                    "must be between {} and {} characters",
                    Self::NAME_MIN,
                    Self::NAME_MAX
                ),
            ));
        }
        Ok(())
    }

    /// Validates a description: required, non-blank.
    pub fn validate_description(description: &str) -> Result<(), FieldError> {
        if description.trim().is_empty() {
            return Err(FieldError::new("description", "must not be empty"));
        }
        Ok(())
    }

    /// Validates a category: required, non-blank.
    pub fn validate_category(category: &str) -> Result<(), FieldError> {
        if category.trim().is_empty() {
            return Err(FieldError::new("category", "must not be empty"));
        }
        Ok(())
    }
}
