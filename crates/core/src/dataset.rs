//! Dataset naming rules.

use crate::error::CoreError;

/// Maximum dataset name length, in characters.
pub const MAX_NAME_LENGTH: usize = 120;

/// Trim and validate a dataset name, returning the stored form.
pub fn validate_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Dataset name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Dataset name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}
