//! Local input checks that run before any network round trip.

/// A required field was empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} must not be empty", self.field)
    }
}

impl std::error::Error for ValidationError {}

/// Returns the trimmed value, or an error naming `field` if nothing is left.
pub fn require_non_empty<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError { field });
    }
    Ok(trimmed)
}
