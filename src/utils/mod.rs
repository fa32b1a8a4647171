// Utility functions

use crate::types::*;

/// Validates a value against a constraint and returns an error if it fails
pub fn validate<T, F>(
    value: T,
    constraint: F,
    error_message: impl Into<String>,
) -> NexusResult<T>
where
    F: FnOnce(&T) -> bool,
{
    if constraint(&value) {
        Ok(value)
    } else {
        Err(NexusError::Validation(error_message.into()))
    }
}

/// Validates a string against common constraints
pub struct StringValidator;

impl StringValidator {
    /// Validates that a string contains something other than whitespace
    pub fn not_blank(value: impl Into<String>, param_name: &str) -> NexusResult<String> {
        let value = value.into();
        validate(
            value,
            |s| !s.trim().is_empty(),
            format!("{} cannot be blank", param_name),
        )
    }

    /// Validates that a string has a maximum length
    pub fn max_length(
        value: impl Into<String>,
        max_length: usize,
        param_name: &str,
    ) -> NexusResult<String> {
        let value = value.into();
        validate(
            value,
            |s| s.len() <= max_length,
            format!("{} must be at most {} characters", param_name, max_length),
        )
    }

    /// Validates a storage or queue name: ASCII letters, digits, `-`, `_` and `.`,
    /// at most 63 characters and not only dots
    pub fn entity_name(value: impl Into<String>, param_name: &str) -> NexusResult<String> {
        let value = Self::not_blank(value, param_name)?;
        let value = Self::max_length(value, 63, param_name)?;
        let value = validate(
            value,
            |s| s.chars().any(|c| c != '.'),
            format!("{} cannot consist only of dots", param_name),
        )?;
        validate(
            value,
            |s| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'),
            format!("{} may only contain letters, digits, '-', '_' and '.'", param_name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_name_rules() {
        assert!(StringValidator::entity_name("orders-queue", "queue").is_ok());
        assert!(StringValidator::entity_name("report.txt", "file").is_ok());
        assert!(StringValidator::entity_name("nightly_jobs", "queue").is_ok());
        assert!(StringValidator::entity_name("..", "directory").is_err());
        assert!(StringValidator::entity_name("  ", "queue").is_err());
        assert!(StringValidator::entity_name("a/b", "queue").is_err());
        assert!(StringValidator::entity_name("x".repeat(64), "queue").is_err());
    }
}
