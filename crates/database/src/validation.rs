//! Input validation shared by the stores.

use chrono::NaiveDate;
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty value where one is required.
    #[error("{0} is required")]
    Empty(String),
    /// Value too long.
    #[error("{field} is too long ({actual} chars, max {max})")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Identifier that is not a positive integer.
    #[error("{0} is invalid")]
    InvalidId(String),
    /// Status other than `done` / `undone`.
    #[error("status must be 'done' or 'undone', got '{0}'")]
    InvalidStatus(String),
    /// Date not in `YYYY-MM-DD` form.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Maximum allowed length for a caller-supplied family code.
pub const MAX_FAMILY_CODE_LENGTH: usize = 64;

fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    Ok(value)
}

/// Validate a profile name, returning it trimmed.
///
/// Only emptiness is checked; names are stored at any length.
pub fn validate_name(name: &str) -> Result<&str, ValidationError> {
    non_empty("name", name)
}

/// Validate an explicit family code, returning it trimmed.
pub fn validate_family_code(code: &str) -> Result<&str, ValidationError> {
    let value = non_empty("familyCode", code)?;
    let max = MAX_FAMILY_CODE_LENGTH;

    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: "familyCode".to_string(),
            max,
            actual,
        });
    }

    Ok(value)
}

/// Validate an anonymous caller token.
pub fn validate_caller_id(caller_id: &str) -> Result<&str, ValidationError> {
    non_empty("user_id", caller_id)
}

/// Require a positive integer identifier.
pub fn validate_id(field: &str, id: i64) -> Result<i64, ValidationError> {
    if id <= 0 {
        return Err(ValidationError::InvalidId(field.to_string()));
    }
    Ok(id)
}

/// Parse an identifier received as text.
pub fn parse_id(field: &str, raw: &str) -> Result<i64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    let id = raw
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidId(field.to_string()))?;
    validate_id(field, id)
}

/// Validate a calendar date and return it in canonical `YYYY-MM-DD` form.
pub fn validate_record_date(raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Empty("record_date".to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  王阿姨 ").unwrap(), "王阿姨");
        assert!(matches!(validate_name(""), Err(ValidationError::Empty(_))));
        assert!(matches!(validate_name("   "), Err(ValidationError::Empty(_))));

        let long_name = "a".repeat(500);
        assert_eq!(validate_name(&long_name).unwrap(), long_name);
    }

    #[test]
    fn test_validate_family_code() {
        assert_eq!(validate_family_code(" SHARED-1 ").unwrap(), "SHARED-1");
        assert!(matches!(
            validate_family_code(""),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_family_code(&"C".repeat(MAX_FAMILY_CODE_LENGTH + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_caller_id_has_no_length_cap() {
        let token = "t".repeat(4096);
        assert_eq!(validate_caller_id(&token).unwrap(), token);
        assert!(matches!(
            validate_caller_id("  "),
            Err(ValidationError::Empty(_))
        ));
    }

    #[test]
    fn test_ids() {
        assert_eq!(validate_id("id", 3).unwrap(), 3);
        assert!(validate_id("id", 0).is_err());
        assert!(validate_id("id", -4).is_err());

        assert_eq!(parse_id("elderly_id", " 12 ").unwrap(), 12);
        assert!(matches!(
            parse_id("elderly_id", ""),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            parse_id("elderly_id", "abc"),
            Err(ValidationError::InvalidId(_))
        ));
        assert!(matches!(
            parse_id("elderly_id", "-1"),
            Err(ValidationError::InvalidId(_))
        ));
    }

    #[test]
    fn test_record_date() {
        assert_eq!(validate_record_date("2024-01-01").unwrap(), "2024-01-01");
        assert_eq!(validate_record_date("2024-1-5").unwrap(), "2024-01-05");
        assert!(matches!(
            validate_record_date("2024-02-30"),
            Err(ValidationError::InvalidDate(_))
        ));
        assert!(matches!(
            validate_record_date("yesterday"),
            Err(ValidationError::InvalidDate(_))
        ));
        assert!(matches!(
            validate_record_date(""),
            Err(ValidationError::Empty(_))
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::Empty("name".to_string());
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvalidStatus("maybe".to_string());
        assert_eq!(
            err.to_string(),
            "status must be 'done' or 'undone', got 'maybe'"
        );
    }
}
