//! Input validation helpers shared by the services.
//!
//! Each helper returns [`ServiceError::Validation`] naming the offending
//! field, so callers can surface the message as-is.

use chrono::NaiveDate;

use crate::error::{ServiceError, ServiceResult};

/// Longest free-text value accepted for short fields (names, types).
pub const MAX_NAME_LEN: usize = 100;

/// Longest free-text value accepted for notes.
pub const MAX_NOTES_LEN: usize = 4000;

/// Trimmed, non-empty, bounded text.
pub fn required_text(field: &str, value: &str, max_len: usize) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(ServiceError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional text: blank becomes `None`, otherwise bounded like [`required_text`].
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> ServiceResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max_len).map(Some),
    }
}

/// Minimal structural email check: one `@`, non-empty local part, dotted domain.
pub fn email(field: &str, value: &str) -> ServiceResult<String> {
    let value = required_text(field, value, 254)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ServiceError::Validation(format!(
            "{} is not a valid email address",
            field
        )));
    }
    Ok(value)
}

/// Money amounts are whole cents and never negative.
pub fn cents(field: &str, value: Option<i64>) -> ServiceResult<Option<i64>> {
    match value {
        Some(v) if v < 0 => Err(ServiceError::Validation(format!(
            "{} cannot be negative",
            field
        ))),
        other => Ok(other),
    }
}

/// Inclusive numeric range check for optional measurements. NaN is outside
/// every range.
pub fn in_range<T>(field: &str, value: Option<T>, min: T, max: T) -> ServiceResult<Option<T>>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(ServiceError::Validation(format!(
            "{} must be between {} and {}",
            field, min, max
        ))),
        other => Ok(other),
    }
}

/// Dates that cannot lie in the future relative to `today`.
pub fn not_in_future(
    field: &str,
    value: Option<NaiveDate>,
    today: NaiveDate,
) -> ServiceResult<Option<NaiveDate>> {
    match value {
        Some(d) if d > today => Err(ServiceError::Validation(format!(
            "{} cannot be in the future",
            field
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Max ", 10).unwrap(), "Max");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        assert_eq!(optional_text("breed", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("breed", None, 10).unwrap(), None);
        assert_eq!(optional_text("breed", Some("Lab"), 10).unwrap(), Some("Lab".into()));
    }

    #[test]
    fn test_email() {
        assert!(email("email", "ana@example.com").is_ok());
        for bad in ["ana", "@example.com", "ana@example", "ana@@example.com", "a b@example.com"] {
            assert!(email("email", bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_numeric_guards() {
        assert!(cents("cost", Some(-1)).is_err());
        assert_eq!(cents("cost", Some(0)).unwrap(), Some(0));
        assert!(in_range("temp", Some(50.0), 25.0, 45.0).is_err());
        assert_eq!(in_range("rate", Some(80), 1, 400).unwrap(), Some(80));
        assert_eq!(in_range("temp", Some(45.0), 25.0, 45.0).unwrap(), Some(45.0));
    }

    #[test]
    fn test_in_range_rejects_non_finite() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(in_range("temp", Some(v), 25.0, 45.0).is_err(), "{} accepted", v);
        }
    }

    #[test]
    fn test_not_in_future() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(not_in_future("dob", NaiveDate::from_ymd_opt(2024, 6, 2), today).is_err());
        assert!(not_in_future("dob", Some(today), today).is_ok());
    }
}
