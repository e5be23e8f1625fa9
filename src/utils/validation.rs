use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::{AppError, FieldErrors};
use crate::models::employee::Country;

/// Uppercase ASCII letters and spaces, at least one character.
pub static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z ]+$").expect("name pattern is a valid regex"));

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn validate_country(country: &str) -> Result<(), ValidationError> {
    country
        .parse::<Country>()
        .map(|_| ())
        .map_err(|_| error_with_message("in", "El país debe ser Colombia o Estados Unidos."))
}

pub fn validate_entry_date(value: &str) -> Result<(), ValidationError> {
    match parse_entry_date(value) {
        Some(_) => Ok(()),
        None => Err(error_with_message("date", "La fecha de ingreso no es una fecha válida.")),
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping only its date.
pub fn parse_entry_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Trims the value, mapping blank input to `None` when `drop_blank` is set.
pub fn normalize_field(value: Option<String>, drop_blank: bool) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if drop_blank && trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn collect_field_errors(err: &ValidationErrors) -> FieldErrors {
    err.field_errors()
        .iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => e.code.to_string(),
                })
                .collect::<Vec<_>>();
            (field.to_string(), messages)
        })
        .collect()
}

/// Runs the derived validators and folds the result into a field-error map.
pub fn validate_payload<T: Validate>(payload: &T) -> FieldErrors {
    match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(err) => collect_field_errors(&err),
    }
}

pub fn add_field_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors.entry(field.to_string()).or_default().push(message.to_string());
}

pub fn into_result(message: &str, errors: FieldErrors) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(message, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_pattern_allows_uppercase_and_spaces_only() {
        assert!(NAME_PATTERN.is_match("JUAN"));
        assert!(NAME_PATTERN.is_match("MARIA JOSE"));
        assert!(!NAME_PATTERN.is_match("Juan"));
        assert!(!NAME_PATTERN.is_match("JOSÉ"));
        assert!(!NAME_PATTERN.is_match("JUAN2"));
        assert!(!NAME_PATTERN.is_match(""));
    }

    #[test]
    fn entry_date_formats() {
        assert_eq!(parse_entry_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            parse_entry_date("2024-03-01T08:30:00-05:00"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(parse_entry_date("2024-02-30").is_none());
        assert!(parse_entry_date("yesterday").is_none());
    }

    #[test]
    fn normalize_trims_and_drops_blank() {
        assert_eq!(normalize_field(Some("  JUAN ".into()), true), Some("JUAN".into()));
        assert_eq!(normalize_field(Some("   ".into()), true), None);
        assert_eq!(normalize_field(Some("   ".into()), false), Some(String::new()));
        assert_eq!(normalize_field(None, false), None);
    }

    #[test]
    fn country_validator_messages() {
        assert!(validate_country("Colombia").is_ok());
        let err = validate_country("Peru").unwrap_err();
        assert_eq!(err.code, "in");
        assert!(err.message.is_some());
    }
}
