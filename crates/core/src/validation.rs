//! Free-text field validators.
//!
//! Each validator trims its input and returns the normalized value, or a
//! [`CoreError::Validation`] carrying the hint shown to the user when the
//! same question is asked again.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::CoreError;

/// Hint shown when a date does not match `DD.MM.YYYY`.
pub const DATE_HINT: &str = "Date format: DD.MM.YYYY";

/// Hint shown when a positive integer was expected.
pub const NUMBER_HINT: &str = "Please enter a number greater than 0";

/// Hint shown for a malformed phone number.
pub const PHONE_HINT: &str = "Phone format: +7 999 123-45-67 (10 to 15 digits)";

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

fn date_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{2}\.[0-9]{2}\.[0-9]{4}$").expect("valid date regex"))
}

fn phone_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9 \t()\-]+$").expect("valid phone regex"))
}

/// Validate a `DD.MM.YYYY` calendar date.
///
/// The date is returned exactly as typed (after trimming). There is no
/// range restriction beyond calendar validity.
pub fn validate_date(raw: &str) -> Result<String, CoreError> {
    let s = raw.trim();
    if !date_shape().is_match(s) || NaiveDate::parse_from_str(s, "%d.%m.%Y").is_err() {
        return Err(CoreError::Validation(DATE_HINT.to_string()));
    }
    Ok(s.to_string())
}

/// Validate a strictly positive integer made of ASCII digits only.
pub fn validate_positive_int(raw: &str) -> Result<u32, CoreError> {
    let s = raw.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Validation(NUMBER_HINT.to_string()));
    }
    match s.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CoreError::Validation(NUMBER_HINT.to_string())),
    }
}

/// Validate a phone number and normalize it to an optional leading `+`
/// followed by digits only.
///
/// Spaces, dashes and parentheses are accepted as separators.
pub fn validate_phone(raw: &str) -> Result<String, CoreError> {
    let s = raw.trim();
    if !phone_shape().is_match(s) || s.chars().skip(1).any(|c| c == '+') {
        return Err(CoreError::Validation(PHONE_HINT.to_string()));
    }
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(CoreError::Validation(PHONE_HINT.to_string()));
    }
    if s.starts_with('+') {
        Ok(format!("+{digits}"))
    } else {
        Ok(digits)
    }
}
