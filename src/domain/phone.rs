//! Phone normalization and international formatting.
//!
//! Raw upstream phone values carry common artifacts: punctuation, a `00`
//! international prefix, or a single domestic trunk `0`. Those are stripped
//! before the number is parsed and validated against its region.

use phonenumber::{country, Mode};
use thiserror::Error;

/// Failures while formatting a phone number.
///
/// The display strings double as the inline sentinels the pipeline writes
/// into the output when formatting fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// No phone number was provided
    #[error("Phone number not provided")]
    MissingNumber,

    /// The number (or its region) could not be parsed
    #[error("Could not parse the phone number")]
    UnparseableNumber,

    /// The number parsed but is not a plausible, assignable number for the region
    #[error("Invalid phone number")]
    InvalidNumber,
}

/// Format `raw_phone` as an international number using `country_code`
/// (ISO 3166-1 alpha-2) as the default region.
///
/// Normalization order: strip non-digits, drop a leading `00` international
/// prefix, else drop a single leading trunk `0`, then parse. The parsed
/// number must pass the region validity check; skipping validation would let
/// implausible numbers through to the CRM.
pub fn format_phone(raw_phone: &str, country_code: &str) -> Result<String, PhoneError> {
    if raw_phone.is_empty() {
        return Err(PhoneError::MissingNumber);
    }

    let digits = normalize_digits(raw_phone);
    if digits.is_empty() {
        return Err(PhoneError::MissingNumber);
    }

    let region: country::Id = country_code
        .parse()
        .map_err(|_| PhoneError::UnparseableNumber)?;

    let number = phonenumber::parse(Some(region), &digits)
        .map_err(|_| PhoneError::UnparseableNumber)?;

    if !phonenumber::is_valid(&number) {
        return Err(PhoneError::InvalidNumber);
    }

    Ok(number.format().mode(Mode::International).to_string())
}

/// Strip formatting characters and common dialing-prefix artifacts.
fn normalize_digits(raw_phone: &str) -> String {
    let digits: String = raw_phone.chars().filter(char::is_ascii_digit).collect();

    if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest.to_string()
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone_irish_trunk_prefix() {
        let formatted = format_phone("0891234567", "IE").unwrap();
        assert!(
            formatted.starts_with("+353"),
            "expected Irish international format, got {}",
            formatted
        );
    }

    #[test]
    fn test_format_phone_missing() {
        assert_eq!(format_phone("", "IE"), Err(PhoneError::MissingNumber));
        assert_eq!(format_phone("--", "IE"), Err(PhoneError::MissingNumber));
    }

    #[test]
    fn test_format_phone_strips_punctuation() {
        let formatted = format_phone("(089) 123-4567", "IE").unwrap();
        assert!(formatted.starts_with("+353"));
    }

    #[test]
    fn test_format_phone_international_prefix_dropped() {
        // 00-prefixed numbers carry their own country calling code
        let formatted = format_phone("00353891234567", "IE").unwrap();
        assert!(
            formatted.starts_with("+353"),
            "expected Irish number, got {}",
            formatted
        );
    }

    #[test]
    fn test_format_phone_unknown_region() {
        assert_eq!(
            format_phone("0891234567", "Country code not found"),
            Err(PhoneError::UnparseableNumber)
        );
    }

    #[test]
    fn test_format_phone_invalid_for_region() {
        // Too short to be assignable anywhere in IE
        assert!(matches!(
            format_phone("01", "IE"),
            Err(PhoneError::UnparseableNumber) | Err(PhoneError::InvalidNumber)
        ));
    }

    #[test]
    fn test_normalize_digits() {
        assert_eq!(normalize_digits("+1 (555) 123-4567"), "15551234567");
        assert_eq!(normalize_digits("0891234567"), "891234567");
        assert_eq!(normalize_digits("0033612345678"), "33612345678");
        assert_eq!(normalize_digits("891234567"), "891234567");
    }

    #[test]
    fn test_phone_error_sentinels() {
        assert_eq!(
            PhoneError::MissingNumber.to_string(),
            "Phone number not provided"
        );
        assert_eq!(
            PhoneError::UnparseableNumber.to_string(),
            "Could not parse the phone number"
        );
        assert_eq!(PhoneError::InvalidNumber.to_string(), "Invalid phone number");
    }
}
