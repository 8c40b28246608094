//! Email extraction from free text.
//!
//! Upstream stores emails inside arbitrary text (`"Jane Doe <jane@x.com> Contact"`),
//! so extraction scans for the first well-formed address rather than validating
//! the whole field.

use once_cell::sync::Lazy;
use regex::Regex;

/// ASCII email pattern: `local-part@domain.tld` with a 2+ letter TLD.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("email pattern is a valid regex")
});

/// Extract the first email address embedded in `text`.
///
/// Returns `None` for empty input or when no address is present; never errors.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// Extract every email address across all inputs, in encounter order,
/// duplicates included.
pub fn extract_all_emails<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .flat_map(|text| {
            EMAIL_PATTERN
                .find_iter(text.as_ref())
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}
