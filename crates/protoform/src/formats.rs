//! String format predicates
//!
//! The checks backing [`crate::validators::Format`]. Each compiles its regex
//! once, on first use, and can also be called directly when a schema is not
//! involved.
//!
//! The patterns are deliberately pragmatic: they reject obvious garbage
//! without attempting full RFC conformance.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-4[0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$").unwrap()
});

/// Whether the string looks like an email address
///
/// ```
/// use protoform::formats::is_email;
///
/// assert!(is_email("user@example.com"));
/// assert!(!is_email("invalid-email"));
/// ```
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Whether the string is an http or https URL
pub fn is_url(value: &str) -> bool {
    URL_REGEX.is_match(value)
}

/// Whether the string is a hyphenated v4 UUID
pub fn is_uuid(value: &str) -> bool {
    UUID_REGEX.is_match(value)
}
