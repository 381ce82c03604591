//! Common validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("valid username regex"));

/// Common validation functions
pub mod validators {
    use super::{EMAIL_REGEX, URL_REGEX, USERNAME_REGEX};

    /// Minimum password length accepted at registration and reset
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// Check if a string is not empty
    pub fn not_empty(value: &str) -> bool {
        !value.trim().is_empty()
    }

    pub fn is_email(value: &str) -> bool {
        value.len() <= 254 && EMAIL_REGEX.is_match(value)
    }

    /// http(s) URL with a host part
    pub fn is_url(value: &str) -> bool {
        URL_REGEX.is_match(value)
    }

    /// 3 to 32 ASCII letters, digits or underscores
    pub fn is_username(value: &str) -> bool {
        USERNAME_REGEX.is_match(value)
    }

    /// At least one letter and one digit, minimum length
    pub fn is_strong_password(value: &str) -> bool {
        value.chars().count() >= MIN_PASSWORD_LENGTH
            && value.chars().any(|c| c.is_ascii_alphabetic())
            && value.chars().any(|c| c.is_ascii_digit())
    }
}
