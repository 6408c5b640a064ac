//! Field-level input rules shared by booking intake and settings updates.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)] // Pattern is a compile-time literal.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

#[allow(clippy::expect_used)] // Pattern is a compile-time literal.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()./\-]{7,20}$").expect("valid phone regex"));

#[allow(clippy::expect_used)] // Pattern is a compile-time literal.
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(<\s*script|<\s*iframe|javascript\s*:|\bon[a-z]+\s*=)")
        .expect("valid script regex")
});

/// Simplified RFC 5322 address check (local part, `@`, dotted domain).
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL_RE.is_match(value)
}

/// Phone numbers: 7 to 20 characters of digits and common separators.
#[must_use]
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value) && value.chars().filter(char::is_ascii_digit).count() >= 6
}

/// Whether free text contains markup or handlers that could execute script.
#[must_use]
pub fn contains_script(value: &str) -> bool {
    SCRIPT_RE.is_match(value)
}

/// Whether the value carries control characters such as CR or LF.
#[must_use]
pub fn contains_control(value: &str) -> bool {
    value.chars().any(char::is_control)
}

/// Character count, not byte length.
#[must_use]
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}
