//! Primitive validators.
//!
//! Stateless predicates over sanitized values. None of them produce messages;
//! the step validators decide what to say when one returns `false`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Dot-atom local part, then one or more DNS labels and an alphabetic TLD.
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$"
    ).unwrap();

    /// Philippine mobile or landline once spaces, dashes and parens are gone.
    static ref PHONE_REGEX: Regex = Regex::new(r"^(?:\+63|0)?[0-9]{10,11}$").unwrap();
}

/// Longest address accepted by SMTP.
const EMAIL_MAX_LEN: usize = 254;
const EMAIL_LOCAL_MAX_LEN: usize = 64;

/// Public mail providers and agency/academic domains accepted verbatim.
pub const ALLOWED_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "yahoo.com.ph",
    "ymail.com",
    "outlook.com",
    "outlook.ph",
    "hotmail.com",
    "live.com",
    "msn.com",
    "icloud.com",
    "me.com",
    "aol.com",
    "protonmail.com",
    "proton.me",
    "zoho.com",
    "gmx.com",
    "mail.com",
    "dswd.gov.ph",
    "up.edu.ph",
    "pup.edu.ph",
    "ust.edu.ph",
    "dlsu.edu.ph",
    "ateneo.edu",
];

/// Domain suffixes accepted for any host beneath them.
pub const ALLOWED_EMAIL_SUFFIXES: &[&str] = &[".gov.ph", ".edu.ph", ".edu", ".ac.ph"];

/// Values that can be checked for presence.
///
/// Scalars are present when their trimmed text is non-empty; sequences are
/// present when they have at least one element.
pub trait Presence {
    /// Returns `true` if the value counts as filled in.
    fn is_present(&self) -> bool;
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        self.as_str().is_present()
    }
}

impl<T> Presence for [T] {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Presence::is_present)
    }
}

/// Returns `true` if the value is filled in.
pub fn validate_required<V: Presence + ?Sized>(value: &V) -> bool {
    value.is_present()
}

/// Returns `true` if `value` is exactly one of `allowed`. No case folding.
pub fn validate_in_list(value: &str, allowed: &[&str]) -> bool {
    allowed.iter().any(|candidate| *candidate == value)
}

/// Returns `true` if `value` has at least `min` characters.
pub fn validate_min_length(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

/// Returns `true` if `value` has at most `max` characters.
pub fn validate_max_length(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// Checks email syntax.
pub fn validate_email(value: &str) -> bool {
    if value.len() > EMAIL_MAX_LEN {
        return false;
    }
    match value.split_once('@') {
        Some((local, _)) if local.len() <= EMAIL_LOCAL_MAX_LEN => EMAIL_REGEX.is_match(value),
        _ => false,
    }
}

/// Checks the email domain against the allow-list.
///
/// The address must contain exactly one `@`. The domain is lower-cased, then
/// it must equal an entry of [`ALLOWED_EMAIL_DOMAINS`] or end with one of
/// [`ALLOWED_EMAIL_SUFFIXES`].
pub fn validate_email_domain(value: &str) -> bool {
    let mut parts = value.split('@');
    let domain = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(domain), None) => domain.to_lowercase(),
        _ => return false,
    };

    ALLOWED_EMAIL_DOMAINS.contains(&domain.as_str())
        || ALLOWED_EMAIL_SUFFIXES
            .iter()
            .any(|suffix| domain.ends_with(suffix))
}

/// Checks a Philippine phone number.
///
/// Spaces, dashes and parentheses are ignored. What remains must be an
/// optional `+63` or `0` prefix followed by 10 or 11 digits.
pub fn validate_phone(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    PHONE_REGEX.is_match(&compact)
}

/// Returns `true` if at least one checkbox was ticked.
pub fn validate_checkbox_required<T>(values: &[T]) -> bool {
    !values.is_empty()
}

/// Returns `true` if every ticked value is one of `allowed`.
pub fn validate_checkbox_values<T: AsRef<str>>(values: &[T], allowed: &[&str]) -> bool {
    values
        .iter()
        .all(|value| validate_in_list(value.as_ref(), allowed))
}
