use crate::{Tainted, Verified};

/// Trait for turning raw form values into sanitized values.
///
/// Sanitizers in this crate never reject input: they normalize it. Rejection is
/// the job of the validators, which run over the sanitized value. Because
/// `sanitize` consumes a [`Tainted<T>`] and returns a [`Verified<T>`], every
/// stored value has been sanitized exactly once.
///
/// # Invariants
///
/// Implementations MUST:
/// - Only call `Verified::new_unchecked` on the normalized value
/// - Be total: every input maps to some output
///
/// ```compile_fail
/// use survey_intake::{HtmlSanitizer, Sanitizer, Tainted};
///
/// let once = HtmlSanitizer.sanitize(Tainted::new("a&b".to_string()));
/// // A verified value is not tainted, so it cannot be sanitized twice.
/// let twice = HtmlSanitizer.sanitize(once);
/// ```
pub trait Sanitizer<T> {
    /// Normalizes a raw value.
    fn sanitize(&self, input: Tainted<T>) -> Verified<T>;
}

/// Trims and HTML-encodes free text.
///
/// Encodes `&`, `<`, `>`, `"` and `'` so stored values are inert when a page
/// later renders them without escaping. Encoding is not idempotent (`&amp;`
/// becomes `&amp;amp;`), which is why the input type is `Tainted<String>`.
///
/// # Examples
///
/// ```
/// use survey_intake::{HtmlSanitizer, Sanitizer, Tainted};
///
/// let clean = HtmlSanitizer.sanitize(Tainted::new(" O'Brien & Sons ".to_string()));
/// assert_eq!(clean.as_str(), "O&#039;Brien &amp; Sons");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl HtmlSanitizer {
    fn encode(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#039;"),
                other => out.push(other),
            }
        }
        out
    }
}

impl Sanitizer<String> for HtmlSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Verified<String> {
        let raw = input.into_inner();
        Verified::new_unchecked(Self::encode(raw.trim()))
    }
}

/// Trims an email address and strips characters that cannot appear in one.
///
/// Keeps ASCII letters, digits and ``!#$%&'*+-=?^_`{|}~@.[]``. Nothing is
/// encoded, so `@`, `.` and `+` survive untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailSanitizer;

impl EmailSanitizer {
    fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(c)
    }
}

impl Sanitizer<String> for EmailSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Verified<String> {
        let raw = input.into_inner();
        let cleaned = raw.trim().chars().filter(|c| Self::is_allowed(*c)).collect();
        Verified::new_unchecked(cleaned)
    }
}

/// Trims a phone number and keeps only digits, `+`, `-` and whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneSanitizer;

impl Sanitizer<String> for PhoneSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Verified<String> {
        let raw = input.into_inner();
        let cleaned = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+' || *c == '-' || c.is_whitespace())
            .collect();
        Verified::new_unchecked(cleaned)
    }
}

/// Sanitizes every element of a multi-value field with [`HtmlSanitizer`]
/// rules and drops elements that end up blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSanitizer;

impl Sanitizer<Vec<String>> for ListSanitizer {
    fn sanitize(&self, input: Tainted<Vec<String>>) -> Verified<Vec<String>> {
        let items = input
            .into_inner()
            .iter()
            .map(|item| HtmlSanitizer::encode(item.trim()))
            .filter(|item| !item.is_empty())
            .collect();
        Verified::new_unchecked(items)
    }
}

/// Sanitizes an optional free-text value. Absent input becomes `""`.
pub fn sanitize_string(input: Option<Tainted<String>>) -> Verified<String> {
    match input {
        Some(raw) => HtmlSanitizer.sanitize(raw),
        None => Verified::new_unchecked(String::new()),
    }
}

/// Sanitizes an optional email value. Absent input becomes `""`.
pub fn sanitize_email(input: Option<Tainted<String>>) -> Verified<String> {
    match input {
        Some(raw) => EmailSanitizer.sanitize(raw),
        None => Verified::new_unchecked(String::new()),
    }
}

/// Sanitizes an optional phone value. Absent input becomes `""`.
pub fn sanitize_phone(input: Option<Tainted<String>>) -> Verified<String> {
    match input {
        Some(raw) => PhoneSanitizer.sanitize(raw),
        None => Verified::new_unchecked(String::new()),
    }
}

/// Sanitizes a multi-value field.
pub fn sanitize_list(input: Tainted<Vec<String>>) -> Verified<Vec<String>> {
    ListSanitizer.sanitize(input)
}
