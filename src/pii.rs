use std::fmt;

/// A respondent's email, name or phone number on its way into a log field.
///
/// The duplicate checks log every lookup. They record the address or last
/// name as `Pii<&str>`, whose `Debug` and `Display` print `[REDACTED]`, so
/// the event says which field was checked and never what it held.
///
/// # Examples
///
/// ```
/// use survey_intake::Pii;
///
/// let email = Pii::new("juan.delacruz@dswd.gov.ph".to_string());
/// assert_eq!(format!("{}", email), "[REDACTED]");
/// assert_eq!(email.expose(), "juan.delacruz@dswd.gov.ph");
/// ```
pub struct Pii<T> {
    // Private so the only read path is `expose`.
    inner: T,
}

impl<T> Pii<T> {
    /// Wraps a personal value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Reads the wrapped value. Never pass the result to a log macro.
    pub fn expose(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Pii<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Pii<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
