use std::fmt;

/// A wrapper for a raw form value that has not been sanitized yet.
///
/// Every field that crosses the form boundary is wrapped in `Tainted<T>` by
/// [`RawForm`](crate::RawForm). The value cannot be read by code outside this
/// crate; the only way to get at it is through a [`Sanitizer`](crate::Sanitizer),
/// which consumes the wrapper and hands back a [`Verified<T>`](crate::Verified).
///
/// # Examples
///
/// ```
/// use survey_intake::{Sanitizer, HtmlSanitizer, Tainted};
///
/// let raw = Tainted::new("  <b>Dela Cruz</b> ".to_string());
/// let clean = HtmlSanitizer.sanitize(raw);
/// assert_eq!(clean.as_str(), "&lt;b&gt;Dela Cruz&lt;/b&gt;");
/// ```
// Clone is needed: the form hands out copies so the raw map stays intact for
// conditional checks against the raw value.
#[derive(Clone)]
pub struct Tainted<T> {
    // Must remain private. A public field would let raw input reach storage
    // without passing through a sanitizer.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the raw value. Only sanitizers may call this.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }

    /// Borrows the raw value for comparisons that must not depend on
    /// sanitization (conditional-required triggers).
    pub(crate) fn peek(&self) -> &T {
        &self.inner
    }
}

// No Deref, AsRef, Borrow, From<T> or Into<T> here: any of them would let raw
// input bypass the sanitizers.

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tainted_wraps_value() {
        let raw = Tainted::new("<script>".to_string());
        let debug_output = format!("{:?}", raw);

        assert!(debug_output.contains("Tainted"));
        assert!(debug_output.contains("<script>"));
    }

    #[test]
    fn peek_does_not_consume() {
        let raw = Tainted::new("yes".to_string());

        assert_eq!(raw.peek(), "yes");
        assert_eq!(raw.into_inner(), "yes");
    }

    #[test]
    fn clone_keeps_the_raw_value() {
        let first = Tainted::new(vec!["a".to_string()]);
        let second = first.clone();

        assert_eq!(first.into_inner(), second.into_inner());
    }
}
