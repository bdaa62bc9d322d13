use serde::{Serialize, Serializer};

/// A value that has been through exactly one sanitizer.
///
/// `Verified<T>` is what the step validators store in
/// [`ValidationResult::sanitized`](crate::ValidationResult::sanitized) and what
/// a [`ResponseStore`](crate::ResponseStore) accepts for persistence. Raw and
/// sanitized values are distinct types: sanitizers take [`Tainted<T>`](crate::Tainted)
/// and return `Verified<T>`, so a sanitized value cannot be fed back into a
/// sanitizer and double-encoded.
///
/// # Construction Invariants
///
/// There is no public constructor and no `From<T>` impl. Construction goes
/// through `new_unchecked`, which is `pub(crate)` and only called by sanitizer
/// implementations and by [`ValidationResult::into_verified`](crate::ValidationResult::into_verified).
///
/// ```compile_fail
/// use survey_intake::Verified;
///
/// let forged = Verified::new("data".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value without sanitizing it. Callers must have sanitized or
    /// validated the value already.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the sanitized value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl Verified<String> {
    /// Borrows the sanitized string.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns `true` if the sanitized string is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

// Serializes as the bare inner value so stored rows carry no wrapper.
impl<T: Serialize> Serialize for Verified<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}
