//! Pre-flight duplicate checks.
//!
//! These run during step validation so a respondent gets a field message
//! before saving. They are not a lock: two concurrent submissions can both
//! pass them. The store's unique constraint is the real guard, and the flow
//! maps its violations back onto the same messages defined here.

use tracing::debug;

use crate::pii::Pii;
use crate::store::{DuplicateQuery, NameKey, ResponseStore, StoreError, UniqueConstraint};

/// Message attached to `email` when the address was already used.
pub const DUPLICATE_EMAIL_MESSAGE: &str =
    "This email address has already been used to complete the survey.";

/// Message attached to `last_name` when the name identity was already used.
pub const DUPLICATE_NAME_MESSAGE: &str =
    "A completed survey response already exists for this name. If you believe this is an error, please contact the survey administrator.";

impl UniqueConstraint {
    /// Field the duplicate error is reported on.
    pub fn field(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "last_name",
        }
    }

    /// Message reported for the duplicate. Says nothing about the other record.
    pub fn message(self) -> &'static str {
        match self {
            Self::Email => DUPLICATE_EMAIL_MESSAGE,
            Self::Name => DUPLICATE_NAME_MESSAGE,
        }
    }
}

/// Returns `true` if a consented, completed response already uses `email`.
///
/// Matching is exact after trimming and lower-casing. An empty address is
/// never a duplicate.
pub fn is_email_already_used<S>(store: &S, email: &str) -> Result<bool, StoreError>
where
    S: ResponseStore + ?Sized,
{
    if email.trim().is_empty() {
        return Ok(false);
    }
    let used = store.fetch_one(&DuplicateQuery::email(email))?.is_some();
    debug!(email = %Pii::new(email), used, "email uniqueness checked");
    Ok(used)
}

/// Returns `true` if a consented, completed response already has this name
/// identity.
///
/// An absent `middle` or `suffix` only matches a stored absent value. Without
/// both a last and a first name there is nothing to compare, so the answer is
/// `false`.
pub fn is_name_already_used<S>(
    store: &S,
    last: &str,
    first: &str,
    middle: Option<&str>,
    suffix: Option<&str>,
) -> Result<bool, StoreError>
where
    S: ResponseStore + ?Sized,
{
    if last.trim().is_empty() || first.trim().is_empty() {
        return Ok(false);
    }
    let key = NameKey::new(last, first, middle, suffix);
    let used = store.fetch_one(&DuplicateQuery::Name(key))?.is_some();
    debug!(last_name = %Pii::new(last), used, "name uniqueness checked");
    Ok(used)
}
