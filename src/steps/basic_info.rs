//! Step 2: identity and contact details, including both duplicate checks.

use super::{choice, optional_text, required_text, REQUIRED_MESSAGE};
use crate::catalog::{AGE_RANGE, SEX};
use crate::form::RawForm;
use crate::result::{SanitizedValue, ValidationResult};
use crate::sanitizer::{sanitize_email, sanitize_phone};
use crate::store::{ResponseStore, StoreError};
use crate::uniqueness::{
    is_email_already_used, is_name_already_used, DUPLICATE_EMAIL_MESSAGE, DUPLICATE_NAME_MESSAGE,
};
use crate::validators::{validate_email, validate_email_domain, validate_phone, validate_required};

/// Message for an email that fails the syntax check.
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
/// Message for an email outside the domain allow-list.
pub const EMAIL_DOMAIN_MESSAGE: &str =
    "Please use an email address from a recognized provider (e.g. Gmail, Yahoo, Outlook) or a government or academic domain.";
/// Message for a phone number in the wrong shape.
pub const INVALID_PHONE_MESSAGE: &str =
    "Please enter a valid Philippine phone number (e.g. 09171234567 or +639171234567).";

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;
const MIDDLE_NAME_MAX: usize = 100;
const EXT_NAME_MAX: usize = 20;

/// Step 2.
///
/// Names are 2 to 100 characters; `middle_name` and `ext_name` are optional
/// and stored as `None` when blank. The name duplicate check runs only when
/// both last and first name are non-empty and uses the middle name and suffix
/// exactly as submitted. `email` passes required, syntax, domain and
/// uniqueness gates in that order, stopping at the first failure. `phone` is
/// optional but must have a valid shape when given.
///
/// # Errors
///
/// Returns the store's error if a duplicate lookup fails.
pub fn validate_step_basic_info<S>(form: &RawForm, store: &S) -> Result<ValidationResult, StoreError>
where
    S: ResponseStore + ?Sized,
{
    let mut result = ValidationResult::new();

    let last = required_text(&mut result, form, "last_name", Some(NAME_MIN), Some(NAME_MAX));
    let first = required_text(&mut result, form, "first_name", Some(NAME_MIN), Some(NAME_MAX));
    let middle = optional_text(&mut result, form, "middle_name", Some(MIDDLE_NAME_MAX));
    let suffix = optional_text(&mut result, form, "ext_name", Some(EXT_NAME_MAX));

    if !last.is_empty()
        && !first.is_empty()
        && is_name_already_used(store, &last, &first, middle.as_deref(), suffix.as_deref())?
    {
        result.add_error("last_name", DUPLICATE_NAME_MESSAGE);
    }

    choice(&mut result, form, &SEX);
    choice(&mut result, form, &AGE_RANGE);

    let email = sanitize_email(form.text("email"));
    if !validate_required(email.as_str()) {
        result.add_error("email", REQUIRED_MESSAGE);
    } else if !validate_email(email.as_str()) {
        result.add_error("email", INVALID_EMAIL_MESSAGE);
    } else if !validate_email_domain(email.as_str()) {
        result.add_error("email", EMAIL_DOMAIN_MESSAGE);
    } else if is_email_already_used(store, email.as_str())? {
        result.add_error("email", DUPLICATE_EMAIL_MESSAGE);
    }
    result.set("email", SanitizedValue::Text(email));

    let phone = sanitize_phone(form.text("phone"));
    if phone.is_empty() {
        result.set("phone", SanitizedValue::Optional(None));
    } else {
        if !validate_phone(phone.as_str()) {
            result.add_error("phone", INVALID_PHONE_MESSAGE);
        }
        result.set("phone", SanitizedValue::Optional(Some(phone)));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ResponseId, StoredResponse};
    use chrono::Utc;
    use serde_json::{json, Value};

    fn valid_form() -> RawForm {
        let mut form = RawForm::new();
        form.insert_text("last_name", "Reyes");
        form.insert_text("first_name", "Ana");
        form.insert_text("sex", "female");
        form.insert_text("age_range", "25_34");
        form.insert_text("email", "ana.reyes@gmail.com");
        form
    }

    fn completed(fields: Value) -> StoredResponse {
        let mut row = StoredResponse::new(ResponseId(1), Utc::now());
        row.consent_given = Some(true);
        row.completed_at = Some(Utc::now());
        row.fields = fields.as_object().cloned().unwrap_or_default();
        row
    }

    #[test]
    fn valid_form_declares_every_field() {
        let result = validate_step_basic_info(&valid_form(), &MemoryStore::new()).unwrap();

        assert!(result.is_valid(), "{:?}", result.errors());
        let names: Vec<_> = result.sanitized().names().collect();
        assert_eq!(
            names,
            vec!["last_name", "first_name", "middle_name", "ext_name", "sex", "age_range", "email", "phone"]
        );
        assert_eq!(result.sanitized().get("middle_name"), Some(&SanitizedValue::Optional(None)));
        assert_eq!(result.sanitized().get("phone"), Some(&SanitizedValue::Optional(None)));
    }

    #[test]
    fn short_last_name_fails_min_length() {
        let mut form = valid_form();
        form.insert_text("last_name", "A");

        let result = validate_step_basic_info(&form, &MemoryStore::new()).unwrap();

        assert_eq!(result.first_error("last_name"), Some("Must be at least 2 characters."));
    }

    #[test]
    fn long_ext_name_fails_max_length() {
        let mut form = valid_form();
        form.insert_text("ext_name", "x".repeat(21));

        let result = validate_step_basic_info(&form, &MemoryStore::new()).unwrap();

        assert_eq!(result.first_error("ext_name"), Some("Must not exceed 20 characters."));
    }

    #[test]
    fn unknown_domain_is_rejected() {
        let mut form = valid_form();
        form.insert_text("email", "user@unknown-domain.xyz");

        let result = validate_step_basic_info(&form, &MemoryStore::new()).unwrap();

        assert_eq!(result.first_error("email"), Some(EMAIL_DOMAIN_MESSAGE));
    }

    #[test]
    fn email_gates_short_circuit() {
        let mut form = valid_form();
        form.insert_text("email", "not-an-email");

        let result = validate_step_basic_info(&form, &MemoryStore::new()).unwrap();

        assert_eq!(result.errors().get("email").map(<[String]>::len), Some(1));
        assert_eq!(result.first_error("email"), Some(INVALID_EMAIL_MESSAGE));
    }

    #[test]
    fn used_email_is_a_duplicate() {
        let store = MemoryStore::with_responses(vec![completed(json!({"email": "ana.reyes@gmail.com"}))]);
        let mut form = valid_form();
        form.insert_text("last_name", "Santos");

        let result = validate_step_basic_info(&form, &store).unwrap();

        assert_eq!(result.first_error("email"), Some(DUPLICATE_EMAIL_MESSAGE));
        assert_eq!(result.first_error("last_name"), None);
    }

    #[test]
    fn used_name_is_reported_on_last_name() {
        let store = MemoryStore::with_responses(vec![completed(json!({
            "last_name": "reyes", "first_name": "ana", "middle_name": null, "ext_name": null,
            "email": "other@yahoo.com"
        }))]);

        let result = validate_step_basic_info(&valid_form(), &store).unwrap();

        assert_eq!(result.first_error("last_name"), Some(DUPLICATE_NAME_MESSAGE));
        assert_eq!(result.first_error("first_name"), None);
    }

    #[test]
    fn middle_name_distinguishes_identities() {
        let store = MemoryStore::with_responses(vec![completed(json!({
            "last_name": "Reyes", "first_name": "Ana", "middle_name": null, "ext_name": null
        }))]);
        let mut form = valid_form();
        form.insert_text("middle_name", "Cruz");

        let result = validate_step_basic_info(&form, &store).unwrap();

        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[test]
    fn phone_is_checked_only_when_given() {
        let mut form = valid_form();
        form.insert_text("phone", "0917 123 4567");
        assert!(validate_step_basic_info(&form, &MemoryStore::new()).unwrap().is_valid());

        form.insert_text("phone", "12345");
        let result = validate_step_basic_info(&form, &MemoryStore::new()).unwrap();
        assert_eq!(result.first_error("phone"), Some(INVALID_PHONE_MESSAGE));
    }
}
