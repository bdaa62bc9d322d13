use super::yes_no;
use crate::catalog::CONSENT;
use crate::form::RawForm;
use crate::result::ValidationResult;

/// Step 1. `consent` must be "yes" or "no"; it is stored as the boolean
/// `consent_given`. Errors are reported on `consent`.
pub fn validate_step_consent(form: &RawForm) -> ValidationResult {
    let mut result = ValidationResult::new();
    yes_no(&mut result, form, &CONSENT, "consent_given");
    result
}
