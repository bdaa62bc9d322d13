use super::{choice, multi_value, optional_text, yes_no};
use crate::catalog::{ETEEAP_AWARENESS, ETEEAP_INTEREST, WILL_APPLY};
use crate::form::RawForm;
use crate::result::ValidationResult;

const COMMENTS_MAX: usize = 2000;

/// Step 8, the last step. `motivations` and `barriers` are optional;
/// `additional_comments` is optional and capped at 2000 characters.
pub fn validate_step_eteeap(form: &RawForm) -> ValidationResult {
    let mut result = ValidationResult::new();
    yes_no(&mut result, form, &ETEEAP_AWARENESS, "eteeap_awareness");
    choice(&mut result, form, &ETEEAP_INTEREST);
    multi_value(&mut result, form, "motivations");
    multi_value(&mut result, form, "barriers");
    choice(&mut result, form, &WILL_APPLY);
    optional_text(&mut result, form, "additional_comments", Some(COMMENTS_MAX));
    result
}
