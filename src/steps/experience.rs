use super::choice;
use crate::catalog::{YEARS_DSWD, YEARS_SWD_SECTOR};
use crate::form::RawForm;
use crate::result::ValidationResult;

/// Step 4: both experience buckets are required.
pub fn validate_step_work_experience(form: &RawForm) -> ValidationResult {
    let mut result = ValidationResult::new();
    choice(&mut result, form, &YEARS_DSWD);
    choice(&mut result, form, &YEARS_SWD_SECTOR);
    result
}
