use super::{choice, multi_value, required_text};
use crate::catalog::{EMPLOYMENT_STATUS, OFFICE_TYPE};
use crate::form::RawForm;
use crate::result::ValidationResult;

/// Step 3: office type, office, program assignments, position and
/// employment status. `program_assignments` is optional.
pub fn validate_step_office_data(form: &RawForm) -> ValidationResult {
    let mut result = ValidationResult::new();
    choice(&mut result, form, &OFFICE_TYPE);
    required_text(&mut result, form, "specific_office", None, None);
    multi_value(&mut result, form, "program_assignments");
    required_text(&mut result, form, "current_position", None, None);
    choice(&mut result, form, &EMPLOYMENT_STATUS);
    result
}
