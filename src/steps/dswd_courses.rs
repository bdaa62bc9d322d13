use super::{conditional_multi_value, yes_no};
use crate::catalog::AVAILED_DSWD_TRAINING;
use crate::form::RawForm;
use crate::result::ValidationResult;

/// Message when "yes" was answered but no course was ticked.
pub const DSWD_COURSES_REQUIRED_MESSAGE: &str = "Please select at least one DSWD course you have taken.";

/// Step 7. `dswd_courses` is required when the raw `availed_dswd_training`
/// is "yes".
pub fn validate_step_dswd_courses(form: &RawForm) -> ValidationResult {
    let mut result = ValidationResult::new();
    yes_no(&mut result, form, &AVAILED_DSWD_TRAINING, "availed_dswd_training");
    conditional_multi_value(
        &mut result,
        form,
        "dswd_courses",
        AVAILED_DSWD_TRAINING.field,
        DSWD_COURSES_REQUIRED_MESSAGE,
    );
    result
}
