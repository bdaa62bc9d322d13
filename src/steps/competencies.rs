use super::{conditional_multi_value, multi_value, yes_no};
use crate::catalog::PERFORMS_SW_TASKS;
use crate::form::RawForm;
use crate::result::ValidationResult;

/// Message when "yes" was answered but no task was ticked.
pub const SW_TASKS_REQUIRED_MESSAGE: &str = "Please select at least one task or function.";

/// Step 5. `sw_tasks` is required only when the raw `performs_sw_tasks` is
/// "yes"; it is sanitized and stored either way.
pub fn validate_step_competencies(form: &RawForm) -> ValidationResult {
    let mut result = ValidationResult::new();
    yes_no(&mut result, form, &PERFORMS_SW_TASKS, "performs_sw_tasks");
    conditional_multi_value(
        &mut result,
        form,
        "sw_tasks",
        PERFORMS_SW_TASKS.field,
        SW_TASKS_REQUIRED_MESSAGE,
    );
    multi_value(&mut result, form, "expertise_areas");
    result
}
