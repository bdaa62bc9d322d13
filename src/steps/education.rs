use super::{choice, optional_text};
use crate::catalog::HIGHEST_EDUCATION;
use crate::form::RawForm;
use crate::result::ValidationResult;

/// Step 6. Course names are optional and uncapped.
pub fn validate_step_education(form: &RawForm) -> ValidationResult {
    let mut result = ValidationResult::new();
    choice(&mut result, form, &HIGHEST_EDUCATION);
    for field in ["undergrad_course", "diploma_course", "graduate_course"] {
        optional_text(&mut result, form, field, None);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::SanitizedValue;

    #[test]
    fn courses_are_optional() {
        let mut form = RawForm::new();
        form.insert_text("highest_education", "bachelors");
        form.insert_text("undergrad_course", " BS Social Work ");

        let result = validate_step_education(&form);

        assert!(result.is_valid());
        let sanitized = result.sanitized();
        assert_eq!(
            sanitized.get("undergrad_course").and_then(SanitizedValue::as_text),
            Some("BS Social Work")
        );
        assert_eq!(sanitized.get("graduate_course"), Some(&SanitizedValue::Optional(None)));
    }

    #[test]
    fn long_course_names_are_accepted() {
        let mut form = RawForm::new();
        form.insert_text("highest_education", "graduate");
        form.insert_text("graduate_course", "M".repeat(5000));

        assert!(validate_step_education(&form).is_valid());
    }

    #[test]
    fn education_level_is_required() {
        let result = validate_step_education(&RawForm::new());
        assert!(result.first_error("highest_education").is_some());
    }
}
