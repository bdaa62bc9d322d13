//! The eight survey steps and their validators.
//!
//! Each validator reads only its own step's fields from a [`RawForm`],
//! sanitizes every declared field exactly once, and returns a
//! [`ValidationResult`]. Declared fields always appear in `sanitized`, valid or
//! not; blank optional text is stored as `None`.
//!
//! Dispatch is a closed enum: [`get_step_validator`] maps 1..=8 to a [`Step`]
//! and anything else to `None`.

mod basic_info;
mod competencies;
mod consent;
mod dswd_courses;
mod education;
mod eteeap;
mod experience;
mod office;

use std::fmt;

pub use basic_info::validate_step_basic_info;
pub use competencies::validate_step_competencies;
pub use consent::validate_step_consent;
pub use dswd_courses::validate_step_dswd_courses;
pub use education::validate_step_education;
pub use eteeap::validate_step_eteeap;
pub use experience::validate_step_work_experience;
pub use office::validate_step_office_data;

use crate::catalog::EnumField;
use crate::error::Error;
use crate::form::RawForm;
use crate::result::{SanitizedValue, ValidationResult};
use crate::sanitizer::{sanitize_list, sanitize_string};
use crate::store::{ResponseStore, StoreError};
use crate::validators::{
    validate_checkbox_required, validate_in_list, validate_max_length, validate_min_length,
    validate_required,
};

/// Message for a missing required field.
pub const REQUIRED_MESSAGE: &str = "This field is required.";
/// Message for a value outside the allowed options.
pub const INVALID_OPTION_MESSAGE: &str = "Please select a valid option.";

/// One page of the survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    /// 1: data privacy consent.
    Consent,
    /// 2: name, sex, age, contact details.
    BasicInfo,
    /// 3: office and employment.
    OfficeData,
    /// 4: years of service.
    WorkExperience,
    /// 5: social work tasks and expertise.
    Competencies,
    /// 6: educational attainment.
    Education,
    /// 7: DSWD trainings taken.
    DswdCourses,
    /// 8: ETEEAP awareness and interest.
    EteeapInterest,
}

impl Step {
    /// Every step in survey order.
    pub const ALL: [Step; 8] = [
        Step::Consent,
        Step::BasicInfo,
        Step::OfficeData,
        Step::WorkExperience,
        Step::Competencies,
        Step::Education,
        Step::DswdCourses,
        Step::EteeapInterest,
    ];

    /// The step whose save completes the survey.
    pub const LAST: Step = Step::EteeapInterest;

    /// 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            Step::Consent => 1,
            Step::BasicInfo => 2,
            Step::OfficeData => 3,
            Step::WorkExperience => 4,
            Step::Competencies => 5,
            Step::Education => 6,
            Step::DswdCourses => 7,
            Step::EteeapInterest => 8,
        }
    }

    /// Maps a step number to a step; `None` outside 1..=8.
    pub fn from_number(number: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|step| i64::from(step.number()) == number)
    }

    /// The step after this one.
    pub fn next(self) -> Option<Self> {
        Self::from_number(i64::from(self.number()) + 1)
    }

    /// Page heading.
    pub fn title(self) -> &'static str {
        match self {
            Step::Consent => "Data Privacy Consent",
            Step::BasicInfo => "Basic Information",
            Step::OfficeData => "Office Data",
            Step::WorkExperience => "Work Experience",
            Step::Competencies => "Competencies",
            Step::Education => "Educational Background",
            Step::DswdCourses => "DSWD Courses",
            Step::EteeapInterest => "ETEEAP Interest",
        }
    }

    /// Runs this step's validator.
    ///
    /// Only [`Step::BasicInfo`] touches the store (duplicate checks); a store
    /// failure there is returned as an error rather than a field message.
    pub fn validate<S>(self, form: &RawForm, store: &S) -> Result<ValidationResult, StoreError>
    where
        S: ResponseStore + ?Sized,
    {
        let result = match self {
            Step::Consent => validate_step_consent(form),
            Step::BasicInfo => validate_step_basic_info(form, store)?,
            Step::OfficeData => validate_step_office_data(form),
            Step::WorkExperience => validate_step_work_experience(form),
            Step::Competencies => validate_step_competencies(form),
            Step::Education => validate_step_education(form),
            Step::DswdCourses => validate_step_dswd_courses(form),
            Step::EteeapInterest => validate_step_eteeap(form),
        };
        Ok(result)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

/// Looks up the validator for a step number.
///
/// # Examples
///
/// ```
/// use survey_intake::{get_step_validator, Step};
///
/// assert_eq!(get_step_validator(1), Some(Step::Consent));
/// assert_eq!(get_step_validator(9), None);
/// ```
pub fn get_step_validator(step: i64) -> Option<Step> {
    Step::from_number(step)
}

/// Dispatches and runs a step validator.
///
/// # Errors
///
/// [`Error::InvalidStep`] for a number outside 1..=8; [`Error::Store`] if a
/// duplicate lookup fails.
pub fn validate_step<S>(step: i64, form: &RawForm, store: &S) -> Result<ValidationResult, Error>
where
    S: ResponseStore + ?Sized,
{
    let validator = get_step_validator(step).ok_or(Error::InvalidStep(step))?;
    Ok(validator.validate(form, store)?)
}

fn min_length_message(min: usize) -> String {
    format!("Must be at least {min} characters.")
}

fn max_length_message(max: usize) -> String {
    format!("Must not exceed {max} characters.")
}

/// Required enum field: required, then membership.
fn choice(result: &mut ValidationResult, form: &RawForm, table: &EnumField) {
    let value = sanitize_string(form.text(table.field));
    if !validate_required(value.as_str()) {
        result.add_error(table.field, REQUIRED_MESSAGE);
    } else if !validate_in_list(value.as_str(), &table.codes()) {
        result.add_error(table.field, INVALID_OPTION_MESSAGE);
    }
    result.set(table.field, SanitizedValue::Text(value));
}

/// Required yes/no field stored as a boolean under `flag_field`.
fn yes_no(result: &mut ValidationResult, form: &RawForm, table: &EnumField, flag_field: &'static str) {
    let value = sanitize_string(form.text(table.field));
    if !validate_required(value.as_str()) {
        result.add_error(table.field, REQUIRED_MESSAGE);
    } else if !validate_in_list(value.as_str(), &table.codes()) {
        result.add_error(table.field, INVALID_OPTION_MESSAGE);
    }
    result.set(flag_field, SanitizedValue::Flag(value.as_str() == "yes"));
}

/// Required free text with optional length bounds. Returns the sanitized text.
fn required_text(
    result: &mut ValidationResult,
    form: &RawForm,
    field: &'static str,
    min: Option<usize>,
    max: Option<usize>,
) -> String {
    let value = sanitize_string(form.text(field));
    let text = value.as_str().to_string();

    if !validate_required(value.as_str()) {
        result.add_error(field, REQUIRED_MESSAGE);
    } else if let Some(min) = min.filter(|min| !validate_min_length(&text, *min)) {
        result.add_error(field, min_length_message(min));
    } else if let Some(max) = max.filter(|max| !validate_max_length(&text, *max)) {
        result.add_error(field, max_length_message(max));
    }
    result.set(field, SanitizedValue::Text(value));
    text
}

/// Optional free text, `None` when blank. Returns the sanitized text.
fn optional_text(
    result: &mut ValidationResult,
    form: &RawForm,
    field: &'static str,
    max: Option<usize>,
) -> Option<String> {
    let value = sanitize_string(form.text(field));
    if value.is_empty() {
        result.set(field, SanitizedValue::Optional(None));
        return None;
    }

    let text = value.as_str().to_string();
    if let Some(max) = max.filter(|max| !validate_max_length(&text, *max)) {
        result.add_error(field, max_length_message(max));
    }
    result.set(field, SanitizedValue::Optional(Some(value)));
    Some(text)
}

/// Optional multi-value field.
fn multi_value(result: &mut ValidationResult, form: &RawForm, field: &'static str) {
    let values = sanitize_list(form.list(field));
    result.set(field, SanitizedValue::List(values));
}

/// Multi-value field that must be non-empty when the raw `trigger` is "yes".
///
/// The trigger is read from the raw form, not from the sanitized flag.
fn conditional_multi_value(
    result: &mut ValidationResult,
    form: &RawForm,
    field: &'static str,
    trigger: &str,
    message: &str,
) {
    let values = sanitize_list(form.list(field));
    if form.raw_is(trigger, "yes") && !validate_checkbox_required(values.as_ref()) {
        result.add_error(field, message);
    }
    result.set(field, SanitizedValue::List(values));
}
