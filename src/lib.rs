//! Validation, deduplication and export for a multi-step survey intake.
//!
//! Raw form submissions are untrusted. They enter as [`Tainted`] values inside
//! a [`RawForm`], are sanitized exactly once into [`Verified`] values by a step
//! validator, and only a valid step's [`Verified`] fields can be persisted
//! through a [`ResponseStore`]. Stored responses leave through the CSV
//! [`export`], which guards against spreadsheet formula injection.
//!
//! # Core Types
//!
//! - [`Tainted<T>`]: raw input that has not been sanitized
//! - [`Verified<T>`]: output of exactly one sanitizer
//! - [`Step`]: one of the eight survey pages, with its validator
//! - [`ValidationResult`]: field errors plus sanitized values for one step
//! - [`SurveyFlow`]: validates, persists and advances a respondent
//! - [`Pii<T>`]: personal data that is redacted in logs
//!
//! # Examples
//!
//! ```
//! use survey_intake::{MemoryStore, RawForm, StepOutcome, Step, SubmissionCtx, SurveyFlow};
//!
//! let store = MemoryStore::new();
//! let flow = SurveyFlow::new(&store);
//! let mut ctx = SubmissionCtx::new("req-1");
//!
//! let mut form = RawForm::new();
//! form.insert_text("consent", "yes");
//!
//! let outcome = flow.submit(&mut ctx, 1, &form).expect("store available");
//! assert_eq!(outcome, StepOutcome::Advanced { next: Step::BasicInfo });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
mod error;
pub mod export;
mod flow;
mod form;
mod logging;
mod pii;
mod result;
mod sanitizer;
pub mod steps;
pub mod store;
mod tainted;
pub mod uniqueness;
pub mod validators;
mod verified;

pub use config::{ConfigError, ExportSettings, LineEnding};
pub use error::Error;
pub use export::{write_csv, ExportError, ExportOutcome};
pub use flow::{StepOutcome, SubmissionCtx, SurveyFlow};
pub use form::{FormValue, RawForm};
pub use logging::IntakeLog;
pub use pii::Pii;
pub use result::{FieldErrors, SanitizedFields, SanitizedValue, ValidationResult};
pub use sanitizer::{
    sanitize_email, sanitize_list, sanitize_phone, sanitize_string, EmailSanitizer, HtmlSanitizer,
    ListSanitizer, PhoneSanitizer, Sanitizer,
};
pub use steps::{
    get_step_validator, validate_step, validate_step_basic_info, validate_step_competencies,
    validate_step_consent, validate_step_dswd_courses, validate_step_education,
    validate_step_eteeap, validate_step_office_data, validate_step_work_experience, Step,
};
pub use store::{
    DuplicateQuery, MemoryStore, NameKey, Record, ResponseId, ResponseStore, StoreError,
    StoredResponse, UniqueConstraint,
};
pub use tainted::Tainted;
pub use uniqueness::{is_email_already_used, is_name_already_used};
pub use verified::Verified;
