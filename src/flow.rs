//! Submitting survey steps in order.
//!
//! [`SubmissionCtx`] replaces per-visitor session state: the caller keeps it
//! between requests and passes it in explicitly. [`SurveyFlow`] validates a
//! step, persists it through the [`ResponseStore`], and decides what happens
//! next.

use crate::error::Error;
use crate::form::RawForm;
use crate::logging::IntakeLog;
use crate::result::{SanitizedFields, SanitizedValue, ValidationResult};
use crate::steps::{get_step_validator, Step};
use crate::store::{ResponseId, ResponseStore, StoreError, StoredResponse, UniqueConstraint};

/// Per-respondent state carried between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCtx {
    request_id: String,
    response_id: Option<ResponseId>,
    reached: Step,
    finished: bool,
}

impl SubmissionCtx {
    /// A fresh respondent at step 1.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            response_id: None,
            reached: Step::Consent,
            finished: false,
        }
    }

    /// Picks up a stored response where it left off.
    ///
    /// A `current_step` of 9 means the last step was saved. Any value outside
    /// 1..=9 restarts the respondent at consent.
    pub fn resume(request_id: impl Into<String>, response: &StoredResponse) -> Self {
        let current = i64::from(response.current_step);
        let reached = match Step::from_number(current) {
            Some(step) => step,
            None if current == i64::from(Step::LAST.number()) + 1 => Step::LAST,
            None => Step::Consent,
        };
        Self {
            request_id: request_id.into(),
            response_id: Some(response.id),
            reached,
            finished: response.completed_at.is_some() || response.consent_given == Some(false),
        }
    }

    /// Starts a new request for the same respondent.
    pub fn set_request_id(&mut self, request_id: impl Into<String>) {
        self.request_id = request_id.into();
    }

    /// Id of the request being handled.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The stored response, once the first step was saved.
    pub fn response_id(&self) -> Option<ResponseId> {
        self.response_id
    }

    /// Highest step the respondent may submit.
    pub fn reached(&self) -> Step {
        self.reached
    }

    /// `true` once the survey was completed or consent was refused.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// A logger tagged with this context's ids.
    pub fn log(&self) -> IntakeLog<'_> {
        let log = IntakeLog::new(&self.request_id);
        match self.response_id {
            Some(id) => log.with_response(id),
            None => log,
        }
    }
}

/// What a submission led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// At least one field failed; nothing was saved. Re-render with the
    /// messages.
    Rejected(ValidationResult),
    /// Saved; the respondent moves on to `next`.
    Advanced {
        /// Step to show next.
        next: Step,
    },
    /// Consent was refused. The answer is saved and the survey ends.
    Declined(ResponseId),
    /// The last step was saved and the response is complete.
    Completed(ResponseId),
}

/// Drives submissions against a store.
#[derive(Debug)]
pub struct SurveyFlow<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S> SurveyFlow<'s, S>
where
    S: ResponseStore + ?Sized,
{
    /// Creates a flow over `store`.
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Handles one step submission.
    ///
    /// Steps can be re-submitted but not skipped. A unique-constraint breach
    /// at save time is reported exactly like the pre-flight duplicate check,
    /// as a rejected step.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidStep`] for a step number outside 1..=8
    /// - [`Error::SurveyClosed`] after completion or refused consent
    /// - [`Error::StepOutOfOrder`] for a step past the one reached
    /// - [`Error::Store`] for any other store failure
    pub fn submit(
        &self,
        ctx: &mut SubmissionCtx,
        step: i64,
        form: &RawForm,
    ) -> Result<StepOutcome, Error> {
        let step = get_step_validator(step).ok_or(Error::InvalidStep(step))?;
        if ctx.finished {
            return Err(Error::SurveyClosed);
        }
        if step > ctx.reached {
            return Err(Error::StepOutOfOrder {
                requested: step.number(),
                allowed: ctx.reached.number(),
            });
        }

        ctx.log().debug(format_args!("validating {}", step));
        let result = match step.validate(form, self.store) {
            Ok(result) => result,
            Err(err) => {
                ctx.log().error(format_args!("{} duplicate lookup failed: {}", step, err));
                return Err(err.into());
            }
        };
        let sanitized = result.sanitized().clone();
        let fields = match result.into_verified() {
            Ok(fields) => fields,
            Err(errors) => {
                ctx.log()
                    .info(format_args!("{} rejected, {} field(s) failed", step, errors.len()));
                return Ok(StepOutcome::Rejected(ValidationResult::from_parts(errors, sanitized)));
            }
        };

        let id = match ctx.response_id {
            Some(id) => id,
            None => {
                let id = self.store.create()?;
                ctx.response_id = Some(id);
                id
            }
        };

        if let Err(err) = self.store.save_step(id, step, &fields) {
            return late_duplicate(ctx, step, sanitized, err);
        }
        ctx.log().info(format_args!("{} saved", step));

        if step == Step::Consent && !consents(&sanitized) {
            ctx.finished = true;
            ctx.log().info(format_args!("consent refused, survey closed"));
            return Ok(StepOutcome::Declined(id));
        }

        if let Some(next) = step.next() {
            ctx.reached = ctx.reached.max(next);
            return Ok(StepOutcome::Advanced { next });
        }

        if let Err(err) = self.store.complete(id) {
            return late_duplicate(ctx, step, sanitized, err);
        }
        ctx.finished = true;
        ctx.log().info(format_args!("survey completed"));
        Ok(StepOutcome::Completed(id))
    }
}

fn consents(sanitized: &SanitizedFields) -> bool {
    sanitized
        .get("consent_given")
        .and_then(SanitizedValue::as_flag)
        .unwrap_or(false)
}

/// Turns a unique-constraint breach into the same field error the
/// pre-flight check gives. Other store errors pass through.
fn late_duplicate(
    ctx: &SubmissionCtx,
    step: Step,
    sanitized: SanitizedFields,
    err: StoreError,
) -> Result<StepOutcome, Error> {
    let constraint: UniqueConstraint = match err {
        StoreError::UniqueViolation(constraint) => constraint,
        other => {
            ctx.log().error(format_args!("{} could not be saved: {}", step, other));
            return Err(other.into());
        }
    };
    ctx.log().warn(format_args!(
        "{} hit the {} constraint at save time",
        step, constraint
    ));
    let mut result = ValidationResult::from_fields(sanitized);
    result.add_error(constraint.field(), constraint.message());
    Ok(StepOutcome::Rejected(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn consent(answer: &str) -> RawForm {
        let mut form = RawForm::new();
        form.insert_text("consent", answer);
        form
    }

    #[test]
    fn unknown_step_is_invalid() {
        let store = MemoryStore::new();
        let flow = SurveyFlow::new(&store);
        let mut ctx = SubmissionCtx::new("req");

        let err = flow.submit(&mut ctx, 0, &RawForm::new()).unwrap_err();

        assert!(matches!(err, Error::InvalidStep(0)));
    }

    #[test]
    fn steps_cannot_be_skipped() {
        let store = MemoryStore::new();
        let flow = SurveyFlow::new(&store);
        let mut ctx = SubmissionCtx::new("req");

        let err = flow.submit(&mut ctx, 3, &RawForm::new()).unwrap_err();

        assert!(matches!(err, Error::StepOutOfOrder { requested: 3, allowed: 1 }));
        assert!(store.is_empty());
    }

    #[test]
    fn invalid_step_creates_nothing() {
        let store = MemoryStore::new();
        let flow = SurveyFlow::new(&store);
        let mut ctx = SubmissionCtx::new("req");

        let outcome = flow.submit(&mut ctx, 1, &RawForm::new()).unwrap();

        assert!(matches!(outcome, StepOutcome::Rejected(ref r) if r.first_error("consent").is_some()));
        assert!(store.is_empty());
        assert_eq!(ctx.response_id(), None);
    }

    #[test]
    fn consent_advances_to_basic_info() {
        let store = MemoryStore::new();
        let flow = SurveyFlow::new(&store);
        let mut ctx = SubmissionCtx::new("req");

        let outcome = flow.submit(&mut ctx, 1, &consent("yes")).unwrap();

        assert_eq!(outcome, StepOutcome::Advanced { next: Step::BasicInfo });
        assert_eq!(ctx.reached(), Step::BasicInfo);
        let id = ctx.response_id().expect("row created");
        assert_eq!(store.load(id).unwrap().consent_given, Some(true));
    }

    #[test]
    fn refusing_consent_closes_the_survey() {
        let store = MemoryStore::new();
        let flow = SurveyFlow::new(&store);
        let mut ctx = SubmissionCtx::new("req");

        let outcome = flow.submit(&mut ctx, 1, &consent("no")).unwrap();
        assert!(matches!(outcome, StepOutcome::Declined(_)));
        assert!(ctx.is_finished());

        let err = flow.submit(&mut ctx, 1, &consent("yes")).unwrap_err();
        assert!(matches!(err, Error::SurveyClosed));
    }

    #[test]
    fn resubmitting_a_step_reuses_the_row() {
        let store = MemoryStore::new();
        let flow = SurveyFlow::new(&store);
        let mut ctx = SubmissionCtx::new("req");

        flow.submit(&mut ctx, 1, &consent("yes")).unwrap();
        flow.submit(&mut ctx, 1, &consent("yes")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(ctx.reached(), Step::BasicInfo);
    }

    #[test]
    fn resume_restores_progress() {
        let mut row = StoredResponse::new(ResponseId(4), chrono::Utc::now());
        row.consent_given = Some(true);
        row.current_step = 5;

        let ctx = SubmissionCtx::resume("req-9", &row);

        assert_eq!(ctx.response_id(), Some(ResponseId(4)));
        assert_eq!(ctx.reached(), Step::Competencies);
        assert!(!ctx.is_finished());
        assert_eq!(ctx.log().response_id(), Some(ResponseId(4)));
    }

    #[test]
    fn resume_after_last_step_stays_on_last_step() {
        let mut row = StoredResponse::new(ResponseId(5), chrono::Utc::now());
        row.consent_given = Some(true);
        row.current_step = 9;

        assert_eq!(SubmissionCtx::resume("req", &row).reached(), Step::LAST);
    }

    #[test]
    fn resume_with_out_of_range_progress_restarts_at_consent() {
        let store = MemoryStore::new();
        let id = store.create().unwrap();
        let flow = SurveyFlow::new(&store);

        for current_step in [0u8, 10, 255] {
            let mut row = store.load(id).unwrap();
            row.current_step = current_step;
            let mut ctx = SubmissionCtx::resume("req", &row);

            assert_eq!(ctx.reached(), Step::Consent, "current_step {current_step}");
            let err = flow.submit(&mut ctx, 8, &RawForm::new()).unwrap_err();
            assert!(matches!(err, Error::StepOutOfOrder { requested: 8, allowed: 1 }));
        }
        assert!(store.load(id).unwrap().completed_at.is_none());
    }

    #[test]
    fn store_failures_are_logged_as_errors() {
        let ctx = SubmissionCtx::new("req-err");
        let (result, out) = crate::logging::capture::captured(|| {
            late_duplicate(
                &ctx,
                Step::BasicInfo,
                SanitizedFields::default(),
                StoreError::Unavailable("connection reset".to_string()),
            )
        });

        assert!(matches!(result, Err(Error::Store(StoreError::Unavailable(_)))));
        assert!(out.contains("ERROR"));
        assert!(out.contains("req-err"));
        assert!(out.contains("connection reset"));
    }

    #[test]
    fn non_unique_store_errors_propagate() {
        let store = MemoryStore::new();
        let mut ctx = SubmissionCtx::new("req");
        let err = late_duplicate(
            &ctx,
            Step::Consent,
            SanitizedFields::default(),
            StoreError::NotFound(ResponseId(1)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::NotFound(_))));

        ctx.set_request_id("req-2");
        let outcome = late_duplicate(
            &ctx,
            Step::EteeapInterest,
            SanitizedFields::default(),
            StoreError::UniqueViolation(UniqueConstraint::Email),
        )
        .unwrap();
        match outcome {
            StepOutcome::Rejected(result) => {
                assert_eq!(result.first_error("email"), Some(UniqueConstraint::Email.message()))
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(store.is_empty());
    }
}
