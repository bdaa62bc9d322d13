use thiserror::Error;

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::store::StoreError;

/// Errors that can occur while handling a submission or an export.
///
/// Field validation failures are not errors: they are data inside
/// [`ValidationResult`](crate::ValidationResult) and go back to the
/// respondent. Everything here is either a client mistake the form cannot
/// recover from or a collaborator failure.
#[derive(Debug, Error)]
pub enum Error {
    /// The step number is outside 1..=8.
    #[error("invalid step number {0}")]
    InvalidStep(i64),

    /// A step was submitted before the steps leading to it.
    #[error("step {requested} submitted before step {allowed}")]
    StepOutOfOrder {
        /// Step the client sent.
        requested: u8,
        /// Highest step the client may submit now.
        allowed: u8,
    },

    /// The survey was already completed or declined in this context.
    #[error("survey already closed")]
    SurveyClosed,

    /// The form payload could not be read as a field map.
    #[error("malformed form payload: {0}")]
    MalformedForm(String),

    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing the CSV failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// A setting could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
