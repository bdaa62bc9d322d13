use std::fmt;

use crate::store::ResponseId;

/// A logger bound to one submission.
///
/// Every event carries the request id, and the response id once the store
/// has assigned one. Personal values must be wrapped in
/// [`Pii`](crate::Pii) before they reach a message; its `Debug` and
/// `Display` print `[REDACTED]`.
///
/// ```
/// use survey_intake::{IntakeLog, Pii};
///
/// let log = IntakeLog::new("req-42");
/// log.info(format_args!("duplicate check for {}", Pii::new("ana@gmail.com")));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IntakeLog<'a> {
    request_id: &'a str,
    response_id: Option<ResponseId>,
}

macro_rules! emit {
    ($level:ident, $log:expr, $args:expr) => {{
        let log: &IntakeLog<'_> = $log;
        let request_id = log.request_id;
        match log.response_id {
            Some(id) => tracing::$level!(request_id = %request_id, response_id = %id, "{}", $args),
            None => tracing::$level!(request_id = %request_id, "{}", $args),
        }
    }};
}

impl<'a> IntakeLog<'a> {
    /// Creates a logger for a request.
    pub fn new(request_id: &'a str) -> Self {
        Self {
            request_id,
            response_id: None,
        }
    }

    /// Returns a copy that also tags events with `id`.
    pub fn with_response(self, id: ResponseId) -> Self {
        Self {
            response_id: Some(id),
            ..self
        }
    }

    /// Request id attached to every event.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Response id, once known.
    pub fn response_id(&self) -> Option<ResponseId> {
        self.response_id
    }

    /// Logs at info level.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        emit!(info, self, args);
    }

    /// Logs at warn level.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        emit!(warn, self, args);
    }

    /// Logs at error level.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        emit!(error, self, args);
    }

    /// Logs at debug level.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        emit!(debug, self, args);
    }
}
