//! The persistence collaborator.
//!
//! The validation core does not own storage. It talks to a [`ResponseStore`],
//! which persists only [`Verified`] step data, answers duplicate lookups, and
//! is the authoritative guard for uniqueness. [`MemoryStore`] is the
//! reference backend used by the tests and the export tool.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::result::SanitizedFields;
use crate::steps::Step;
use crate::Verified;

/// A persisted response flattened to field → value, multi-value fields merged
/// in as arrays. This is what the export formatter consumes.
pub type Record = Map<String, Value>;

/// Timestamp layout used for `created_at` / `completed_at` in records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifier a store assigns to a response row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(pub u64);

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// The name identity of a respondent: (last, first, middle, suffix), each
/// trimmed and lower-cased.
///
/// `None` means the component is absent. It only matches another absent
/// component; it never matches `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameKey {
    last: String,
    first: String,
    middle: Option<String>,
    suffix: Option<String>,
}

impl NameKey {
    /// Builds a normalized key.
    pub fn new(last: &str, first: &str, middle: Option<&str>, suffix: Option<&str>) -> Self {
        Self {
            last: normalize(last),
            first: normalize(first),
            middle: middle.map(normalize),
            suffix: suffix.map(normalize),
        }
    }

    /// Normalized last name.
    pub fn last(&self) -> &str {
        &self.last
    }

    /// Normalized first name.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Normalized middle name, if present.
    pub fn middle(&self) -> Option<&str> {
        self.middle.as_deref()
    }

    /// Normalized suffix, if present.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

/// The logical predicate of a duplicate lookup.
///
/// Both variants only ever match responses that were consented to and
/// completed; a backend translating this into a query must keep that gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateQuery {
    /// Trimmed, lower-cased email equality.
    Email(String),
    /// Four-component name equality.
    Name(NameKey),
}

impl DuplicateQuery {
    /// Builds an email query, normalizing the address.
    pub fn email(address: &str) -> Self {
        Self::Email(normalize(address))
    }

    /// Evaluates the predicate against one stored response.
    pub fn matches(&self, response: &StoredResponse) -> bool {
        if !response.counts_for_uniqueness() {
            return false;
        }
        match self {
            Self::Email(email) => response
                .email()
                .is_some_and(|stored| normalize(stored) == *email),
            Self::Name(key) => response.name_key().is_some_and(|stored| stored == *key),
        }
    }
}

/// Which uniqueness rule a write broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// Another completed response uses the same email.
    Email,
    /// Another completed response has the same name identity.
    Name,
}

impl fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "unique_completed_email"),
            Self::Name => write!(f, "unique_completed_name"),
        }
    }
}

/// Errors a store can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No response row with this id.
    #[error("response {0} not found")]
    NotFound(ResponseId),
    /// A write would create a second completed response with the same identity.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(UniqueConstraint),
    /// The backend could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One survey response row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    /// Store-assigned identity.
    pub id: ResponseId,
    /// `None` until the consent step is saved.
    pub consent_given: Option<bool>,
    /// Set when the last step is saved.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// Next step the respondent may fill in.
    pub current_step: u8,
    /// Sanitized step fields, merged across steps.
    pub fields: Record,
}

impl StoredResponse {
    /// Creates a fresh row at step 1.
    pub fn new(id: ResponseId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            consent_given: None,
            completed_at: None,
            created_at,
            current_step: 1,
            fields: Record::new(),
        }
    }

    /// A row takes part in duplicate checks only once it is consented and
    /// completed.
    pub fn counts_for_uniqueness(&self) -> bool {
        self.consent_given == Some(true) && self.completed_at.is_some()
    }

    /// The stored email, if any.
    pub fn email(&self) -> Option<&str> {
        self.fields.get("email").and_then(Value::as_str)
    }

    /// The stored name identity. `None` without both last and first name.
    pub fn name_key(&self) -> Option<NameKey> {
        let text = |field: &str| self.fields.get(field).and_then(Value::as_str);
        let last = text("last_name")?;
        let first = text("first_name")?;
        Some(NameKey::new(last, first, text("middle_name"), text("ext_name")))
    }

    /// Merges one step's sanitized fields into the row.
    pub fn apply(&mut self, step: Step, fields: &SanitizedFields) {
        for (name, value) in fields.iter() {
            self.fields.insert(name.to_string(), value.to_json());
        }
        if let Some(consent) = fields.get("consent_given").and_then(|v| v.as_flag()) {
            self.consent_given = Some(consent);
        }
        self.current_step = self.current_step.max(step.number() + 1);
    }

    /// Flattens the row for export.
    pub fn to_record(&self) -> Record {
        let mut record = self.fields.clone();
        record.insert("id".to_string(), Value::from(self.id.0));
        record.insert(
            "consent_given".to_string(),
            self.consent_given.map_or(Value::Null, Value::Bool),
        );
        record.insert(
            "completed_at".to_string(),
            self.completed_at.map_or(Value::Null, |at| {
                Value::String(at.format(TIMESTAMP_FORMAT).to_string())
            }),
        );
        record.insert(
            "created_at".to_string(),
            Value::String(self.created_at.format(TIMESTAMP_FORMAT).to_string()),
        );
        record.insert("current_step".to_string(), Value::from(self.current_step));
        record
    }
}

/// Storage interface the intake core depends on.
///
/// Implementations MUST enforce uniqueness of email and name identity among
/// consented, completed rows at write time and report a breach as
/// [`StoreError::UniqueViolation`]. The pre-flight checks in
/// [`uniqueness`](crate::uniqueness) only exist to give a friendly message
/// early; this constraint is the one that counts under concurrent submissions.
pub trait ResponseStore {
    /// Returns the id of a response matching the predicate, if one exists.
    fn fetch_one(&self, query: &DuplicateQuery) -> Result<Option<ResponseId>, StoreError>;

    /// Starts a new response row.
    fn create(&self) -> Result<ResponseId, StoreError>;

    /// Persists one step's verified fields.
    fn save_step(
        &self,
        id: ResponseId,
        step: Step,
        fields: &Verified<SanitizedFields>,
    ) -> Result<(), StoreError>;

    /// Marks a response completed.
    fn complete(&self, id: ResponseId) -> Result<(), StoreError>;

    /// Loads one response.
    fn load(&self, id: ResponseId) -> Result<StoredResponse, StoreError>;

    /// All responses, flattened for export, in id order.
    fn export_records(&self) -> Result<Vec<Record>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryRows {
    rows: Vec<StoredResponse>,
    next_id: u64,
}

impl MemoryRows {
    fn position(&self, id: ResponseId) -> Result<usize, StoreError> {
        self.rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Checks the partial unique indexes for the row at `index`.
    fn check_unique(&self, index: usize) -> Result<(), StoreError> {
        let row = &self.rows[index];
        if !row.counts_for_uniqueness() {
            return Ok(());
        }
        let rows = &self.rows;
        let others = move || {
            rows.iter()
                .enumerate()
                .filter(move |(i, _)| *i != index)
                .map(|(_, other)| other)
        };

        if let Some(email) = row.email().filter(|e| !e.trim().is_empty()) {
            let query = DuplicateQuery::email(email);
            if others().any(|other| query.matches(other)) {
                return Err(StoreError::UniqueViolation(UniqueConstraint::Email));
            }
        }
        if let Some(key) = row.name_key() {
            let query = DuplicateQuery::Name(key);
            if others().any(|other| query.matches(other)) {
                return Err(StoreError::UniqueViolation(UniqueConstraint::Name));
            }
        }
        Ok(())
    }
}

/// An in-memory [`ResponseStore`] guarded by a mutex.
///
/// # Examples
///
/// ```
/// use survey_intake::{MemoryStore, ResponseStore};
///
/// let store = MemoryStore::new();
/// let id = store.create().expect("create");
/// assert_eq!(store.load(id).expect("load").current_step, 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryRows>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding existing rows, e.g. loaded from a dump.
    ///
    /// Rows are taken as-is; the unique constraint applies to later writes.
    pub fn with_responses(responses: Vec<StoredResponse>) -> Self {
        let next_id = responses.iter().map(|r| r.id.0).max().unwrap_or(0);
        Self {
            inner: Mutex::new(MemoryRows {
                rows: responses,
                next_id,
            }),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|guard| guard.rows.len()).unwrap_or(0)
    }

    /// Returns `true` if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, MemoryRows>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl ResponseStore for MemoryStore {
    fn fetch_one(&self, query: &DuplicateQuery) -> Result<Option<ResponseId>, StoreError> {
        let guard = self.rows()?;
        Ok(guard
            .rows
            .iter()
            .find(|row| query.matches(row))
            .map(|row| row.id))
    }

    fn create(&self) -> Result<ResponseId, StoreError> {
        let mut guard = self.rows()?;
        guard.next_id += 1;
        let id = ResponseId(guard.next_id);
        guard.rows.push(StoredResponse::new(id, Utc::now()));
        debug!(response_id = %id, "response created");
        Ok(id)
    }

    fn save_step(
        &self,
        id: ResponseId,
        step: Step,
        fields: &Verified<SanitizedFields>,
    ) -> Result<(), StoreError> {
        let mut guard = self.rows()?;
        let index = guard.position(id)?;
        let previous = guard.rows[index].clone();

        guard.rows[index].apply(step, fields.as_ref());
        if let Err(err) = guard.check_unique(index) {
            guard.rows[index] = previous;
            warn!(response_id = %id, step = step.number(), error = %err, "step save rejected");
            return Err(err);
        }
        debug!(response_id = %id, step = step.number(), "step saved");
        Ok(())
    }

    fn complete(&self, id: ResponseId) -> Result<(), StoreError> {
        let mut guard = self.rows()?;
        let index = guard.position(id)?;

        guard.rows[index].completed_at = Some(Utc::now());
        if let Err(err) = guard.check_unique(index) {
            guard.rows[index].completed_at = None;
            warn!(response_id = %id, error = %err, "completion rejected");
            return Err(err);
        }
        debug!(response_id = %id, "response completed");
        Ok(())
    }

    fn load(&self, id: ResponseId) -> Result<StoredResponse, StoreError> {
        let guard = self.rows()?;
        let index = guard.position(id)?;
        Ok(guard.rows[index].clone())
    }

    fn export_records(&self) -> Result<Vec<Record>, StoreError> {
        let guard = self.rows()?;
        let mut rows: Vec<&StoredResponse> = guard.rows.iter().collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows.into_iter().map(StoredResponse::to_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed(id: u64, fields: Value) -> StoredResponse {
        let mut row = StoredResponse::new(ResponseId(id), Utc::now());
        row.consent_given = Some(true);
        row.completed_at = Some(Utc::now());
        row.fields = fields.as_object().cloned().unwrap_or_default();
        row
    }

    #[test]
    fn name_key_normalizes_components() {
        let key = NameKey::new("  Dela Cruz ", "JUAN", Some(" Santos "), None);

        assert_eq!(key.last(), "dela cruz");
        assert_eq!(key.first(), "juan");
        assert_eq!(key.middle(), Some("santos"));
        assert_eq!(key.suffix(), None);
    }

    #[test]
    fn absent_component_never_matches_blank() {
        assert_ne!(
            NameKey::new("Reyes", "Ana", None, None),
            NameKey::new("Reyes", "Ana", Some(""), None)
        );
        assert_ne!(
            NameKey::new("Reyes", "Ana", None, None),
            NameKey::new("Reyes", "Ana", Some("Cruz"), None)
        );
        assert_eq!(
            NameKey::new("reyes ", " ANA", None, Some("Jr.")),
            NameKey::new("Reyes", "Ana", None, Some("jr."))
        );
    }

    #[test]
    fn queries_only_match_completed_consented_rows() {
        let mut row = completed(1, json!({"email": "Ana@Gmail.com"}));
        let query = DuplicateQuery::email(" ana@gmail.com ");
        assert!(query.matches(&row));

        row.completed_at = None;
        assert!(!query.matches(&row));

        row.completed_at = Some(Utc::now());
        row.consent_given = Some(false);
        assert!(!query.matches(&row));

        row.consent_given = None;
        assert!(!query.matches(&row));
    }

    #[test]
    fn name_query_uses_stored_nulls() {
        let row = completed(
            1,
            json!({"last_name": "Reyes", "first_name": "Ana", "middle_name": null, "ext_name": null}),
        );

        let bare = DuplicateQuery::Name(NameKey::new("REYES", "ana", None, None));
        let with_middle = DuplicateQuery::Name(NameKey::new("Reyes", "Ana", Some("Cruz"), None));

        assert!(bare.matches(&row));
        assert!(!with_middle.matches(&row));
    }

    #[test]
    fn fetch_one_finds_matching_row() {
        let store = MemoryStore::with_responses(vec![
            completed(4, json!({"email": "a@gmail.com"})),
            completed(9, json!({"email": "b@gmail.com"})),
        ]);

        let hit = store.fetch_one(&DuplicateQuery::email("B@gmail.com")).unwrap();
        assert_eq!(hit, Some(ResponseId(9)));
        assert_eq!(store.fetch_one(&DuplicateQuery::email("c@gmail.com")).unwrap(), None);

        // Ids continue after the seeded rows.
        assert_eq!(store.create().unwrap(), ResponseId(10));
    }

    #[test]
    fn complete_enforces_unique_email() {
        let store = MemoryStore::with_responses(vec![completed(1, json!({"email": "dup@gmail.com"}))]);
        let id = store.create().unwrap();
        {
            let mut guard = store.rows().unwrap();
            let index = guard.position(id).unwrap();
            guard.rows[index].consent_given = Some(true);
            guard.rows[index]
                .fields
                .insert("email".into(), json!("DUP@gmail.com"));
        }

        let err = store.complete(id).unwrap_err();

        assert_eq!(err, StoreError::UniqueViolation(UniqueConstraint::Email));
        assert!(store.load(id).unwrap().completed_at.is_none());
    }

    #[test]
    fn missing_rows_are_reported() {
        let store = MemoryStore::new();
        assert_eq!(
            store.complete(ResponseId(42)).unwrap_err(),
            StoreError::NotFound(ResponseId(42))
        );
    }

    #[test]
    fn to_record_carries_lifecycle_columns() {
        let mut row = completed(7, json!({"sw_tasks": ["a", "b"], "consent_given": true}));
        row.consent_given = Some(true);
        let record = row.to_record();

        assert_eq!(record["id"], json!(7));
        assert_eq!(record["consent_given"], json!(true));
        assert_eq!(record["sw_tasks"], json!(["a", "b"]));
        assert!(record["completed_at"].is_string());
        assert!(record["created_at"].is_string());
    }

    #[test]
    fn export_records_are_in_id_order() {
        let store = MemoryStore::with_responses(vec![
            completed(3, json!({})),
            completed(1, json!({})),
        ]);

        let ids: Vec<Value> = store
            .export_records()
            .unwrap()
            .into_iter()
            .map(|r| r["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);
    }
}
