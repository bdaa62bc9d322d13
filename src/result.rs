use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::Verified;

/// A sanitized field value as produced by a step validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SanitizedValue {
    /// Required free text or an enum code.
    Text(Verified<String>),
    /// Optional free text; `None` when left blank.
    Optional(Option<Verified<String>>),
    /// A yes/no answer folded into a boolean.
    Flag(bool),
    /// A multi-value field.
    List(Verified<Vec<String>>),
}

impl SanitizedValue {
    /// Borrows the text of a `Text` or present `Optional` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            Self::Optional(v) => v.as_ref().map(Verified::as_str),
            Self::Flag(_) | Self::List(_) => None,
        }
    }

    /// Returns the boolean of a `Flag` value.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrows the elements of a `List` value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v.as_ref().as_slice()),
            _ => None,
        }
    }

    /// Converts to the JSON shape a store persists.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(v) => Value::String(v.as_str().to_string()),
            Self::Optional(Some(v)) => Value::String(v.as_str().to_string()),
            Self::Optional(None) => Value::Null,
            Self::Flag(b) => Value::Bool(*b),
            Self::List(v) => Value::Array(
                v.as_ref()
                    .iter()
                    .map(|item| Value::String(item.clone()))
                    .collect(),
            ),
        }
    }
}

/// Sanitized values of one step, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedFields {
    entries: Vec<(&'static str, SanitizedValue)>,
}

impl SanitizedFields {
    /// Sets a field, replacing any earlier value in place.
    pub fn insert(&mut self, field: &'static str, value: SanitizedValue) {
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Looks up a field.
    pub fn get(&self, field: &str) -> Option<&SanitizedValue> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// Returns `true` if the field was declared.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SanitizedValue)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no field was declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SanitizedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Field errors in the order they were raised.
///
/// A field can carry several messages; the first one is what a respondent
/// sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(&'static str, Vec<String>)>,
}

impl FieldErrors {
    /// Appends a message to a field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field, vec![message])),
        }
    }

    /// All messages for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// The message shown to the respondent for a field.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Fields with errors, in the order they failed.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Number of fields with errors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no field failed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, messages) in &self.entries {
            map.serialize_entry(name, messages)?;
        }
        map.end()
    }
}

/// Outcome of one step validator.
///
/// `is_valid()` is derived from the error list; there is no way to mark a
/// result valid while it still carries errors.
///
/// # Examples
///
/// ```
/// use survey_intake::{RawForm, validate_step_consent};
///
/// let mut form = RawForm::new();
/// form.insert_text("consent", "yes");
///
/// let result = validate_step_consent(&form);
/// assert!(result.is_valid());
/// assert_eq!(
///     result.sanitized().get("consent_given").and_then(|v| v.as_flag()),
///     Some(true)
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: FieldErrors,
    sanitized: SanitizedFields,
}

impl ValidationResult {
    /// Creates an empty, valid result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already-sanitized fields, e.g. to report a late storage error.
    pub fn from_fields(sanitized: SanitizedFields) -> Self {
        Self {
            errors: FieldErrors::default(),
            sanitized,
        }
    }

    /// Reassembles a result from its parts.
    pub fn from_parts(errors: FieldErrors, sanitized: SanitizedFields) -> Self {
        Self { errors, sanitized }
    }

    /// Records an error against a field.
    pub fn add_error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Records the sanitized value of a field.
    pub fn set(&mut self, field: &'static str, value: SanitizedValue) {
        self.sanitized.insert(field, value);
    }

    /// `true` iff no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The recorded errors.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// First message for a field, if it failed.
    pub fn first_error(&self, field: &str) -> Option<&str> {
        self.errors.first(field)
    }

    /// The sanitized values, present whether or not validation passed.
    pub fn sanitized(&self) -> &SanitizedFields {
        &self.sanitized
    }

    /// Promotes a valid result's fields to `Verified`, the only form a store
    /// accepts. An invalid result yields its errors instead.
    pub fn into_verified(self) -> Result<Verified<SanitizedFields>, FieldErrors> {
        if self.is_valid() {
            Ok(Verified::new_unchecked(self.sanitized))
        } else {
            Err(self.errors)
        }
    }
}
