//! The form boundary: raw field maps as delivered by the web layer.
//!
//! Every value that enters through a submission is wrapped in
//! [`Tainted<FormValue>`](crate::Tainted) the moment it is inserted. Step
//! validators pull fields out as `Tainted<String>` or `Tainted<Vec<String>>`
//! and must sanitize them before anything else can read them.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Error;
use crate::Tainted;

/// A single decoded form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A scalar input (text box, radio button, select).
    Text(String),
    /// A multi-value input (checkbox group).
    List(Vec<String>),
}

/// The fields of one step submission, all tainted.
///
/// # Examples
///
/// ```
/// use survey_intake::RawForm;
///
/// let mut form = RawForm::new();
/// form.insert_text("consent", "yes");
/// form.insert_list("sw_tasks", ["case_management", "counseling"]);
///
/// assert!(form.contains("consent"));
/// assert_eq!(form.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    fields: HashMap<String, Tainted<FormValue>>,
}

impl RawForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scalar field, replacing any previous value.
    pub fn insert_text(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(
            field.into(),
            Tainted::new(FormValue::Text(value.into())),
        );
    }

    /// Adds a multi-value field, replacing any previous value.
    pub fn insert_list<I, V>(&mut self, field: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.fields
            .insert(field.into(), Tainted::new(FormValue::List(values)));
    }

    /// Builds a form from a decoded JSON object.
    ///
    /// Strings, numbers and booleans become [`FormValue::Text`]; arrays become
    /// [`FormValue::List`] of their scalar elements; `null` is treated as an
    /// absent field. Nested objects are not form data and are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedForm`] if `payload` is not a JSON object.
    pub fn from_json(payload: &Value) -> Result<Self, Error> {
        let object = payload
            .as_object()
            .ok_or_else(|| Error::MalformedForm("payload must be a JSON object".to_string()))?;

        let mut form = Self::new();
        for (field, value) in object {
            match value {
                Value::Array(items) => {
                    form.insert_list(field.as_str(), items.iter().filter_map(scalar_text));
                }
                other => {
                    if let Some(text) = scalar_text(other) {
                        form.insert_text(field.as_str(), text);
                    }
                }
            }
        }
        Ok(form)
    }

    /// Returns `true` if the field was submitted.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of submitted fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reads a scalar field. Lists and missing fields read as absent.
    pub(crate) fn text(&self, field: &str) -> Option<Tainted<String>> {
        match self.fields.get(field)?.peek() {
            FormValue::Text(value) => Some(Tainted::new(value.clone())),
            FormValue::List(_) => None,
        }
    }

    /// Reads a multi-value field. Scalars and missing fields read as empty.
    pub(crate) fn list(&self, field: &str) -> Tainted<Vec<String>> {
        match self.fields.get(field).map(Tainted::peek) {
            Some(FormValue::List(values)) => Tainted::new(values.clone()),
            _ => Tainted::new(Vec::new()),
        }
    }

    /// Compares the raw scalar value with a literal, before any sanitization.
    pub(crate) fn raw_is(&self, field: &str, literal: &str) -> bool {
        matches!(
            self.fields.get(field).map(Tainted::peek),
            Some(FormValue::Text(value)) if value == literal
        )
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
