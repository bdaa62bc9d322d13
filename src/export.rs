//! Spreadsheet-safe CSV export of stored responses.
//!
//! Columns are a fixed, ordered list of `(label, field)` pairs. Downstream
//! sheets address them by position, so the order is part of the contract.
//! Each cell goes through the same pipeline:
//!
//! 1. missing or `null` becomes empty;
//! 2. enum codes become their catalog labels (unknown codes pass through);
//! 3. lists are joined with `"; "`, labelling each element;
//! 4. the nullable yes/no columns become `Yes`, `No` or empty;
//! 5. remaining booleans and `"1"`/`"0"` become `Yes`/`No` (never for `id`);
//! 6. the HTML entities written at intake (`&amp;`, `&lt;`, `&gt;`, `&quot;`,
//!    `&#039;`) are decoded back to plain characters;
//! 7. text is folded to ASCII punctuation and, if it starts like a formula,
//!    prefixed with an apostrophe.
//!
//! The output starts with a UTF-8 byte-order mark. Empty input writes
//! nothing at all and reports [`ExportOutcome::NoContent`].

use std::io::{self, Write};

use chrono::{DateTime, TimeZone};
use csv::{Terminator, WriterBuilder};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::export_table;
use crate::config::{ExportSettings, LineEnding};
use crate::error::Error;
use crate::store::{Record, ResponseStore};

/// UTF-8 byte-order mark written before the header row.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Separator between the elements of a multi-value cell.
pub const LIST_SEPARATOR: &str = "; ";

/// Output columns, in order: `(header label, record field)`.
pub const EXPORT_COLUMNS: &[(&str, &str)] = &[
    ("ID", "id"),
    ("Consent Given", "consent_given"),
    ("Completed At", "completed_at"),
    ("Created At", "created_at"),
    ("Last Name", "last_name"),
    ("First Name", "first_name"),
    ("Middle Name", "middle_name"),
    ("Extension Name", "ext_name"),
    ("Sex", "sex"),
    ("Age Range", "age_range"),
    ("Email", "email"),
    ("Phone", "phone"),
    ("Office Type", "office_type"),
    ("Office/Field Office Assignment", "specific_office"),
    ("Office Field/Unit/Program Assignment", "program_assignments"),
    ("Current Position/Designation", "current_position"),
    ("Employment Status", "employment_status"),
    ("Total Years of Work Experience", "years_dswd"),
    ("Years of Social Work-Related Experience", "years_swd_sector"),
    ("Current Tasks/Functions", "sw_tasks"),
    ("Social Work-Related Experiences", "expertise_areas"),
    ("Highest Education", "highest_education"),
    ("Undergraduate Course/Degree", "undergrad_course"),
    ("Diploma Course", "diploma_course"),
    ("Graduate Course/Degree", "graduate_course"),
    ("Availed DSWD Training", "availed_dswd_training"),
    ("DSWD Courses Taken", "dswd_courses"),
    ("ETEEAP Awareness", "eteeap_awareness"),
    ("ETEEAP Interest Level", "eteeap_interest"),
    ("Motivations", "motivations"),
    ("Barriers", "barriers"),
    ("Will Apply", "will_apply"),
    ("Reason for Not Applying", "additional_comments"),
];

/// Yes/no columns where "not answered" must stay distinguishable from "no".
pub const NULLABLE_BOOLEAN_FIELDS: &[&str] = &[
    "consent_given",
    "performs_sw_tasks",
    "availed_dswd_training",
    "eteeap_awareness",
];

/// Characters that make a spreadsheet treat a cell as a formula.
const FORMULA_TRIGGERS: &[char] = &['=', '+', '-', '@'];

/// Errors that abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The CSV writer failed.
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    /// The underlying sink failed.
    #[error("export write failed: {0}")]
    Io(#[from] io::Error),
}

/// What an export produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// There was nothing to export; nothing was written.
    NoContent,
    /// A header and `rows` data rows were written.
    Written {
        /// Number of data rows.
        rows: usize,
    },
}

/// Header labels in column order.
pub fn header() -> impl Iterator<Item = &'static str> {
    EXPORT_COLUMNS.iter().map(|(label, _)| *label)
}

/// Entities produced by the intake sanitizer, and what they stand for.
const HTML_ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#039;", '\''),
];

/// Undoes the intake HTML encoding in a single left-to-right pass, so an
/// encoded entity such as `&amp;lt;` decodes to `&lt;` and no further.
///
/// ```
/// use survey_intake::export::decode_html_entities;
///
/// assert_eq!(decode_html_entities("O&#039;Brien &amp; Sons"), "O'Brien & Sons");
/// assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
/// ```
pub fn decode_html_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match HTML_ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, decoded)) => {
                out.push(*decoded);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Replaces typographic punctuation with its ASCII counterpart.
///
/// ```
/// use survey_intake::export::normalize_unicode;
///
/// assert_eq!(normalize_unicode("Case\u{2014}work"), "Case-work");
/// assert_eq!(normalize_unicode("DSWD\u{2019}s"), "DSWD's");
/// ```
pub fn normalize_unicode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => out.push('-'),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => out.push(' '),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' => out.push('-'),
            other => out.push(other),
        }
    }
    out
}

/// Prefixes an apostrophe when the first non-whitespace character would
/// start a formula. The original, untrimmed value is kept after it.
///
/// ```
/// use survey_intake::export::escape_formula;
///
/// assert_eq!(escape_formula("=1+1"), "'=1+1");
/// assert_eq!(escape_formula("  @SUM(A1)"), "'  @SUM(A1)");
/// assert_eq!(escape_formula("Reyes"), "Reyes");
/// ```
pub fn escape_formula(value: &str) -> String {
    if value.trim_start().starts_with(FORMULA_TRIGGERS) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

/// Loose truthiness for the nullable yes/no columns: empty, zero and `"0"` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn label_or_code(field: &str, code: &str) -> String {
    export_table(field)
        .and_then(|table| table.label(code))
        .unwrap_or(code)
        .to_string()
}

fn scalar_text(field: &str, value: &Value) -> String {
    match value {
        Value::String(s) => label_or_code(field, s),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Formats one cell of the export.
///
/// ```
/// use serde_json::json;
/// use survey_intake::export::format_cell;
///
/// assert_eq!(format_cell("sex", Some(&json!("female"))), "Female");
/// assert_eq!(format_cell("consent_given", None), "");
/// assert_eq!(format_cell("last_name", Some(&json!("=HYPERLINK()"))), "'=HYPERLINK()");
/// ```
pub fn format_cell(field: &str, value: Option<&Value>) -> String {
    let value = match value {
        None | Some(Value::Null) => return String::new(),
        Some(value) => value,
    };

    if NULLABLE_BOOLEAN_FIELDS.contains(&field) {
        if matches!(value, Value::String(s) if s.is_empty()) {
            return String::new();
        }
        return yes_no(is_truthy(value)).to_string();
    }

    let text = match value {
        Value::Number(n) => return n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| scalar_text(field, item))
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Value::Bool(b) => yes_no(*b).to_string(),
        Value::String(s) if field != "id" && (s == "1" || s == "0") => yes_no(s == "1").to_string(),
        other => scalar_text(field, other),
    };

    escape_formula(&normalize_unicode(&decode_html_entities(&text)))
}

/// Formats a whole record in column order.
pub fn format_row(record: &Record) -> Vec<String> {
    EXPORT_COLUMNS
        .iter()
        .map(|(_, field)| format_cell(field, record.get(*field)))
        .collect()
}

/// Writes `records` as CSV to `out`.
///
/// Nothing is written for an empty slice. Any write failure aborts the
/// export; rows already written are not rolled back.
///
/// # Errors
///
/// Returns [`ExportError`] if the sink or the CSV writer fails.
pub fn write_csv<W: Write>(
    records: &[Record],
    mut out: W,
    settings: &ExportSettings,
) -> Result<ExportOutcome, ExportError> {
    if records.is_empty() {
        debug!("no responses to export");
        return Ok(ExportOutcome::NoContent);
    }

    out.write_all(UTF8_BOM)?;

    let terminator = match settings.line_ending {
        LineEnding::Lf => Terminator::Any(b'\n'),
        LineEnding::Crlf => Terminator::CRLF,
    };
    let mut writer = WriterBuilder::new()
        .delimiter(settings.delimiter)
        .quote(settings.quote)
        .terminator(terminator)
        .from_writer(out);

    writer.write_record(header())?;
    for record in records {
        writer.write_record(format_row(record))?;
    }
    writer.flush()?;

    info!(rows = records.len(), "responses exported");
    Ok(ExportOutcome::Written {
        rows: records.len(),
    })
}

/// Exports every response in `store`.
pub fn export_responses<S, W>(
    store: &S,
    out: W,
    settings: &ExportSettings,
) -> Result<ExportOutcome, Error>
where
    S: ResponseStore + ?Sized,
    W: Write,
{
    let records = store.export_records()?;
    Ok(write_csv(&records, out, settings)?)
}

/// Download name for an export taken at `at`:
/// `survey_responses_YYYY-MM-DD_HHMMSS.csv`.
pub fn export_filename<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("survey_responses_{}.csv", at.format("%Y-%m-%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn lf() -> ExportSettings {
        ExportSettings {
            line_ending: LineEnding::Lf,
            ..ExportSettings::default()
        }
    }

    fn export(records: &[Record]) -> (ExportOutcome, String) {
        let mut out = Vec::new();
        let outcome = write_csv(records, &mut out, &lf()).expect("export");
        (outcome, String::from_utf8(out).expect("utf-8"))
    }

    #[test]
    fn column_contract_is_fixed() {
        assert_eq!(EXPORT_COLUMNS.len(), 33);
        assert_eq!(EXPORT_COLUMNS[0], ("ID", "id"));
        assert_eq!(EXPORT_COLUMNS[32], ("Reason for Not Applying", "additional_comments"));
    }

    #[test]
    fn intake_entities_are_decoded_in_cells() {
        assert_eq!(
            format_cell("additional_comments", Some(&json!("Dela Cruz &amp; Sons O&#039;Brien"))),
            "Dela Cruz & Sons O'Brien"
        );
        assert_eq!(
            format_cell("current_position", Some(&json!("&quot;Head&quot; &lt;acting&gt;"))),
            "\"Head\" <acting>"
        );
        assert_eq!(format_cell("current_position", Some(&json!("&amp;lt;"))), "&lt;");
        assert_eq!(format_cell("current_position", Some(&json!("R&D & QA"))), "R&D & QA");
    }

    #[test]
    fn decoded_text_is_still_formula_escaped() {
        assert_eq!(format_cell("last_name", Some(&json!("=A1&amp;B1"))), "'=A1&B1");
    }

    #[test]
    fn empty_input_writes_nothing() {
        let (outcome, text) = export(&[]);
        assert_eq!(outcome, ExportOutcome::NoContent);
        assert!(text.is_empty());
    }

    #[test]
    fn output_starts_with_bom_then_header() {
        let (outcome, text) = export(&[record(json!({"id": 1}))]);

        assert_eq!(outcome, ExportOutcome::Written { rows: 1 });
        assert!(text.starts_with('\u{FEFF}'));
        let header_line = text.trim_start_matches('\u{FEFF}').lines().next().unwrap();
        assert!(header_line.starts_with("ID,Consent Given,Completed At"));
    }

    #[test]
    fn enum_codes_become_labels() {
        assert_eq!(
            format_cell("employment_status", Some(&json!("cos_moa"))),
            "Contract of Service / MOA"
        );
        assert_eq!(format_cell("employment_status", Some(&json!("jo"))), "jo");
    }

    #[test]
    fn lists_are_labelled_and_joined() {
        assert_eq!(
            format_cell("sw_tasks", Some(&json!(["case_management", "advocacy"]))),
            "case_management; advocacy"
        );
        assert_eq!(format_cell("motivations", Some(&json!([]))), "");
    }

    #[test]
    fn nullable_booleans_keep_unanswered_empty() {
        assert_eq!(format_cell("eteeap_awareness", Some(&Value::Null)), "");
        assert_eq!(format_cell("eteeap_awareness", Some(&json!(""))), "");
        assert_eq!(format_cell("eteeap_awareness", Some(&json!(true))), "Yes");
        assert_eq!(format_cell("eteeap_awareness", Some(&json!(false))), "No");
        assert_eq!(format_cell("availed_dswd_training", Some(&json!("0"))), "No");
        assert_eq!(format_cell("availed_dswd_training", Some(&json!(1))), "Yes");
    }

    #[test]
    fn legacy_flags_skip_the_id_column() {
        assert_eq!(format_cell("diploma_course", Some(&json!("1"))), "Yes");
        assert_eq!(format_cell("diploma_course", Some(&json!(false))), "No");
        assert_eq!(format_cell("id", Some(&json!("1"))), "1");
        assert_eq!(format_cell("id", Some(&json!(1))), "1");
    }

    #[test]
    fn unicode_is_folded_before_escaping() {
        assert_eq!(format_cell("additional_comments", Some(&json!("\u{2014}none"))), "'-none");
        assert_eq!(format_cell("last_name", Some(&json!("O\u{2019}Neil"))), "O'Neil");
        assert_eq!(normalize_unicode("wait\u{2026}"), "wait...");
        assert_eq!(normalize_unicode("\u{2022} item\u{00A0}one"), "- item one");
    }

    #[test]
    fn formula_cells_are_escaped_in_output() {
        let (_, text) = export(&[record(json!({"id": 1, "last_name": "=1+1"}))]);
        let row = text.lines().nth(1).unwrap();
        assert!(row.contains(",'=1+1,"), "{row}");
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        let (_, text) = export(&[record(json!({"id": 2, "specific_office": "Region VII, Cebu"}))]);
        assert!(text.contains("\"Region VII, Cebu\""));
    }

    #[test]
    fn settings_change_the_dialect() {
        let settings = ExportSettings {
            delimiter: b';',
            quote: b'\'',
            line_ending: LineEnding::Crlf,
        };
        let mut out = Vec::new();
        write_csv(&[record(json!({"id": 3}))], &mut out, &settings).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("ID;Consent Given;"));
        assert!(text.contains("\r\n"));
    }

    #[test]
    fn write_failures_abort() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = write_csv(&[record(json!({"id": 1}))], Broken, &lf()).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn filename_uses_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(export_filename(&at), "survey_responses_2026-03-09_140507.csv");
    }
}
