//! Export settings.
//!
//! Defaults follow the usual CSV dialect: comma, double quote, and the
//! platform's line ending. Each can be overridden from the environment:
//!
//! | Variable | Values |
//! |---|---|
//! | `SURVEY_EXPORT_DELIMITER` | a single ASCII character |
//! | `SURVEY_EXPORT_QUOTE` | a single ASCII character |
//! | `SURVEY_EXPORT_LINE_ENDING` | `lf`, `crlf` or `platform` |

use std::env;

use thiserror::Error;

/// Environment variable for the field delimiter.
pub const DELIMITER_VAR: &str = "SURVEY_EXPORT_DELIMITER";
/// Environment variable for the quote character.
pub const QUOTE_VAR: &str = "SURVEY_EXPORT_QUOTE";
/// Environment variable for the line ending.
pub const LINE_ENDING_VAR: &str = "SURVEY_EXPORT_LINE_ENDING";

/// A setting that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The value of `key` is not acceptable.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Rejected value.
        value: String,
        /// What was expected instead.
        reason: &'static str,
    },
}

/// Row terminator for the CSV writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    Crlf,
}

impl LineEnding {
    /// The current platform's convention.
    pub fn platform() -> Self {
        if cfg!(windows) {
            LineEnding::Crlf
        } else {
            LineEnding::Lf
        }
    }

    /// Parses `lf`, `crlf` or `platform`, case-insensitively.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lf" => Ok(LineEnding::Lf),
            "crlf" => Ok(LineEnding::Crlf),
            "platform" => Ok(LineEnding::platform()),
            _ => Err(invalid(key, value, "expected lf, crlf or platform")),
        }
    }
}

impl Default for LineEnding {
    fn default() -> Self {
        LineEnding::platform()
    }
}

/// How the CSV export is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSettings {
    /// Field separator.
    pub delimiter: u8,
    /// Enclosure character.
    pub quote: u8,
    /// Row terminator.
    pub line_ending: LineEnding,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            line_ending: LineEnding::platform(),
        }
    }
}

impl ExportSettings {
    /// Reads overrides from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which returns a variable's value or
    /// `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(value) = lookup(DELIMITER_VAR) {
            settings.delimiter = parse_byte(DELIMITER_VAR, &value)?;
        }
        if let Some(value) = lookup(QUOTE_VAR) {
            settings.quote = parse_byte(QUOTE_VAR, &value)?;
        }
        if let Some(value) = lookup(LINE_ENDING_VAR) {
            settings.line_ending = LineEnding::parse(LINE_ENDING_VAR, &value)?;
        }
        if settings.delimiter == settings.quote {
            return Err(invalid(QUOTE_VAR, &value_of(settings.quote), "must differ from the delimiter"));
        }
        Ok(settings)
    }
}

/// Parses a single ASCII character setting. `\t` is accepted for tab.
pub fn parse_byte(key: &str, value: &str) -> Result<u8, ConfigError> {
    if value == "\\t" {
        return Ok(b'\t');
    }
    match value.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'\n' && *byte != b'\r' => Ok(*byte),
        _ => Err(invalid(key, value, "expected a single ASCII character")),
    }
}

fn value_of(byte: u8) -> String {
    char::from(byte).to_string()
}

fn invalid(key: &str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let settings = ExportSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, ExportSettings::default());
        assert_eq!(settings.delimiter, b',');
        assert_eq!(settings.quote, b'"');
    }

    #[test]
    fn overrides_apply() {
        let settings = ExportSettings::from_lookup(lookup(&[
            (DELIMITER_VAR, ";"),
            (QUOTE_VAR, "'"),
            (LINE_ENDING_VAR, "CRLF"),
        ]))
        .unwrap();

        assert_eq!(settings.delimiter, b';');
        assert_eq!(settings.quote, b'\'');
        assert_eq!(settings.line_ending, LineEnding::Crlf);
    }

    #[test]
    fn tab_escape_is_accepted() {
        let settings = ExportSettings::from_lookup(lookup(&[(DELIMITER_VAR, "\\t")])).unwrap();
        assert_eq!(settings.delimiter, b'\t');
    }

    #[test]
    fn multi_character_delimiter_is_rejected() {
        let err = ExportSettings::from_lookup(lookup(&[(DELIMITER_VAR, ";;")])).unwrap_err();
        let ConfigError::InvalidValue { key, .. } = err;
        assert_eq!(key, DELIMITER_VAR);
    }

    #[test]
    fn unknown_line_ending_is_rejected() {
        assert!(ExportSettings::from_lookup(lookup(&[(LINE_ENDING_VAR, "cr")])).is_err());
    }

    #[test]
    fn quote_must_differ_from_delimiter() {
        let err = ExportSettings::from_lookup(lookup(&[(QUOTE_VAR, ",")])).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }
}
