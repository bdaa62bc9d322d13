use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use survey_intake::config::parse_byte;
use survey_intake::{write_csv, ExportOutcome, ExportSettings, Record};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "survey-export")]
#[command(about = "Export stored survey responses as spreadsheet-safe CSV")]
struct Args {
    /// JSON file holding an array of response records
    #[arg(long)]
    input: PathBuf,

    /// CSV file to write; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Field delimiter, overriding SURVEY_EXPORT_DELIMITER
    #[arg(long)]
    delimiter: Option<String>,

    /// Quote character, overriding SURVEY_EXPORT_QUOTE
    #[arg(long)]
    quote: Option<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survey_intake=info,survey_export=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut settings = ExportSettings::from_env().context("Invalid export settings")?;
    if let Some(delimiter) = &args.delimiter {
        settings.delimiter = parse_byte("--delimiter", delimiter)?;
    }
    if let Some(quote) = &args.quote {
        settings.quote = parse_byte("--quote", quote)?;
    }
    if settings.delimiter == settings.quote {
        bail!("delimiter and quote must differ");
    }

    let records = load_records(&args.input)?;
    match export(&records, args.output.as_deref(), &settings)? {
        ExportOutcome::NoContent => info!("no content: input holds no responses"),
        ExportOutcome::Written { rows } => info!(rows, "export finished"),
    }
    Ok(())
}

/// Writes `records` to `output`, or stdout. An empty export never creates
/// the output file.
fn export(
    records: &[Record],
    output: Option<&Path>,
    settings: &ExportSettings,
) -> Result<ExportOutcome> {
    if records.is_empty() {
        return Ok(ExportOutcome::NoContent);
    }

    let outcome = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_csv(records, BufWriter::new(file), settings)?
        }
        None => write_csv(records, io::stdout().lock(), settings)?,
    };
    Ok(outcome)
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let Value::Array(items) = value else {
        bail!("{} must hold a JSON array of records", path.display());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            _ => bail!("record {index} is not a JSON object"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("survey-export-{}-{name}", std::process::id()))
    }

    #[test]
    fn empty_input_leaves_no_output_file() {
        let path = scratch_path("empty.csv");
        let _ = fs::remove_file(&path);

        let outcome = export(&[], Some(&path), &ExportSettings::default()).unwrap();

        assert_eq!(outcome, ExportOutcome::NoContent);
        assert!(!path.exists());
    }

    #[test]
    fn records_are_written_to_the_output_file() {
        let path = scratch_path("rows.csv");
        let record = json!({"id": 1, "last_name": "Reyes"}).as_object().cloned().unwrap();

        let outcome = export(&[record], Some(&path), &ExportSettings::default()).unwrap();

        assert_eq!(outcome, ExportOutcome::Written { rows: 1 });
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Reyes"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn non_array_input_is_rejected() {
        let path = scratch_path("object.json");
        fs::write(&path, r#"{"id": 1}"#).unwrap();

        let err = load_records(&path).unwrap_err();

        assert!(err.to_string().contains("JSON array"));
        fs::remove_file(&path).unwrap();
    }
}
