//! Combine Service
//!
//! Flattens every day file into one CSV table. Each file is converted by `jq`
//! when available and by the in-process converter otherwise; both produce the
//! same rows. Only one day file is held in memory at a time.

use crate::error::{AppError, Result};
use crate::source::types::{parse_trades, TRADE_FIELDS};
use crate::state::AppState;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Same schema as `parse_trades`: the input must be one array of complete
/// trades with string text fields and whole-number counts and prices, or `jq`
/// fails and nothing is appended. `floor + 0` prints `3.0` and `-0.0` the way
/// the in-process writer does.
const JQ_FILTER: &str = r#"
def text: type == "string";
def whole: type == "number" and . == floor
    and . >= -9007199254740991 and . <= 9007199254740991;
if length != 1 or (.[0] | type) != "array"
then error("expected a single array of trades")
else .[0][]
end
| if type == "object"
     and (.ticker_name | text) and (.report_ticker | text)
     and (.date | text) and (.create_ts | text)
     and (.contracts_traded | whole) and (.price | whole)
  then [.ticker_name, .report_ticker, .date, .create_ts,
        (.contracts_traded | floor + 0), (.price | floor + 0)] | @csv
  else error("malformed trade record")
  end
"#;

/// Log a progress line every this many files
const PROGRESS_EVERY: usize = 100;

/// How a day file was converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPath {
    Delegated,
    InProcess,
}

/// A day file that could not be converted
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// Result of one combine run
#[derive(Debug, Clone)]
pub struct CombineSummary {
    pub output: PathBuf,
    pub files_found: usize,
    pub files_processed: usize,
    pub delegated: usize,
    pub skipped: Vec<SkippedFile>,
    /// Data rows in the output, header excluded
    pub rows: usize,
}

/// The single header line of the combined table
pub fn csv_header() -> String {
    TRADE_FIELDS.join(",")
}

/// Combine service for business logic
pub struct CombineService;

impl CombineService {
    /// Combine all day files into the configured table
    pub async fn combine(state: &AppState) -> Result<CombineSummary> {
        let output = state.config.combined_path();
        Self::combine_into(state, &output).await
    }

    /// Combine all day files into `output`, truncating it first
    pub async fn combine_into(state: &AppState, output: &Path) -> Result<CombineSummary> {
        state.store.ensure_dir()?;
        let files = state.store.list_day_files()?;
        info!(
            "CombineService::combine - {} day files in {} -> {}",
            files.len(),
            state.store.dir().display(),
            output.display()
        );

        let file = File::create(output).map_err(|e| {
            AppError::Config(format!("Failed to create {}: {}", output.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", csv_header())?;

        let mut summary = CombineSummary {
            output: output.to_path_buf(),
            files_found: files.len(),
            files_processed: 0,
            delegated: 0,
            skipped: Vec::new(),
            rows: 0,
        };

        for path in &files {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            match Self::append_day_file(&mut writer, path, state.config.delegate_to_jq).await {
                Ok(conversion) => {
                    summary.files_processed += 1;
                    if conversion == ConversionPath::Delegated {
                        summary.delegated += 1;
                    }
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file_name, e);
                    summary.skipped.push(SkippedFile {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }

            if summary.files_processed > 0 && summary.files_processed % PROGRESS_EVERY == 0 {
                info!("Processed {}/{} files", summary.files_processed, files.len());
            }
        }

        writer.flush()?;
        drop(writer);

        summary.rows = count_rows(output)?;
        info!(
            "Combined {} of {} files ({} skipped), {} rows",
            summary.files_processed,
            summary.files_found,
            summary.skipped.len(),
            summary.rows
        );

        Ok(summary)
    }

    /// Append the rows of one day file, trying `jq` first when enabled
    async fn append_day_file<W: Write>(
        writer: &mut W,
        path: &Path,
        delegate_to_jq: bool,
    ) -> Result<ConversionPath> {
        if delegate_to_jq {
            match convert_with_jq(path).await {
                Ok(rows) => {
                    writer.write_all(&rows)?;
                    return Ok(ConversionPath::Delegated);
                }
                Err(e) => debug!("jq conversion unavailable for {}: {}", path.display(), e),
            }
        }

        let rows = convert_in_process(path)?;
        writer.write_all(&rows)?;
        Ok(ConversionPath::InProcess)
    }
}

/// Rows for one day file via `jq`; output is only returned on a clean exit
pub async fn convert_with_jq(path: &Path) -> Result<Vec<u8>> {
    let output = Command::new("jq")
        .arg("--raw-output")
        .arg("--slurp")
        .arg(JQ_FILTER)
        .arg(path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(AppError::Internal(format!(
            "jq exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(output.stdout)
}

/// Rows for one day file: the four text fields always quoted, count and
/// price bare, whatever the text looks like
pub fn convert_in_process(path: &Path) -> Result<Vec<u8>> {
    let body = fs::read(path)?;
    let records = parse_trades(&body)?;

    let mut quoted = csv::WriterBuilder::new();
    quoted
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b','));

    let mut rows = Vec::new();
    for record in &records {
        {
            let mut text = quoted.from_writer(&mut rows);
            text.write_record([
                &record.ticker_name,
                &record.report_ticker,
                &record.date,
                &record.create_ts,
            ])?;
            text.flush()?;
        }
        writeln!(rows, "{},{}", record.contracts_traded, record.price)?;
    }

    Ok(rows)
}

/// Data rows in a combined table, header excluded
pub fn count_rows(path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = 0;
    for record in reader.byte_records() {
        record?;
        rows += 1;
    }
    Ok(rows)
}
