//! On-disk layout of the archive
//!
//! ```text
//! data/
//!   trades_2025-01-01.json   verbatim report for one day
//!   trades_2025-01-02.json
//!   metadata.json            summary of the last download run
//!   all_trades.csv           combined table
//! ```

use crate::config::DATE_FORMAT;
use crate::error::{AppError, Result};
use crate::source::types::{count_records, DayReport};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const DAY_FILE_PREFIX: &str = "trades_";
const DAY_FILE_SUFFIX: &str = ".json";
pub const METADATA_FILE: &str = "metadata.json";

/// Day files and run metadata in one directory
#[derive(Debug, Clone)]
pub struct DayFileStore {
    dir: PathBuf,
}

impl DayFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory (and parents) if missing
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::Config(format!(
                "Failed to create output directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    pub fn day_file_name(date: NaiveDate) -> String {
        format!("{}{}{}", DAY_FILE_PREFIX, date.format(DATE_FORMAT), DAY_FILE_SUFFIX)
    }

    pub fn day_file_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(Self::day_file_name(date))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn has_day(&self, date: NaiveDate) -> bool {
        self.day_file_path(date).is_file()
    }

    /// Persist a report body unmodified, replacing any earlier file for that day
    pub fn write_day(&self, report: &DayReport) -> Result<PathBuf> {
        let path = self.day_file_path(report.date);
        fs::write(&path, &report.body)?;
        Ok(path)
    }

    /// Number of records in an existing day file
    pub fn read_trade_count(&self, date: NaiveDate) -> Result<usize> {
        let path = self.day_file_path(date);
        let body = fs::read(&path)
            .map_err(|e| AppError::NotFound(format!("{}: {}", path.display(), e)))?;
        count_records(&body)
    }

    /// All day files, sorted by name (which is chronological order)
    pub fn list_day_files(&self) -> Result<Vec<PathBuf>> {
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_day_file_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.into_iter().map(|name| self.dir.join(name)).collect())
    }

    /// Write pretty-printed run metadata, overwriting the previous run's
    pub fn write_metadata<T: Serialize>(&self, metadata: &T) -> Result<PathBuf> {
        let path = self.metadata_path();
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

/// `trades_YYYY-MM-DD.json` with a real calendar date
pub fn is_day_file_name(name: &str) -> bool {
    name.strip_prefix(DAY_FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(DAY_FILE_SUFFIX))
        .map(|date| date.len() == 10 && NaiveDate::parse_from_str(date, DATE_FORMAT).is_ok())
        .unwrap_or(false)
}
