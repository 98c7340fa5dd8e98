//! Runtime configuration
//!
//! Defaults match the public Kalshi reporting bucket. Every field can be
//! overridden through a `KALSHI_*` environment variable.

use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REPORT_BASE_URL: &str =
    "https://kalshi-public-docs.s3.amazonaws.com/reporting/trade_data_";

/// Date format used by the remote source, day files and metadata
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Archive configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding day files, metadata and the combined table
    pub data_dir: PathBuf,
    /// URL prefix; the date and `.json` are appended per request
    pub report_base_url: String,
    pub request_timeout_secs: u64,
    /// Dates fetched concurrently per batch
    pub batch_size: usize,
    /// Pause between batches
    pub batch_delay_ms: u64,
    pub default_start_date: NaiveDate,
    pub probe_date: NaiveDate,
    pub combined_file: String,
    pub parquet_file: String,
    /// Try `jq` before the in-process CSV conversion
    pub delegate_to_jq: bool,
    /// Do not refetch dates that already have a day file
    pub skip_existing: bool,
    /// Trades before this date are left out of the analysis
    pub analysis_since: NaiveDate,
    /// Market families need more trades than this to be ranked
    pub min_market_trades: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            report_base_url: DEFAULT_REPORT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            batch_size: 10,
            batch_delay_ms: 100,
            default_start_date: NaiveDate::from_ymd_opt(2021, 6, 30).unwrap_or(NaiveDate::MIN),
            probe_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or(NaiveDate::MIN),
            combined_file: "all_trades.csv".to_string(),
            parquet_file: "all_trades.parquet".to_string(),
            delegate_to_jq: true,
            skip_existing: false,
            analysis_since: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN),
            min_market_trades: 100_000,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("KALSHI_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("KALSHI_REPORT_BASE_URL") {
            config.report_base_url = url;
        }
        if let Some(value) = lookup("KALSHI_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("KALSHI_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("KALSHI_BATCH_SIZE") {
            config.batch_size = parse_number("KALSHI_BATCH_SIZE", &value)?;
        }
        if let Some(value) = lookup("KALSHI_BATCH_DELAY_MS") {
            config.batch_delay_ms = parse_number("KALSHI_BATCH_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("KALSHI_START_DATE") {
            config.default_start_date = parse_date(&value)?;
        }
        if let Some(value) = lookup("KALSHI_PROBE_DATE") {
            config.probe_date = parse_date(&value)?;
        }
        if let Some(name) = lookup("KALSHI_COMBINED_FILE") {
            config.combined_file = name;
        }
        if let Some(name) = lookup("KALSHI_PARQUET_FILE") {
            config.parquet_file = name;
        }
        if let Some(value) = lookup("KALSHI_USE_JQ") {
            config.delegate_to_jq = parse_flag("KALSHI_USE_JQ", &value)?;
        }
        if let Some(value) = lookup("KALSHI_SKIP_EXISTING") {
            config.skip_existing = parse_flag("KALSHI_SKIP_EXISTING", &value)?;
        }
        if let Some(value) = lookup("KALSHI_ANALYSIS_SINCE") {
            config.analysis_since = parse_date(&value)?;
        }
        if let Some(value) = lookup("KALSHI_MIN_MARKET_TRADES") {
            config.min_market_trades = parse_number("KALSHI_MIN_MARKET_TRADES", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.report_base_url).map_err(|e| {
            AppError::Config(format!("Invalid report base URL '{}': {}", self.report_base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "Report base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.batch_size == 0 {
            return Err(AppError::Config("Batch size must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config("Request timeout must be at least 1 second".to_string()));
        }
        if self.min_market_trades < 0 {
            return Err(AppError::Config("Minimum market trades must not be negative".to_string()));
        }
        if self.combined_file.is_empty() || self.parquet_file.is_empty() {
            return Err(AppError::Config("Output file names must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn combined_path(&self) -> PathBuf {
        self.data_dir.join(&self.combined_file)
    }

    pub fn parquet_path(&self) -> PathBuf {
        self.data_dir.join(&self.parquet_file)
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| AppError::Validation(format!("Invalid date '{}' (expected YYYY-MM-DD): {}", value, e)))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}
