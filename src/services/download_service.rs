//! Download Service
//!
//! Fetches every calendar day of a range in fixed-size concurrent batches,
//! persists non-empty reports as day files and writes the run metadata.

use crate::calendar::enumerate_dates;
use crate::error::Result;
use crate::source::types::DayReport;
use crate::state::AppState;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Outcome for one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayResult {
    pub date: NaiveDate,
    pub success: bool,
    pub trade_count: usize,
}

impl DayResult {
    fn succeeded(date: NaiveDate, trade_count: usize) -> Self {
        Self {
            date,
            success: true,
            trade_count,
        }
    }

    fn failed(date: NaiveDate) -> Self {
        Self {
            date,
            success: false,
            trade_count: 0,
        }
    }
}

/// Summary of one download run, persisted as `metadata.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub downloaded_at: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: usize,
    pub successful_days: usize,
    pub total_trades: usize,
    /// Successful days only
    pub results: Vec<DayResult>,
}

/// Running totals, updated once per completed batch
#[derive(Debug, Default)]
pub struct DownloadTally {
    pub processed: usize,
    pub successful: usize,
    pub trades: usize,
    pub results: Vec<DayResult>,
}

impl DownloadTally {
    pub fn record_batch(&mut self, outcomes: Vec<DayResult>) {
        self.processed += outcomes.len();
        for outcome in outcomes {
            if outcome.success {
                self.successful += 1;
                self.trades += outcome.trade_count;
                self.results.push(outcome);
            }
        }
    }
}

/// Download service for business logic
pub struct DownloadService;

impl DownloadService {
    /// Download every date from `start` to `end` inclusive.
    ///
    /// Only a failure to create the output directory is returned as an
    /// error; individual days that fail are left out of the results.
    pub async fn download_range(
        state: &AppState,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunMetadata> {
        state.store.ensure_dir()?;

        let dates = enumerate_dates(start, end);
        let batch_size = state.config.batch_size.max(1);
        info!(
            "DownloadService::download_range - {} to {} ({} days, source {}, batches of {})",
            start,
            end,
            dates.len(),
            state.source.name(),
            batch_size
        );

        let mut tally = DownloadTally::default();
        for (index, batch) in dates.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(state.config.batch_delay()).await;
            }

            let outcomes = Self::run_batch(state, batch).await;
            tally.record_batch(outcomes);

            info!(
                "Progress: {}/{} days, {} successful, {} trades",
                tally.processed,
                dates.len(),
                tally.successful,
                tally.trades
            );
        }

        let metadata = RunMetadata {
            downloaded_at: Utc::now(),
            start_date: start,
            end_date: end,
            total_days: dates.len(),
            successful_days: tally.successful,
            total_trades: tally.trades,
            results: tally.results,
        };

        match state.store.write_metadata(&metadata) {
            Ok(path) => info!("Wrote run metadata to {}", path.display()),
            Err(e) => error!("Failed to write run metadata: {}", e),
        }

        Ok(metadata)
    }

    /// Fetch one batch concurrently, then persist results in date order
    async fn run_batch(state: &AppState, batch: &[NaiveDate]) -> Vec<DayResult> {
        let mut outcomes = Vec::with_capacity(batch.len());
        let mut to_fetch = Vec::with_capacity(batch.len());

        for &date in batch {
            if state.config.skip_existing && state.store.has_day(date) {
                match state.store.read_trade_count(date) {
                    Ok(count) if count > 0 => {
                        debug!("Keeping existing day file for {} ({} trades)", date, count);
                        outcomes.push(DayResult::succeeded(date, count));
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Unreadable day file for {}, refetching: {}", date, e),
                }
            }
            to_fetch.push(date);
        }

        let reports = join_all(to_fetch.iter().map(|&date| state.source.fetch_day(date))).await;

        for (date, report) in to_fetch.into_iter().zip(reports) {
            outcomes.push(Self::persist(state, date, report));
        }

        outcomes.sort_by_key(|outcome| outcome.date);
        outcomes
    }

    fn persist(state: &AppState, date: NaiveDate, report: Option<DayReport>) -> DayResult {
        match report {
            Some(report) if !report.is_empty() => match state.store.write_day(&report) {
                Ok(_) => DayResult::succeeded(date, report.trade_count),
                Err(e) => {
                    warn!("Failed to write day file for {}: {}", date, e);
                    DayResult::failed(date)
                }
            },
            Some(_) => {
                debug!("No trades on {}", date);
                DayResult::failed(date)
            }
            None => DayResult::failed(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::source::TradeSource;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// In-memory source; dates without an entry fail
    struct FakeSource {
        bodies: HashMap<NaiveDate, String>,
        calls: Mutex<Vec<NaiveDate>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSource {
        fn new(bodies: Vec<(NaiveDate, String)>) -> Self {
            Self {
                bodies: bodies.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TradeSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_day(&self, date: NaiveDate) -> Option<DayReport> {
            self.calls.lock().push(date);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let body = self.bodies.get(&date)?;
            DayReport::from_body(date, body.as_bytes().to_vec()).ok()
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn body(ticker: &str, count: usize) -> String {
        let records: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#"{{"ticker_name":"{}","report_ticker":"R","date":"2025-01-01","create_ts":"t{}","contracts_traded":{},"price":50}}"#,
                    ticker,
                    i,
                    i + 1
                )
            })
            .collect();
        format!("[{}]", records.join(","))
    }

    fn state_for(dir: &Path, source: Arc<FakeSource>) -> AppState {
        let config = AppConfig {
            data_dir: dir.to_path_buf(),
            batch_delay_ms: 1,
            ..AppConfig::default()
        };
        AppState::with_source(config, source)
    }

    #[tokio::test]
    async fn test_three_day_range_with_one_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::new(vec![(date(1), body("A", 2)), (date(3), body("B", 5))]));
        let state = state_for(dir.path(), source.clone());

        let metadata = DownloadService::download_range(&state, date(1), date(3)).await.unwrap();

        assert_eq!(metadata.total_days, 3);
        assert_eq!(metadata.successful_days, 2);
        assert_eq!(metadata.total_trades, 7);
        let dates: Vec<NaiveDate> = metadata.results.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(1), date(3)]);

        let mut calls = source.calls.lock().clone();
        calls.sort();
        assert_eq!(calls, vec![date(1), date(2), date(3)]);

        assert!(state.store.has_day(date(1)));
        assert!(!state.store.has_day(date(2)));
        assert_eq!(
            fs::read_to_string(state.store.day_file_path(date(3))).unwrap(),
            body("B", 5)
        );

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(state.store.metadata_path()).unwrap()).unwrap();
        assert_eq!(written["startDate"], "2025-01-01");
        assert_eq!(written["endDate"], "2025-01-03");
        assert_eq!(written["totalDays"], 3);
        assert_eq!(written["successfulDays"], 2);
        assert_eq!(written["totalTrades"], 7);
        assert_eq!(written["results"].as_array().unwrap().len(), 2);
        assert_eq!(written["results"][1]["tradeCount"], 5);
        assert_eq!(written["results"][1]["success"], true);
        assert!(written["downloadedAt"].is_string());
    }

    #[tokio::test]
    async fn test_empty_report_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::new(vec![(date(1), "[]".to_string())]));
        let state = state_for(dir.path(), source);

        let metadata = DownloadService::download_range(&state, date(1), date(1)).await.unwrap();

        assert_eq!(metadata.successful_days, 0);
        assert!(metadata.results.is_empty());
        assert!(!state.store.has_day(date(1)));
    }

    #[tokio::test]
    async fn test_batches_cap_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let bodies = (1..=25).map(|d| (date(d), body("A", 1))).collect();
        let source = Arc::new(FakeSource::new(bodies));
        let state = state_for(dir.path(), source.clone());

        let metadata = DownloadService::download_range(&state, date(1), date(25)).await.unwrap();

        assert_eq!(metadata.successful_days, 25);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 10);
        assert_eq!(state.store.list_day_files().unwrap().len(), 25);
    }

    #[tokio::test]
    async fn test_start_after_end_is_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let source = Arc::new(FakeSource::new(Vec::new()));
        let state = state_for(&data_dir, source.clone());

        let metadata = DownloadService::download_range(&state, date(5), date(4)).await.unwrap();

        assert_eq!(metadata.total_days, 0);
        assert!(metadata.results.is_empty());
        assert!(source.calls.lock().is_empty());
        assert!(data_dir.is_dir());
        assert!(state.store.metadata_path().is_file());
    }

    #[tokio::test]
    async fn test_overlapping_rerun_matches_single_run() {
        let first = Arc::new(FakeSource::new(vec![(date(1), body("OLD", 1)), (date(2), body("OLD", 2))]));
        let second = || FakeSource::new(vec![(date(2), body("NEW", 3)), (date(3), body("NEW", 4))]);

        let dir = tempfile::tempdir().unwrap();
        DownloadService::download_range(&state_for(dir.path(), first), date(1), date(2))
            .await
            .unwrap();
        let rerun = state_for(dir.path(), Arc::new(second()));
        DownloadService::download_range(&rerun, date(2), date(3)).await.unwrap();

        let fresh_dir = tempfile::tempdir().unwrap();
        let fresh = state_for(fresh_dir.path(), Arc::new(second()));
        DownloadService::download_range(&fresh, date(2), date(3)).await.unwrap();

        for d in [date(2), date(3)] {
            assert_eq!(
                fs::read(rerun.store.day_file_path(d)).unwrap(),
                fs::read(fresh.store.day_file_path(d)).unwrap()
            );
        }
        // Untouched by the second run
        assert_eq!(
            fs::read_to_string(rerun.store.day_file_path(date(1))).unwrap(),
            body("OLD", 1)
        );
    }

    #[tokio::test]
    async fn test_skip_existing_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trades_2025-01-01.json"), body("KEPT", 4)).unwrap();

        let source = Arc::new(FakeSource::new(vec![(date(1), body("NEW", 1)), (date(2), body("NEW", 2))]));
        let mut state = state_for(dir.path(), source.clone());
        state.config.skip_existing = true;

        let metadata = DownloadService::download_range(&state, date(1), date(2)).await.unwrap();

        assert_eq!(*source.calls.lock(), vec![date(2)]);
        assert_eq!(metadata.successful_days, 2);
        assert_eq!(metadata.total_trades, 6);
        assert_eq!(
            fs::read_to_string(state.store.day_file_path(date(1))).unwrap(),
            body("KEPT", 4)
        );
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let source = Arc::new(FakeSource::new(vec![(date(1), body("A", 1))]));
        let state = state_for(&blocker.join("data"), source.clone());

        assert!(DownloadService::download_range(&state, date(1), date(1)).await.is_err());
        assert!(source.calls.lock().is_empty());
    }

    #[test]
    fn test_tally_counts_only_successes() {
        let mut tally = DownloadTally::default();
        tally.record_batch(vec![
            DayResult::succeeded(date(1), 3),
            DayResult::failed(date(2)),
            DayResult::succeeded(date(3), 4),
        ]);
        assert_eq!(tally.processed, 3);
        assert_eq!(tally.successful, 2);
        assert_eq!(tally.trades, 7);
        assert_eq!(tally.results.len(), 2);
    }
}
