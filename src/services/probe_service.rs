//! Probe Service
//!
//! Read-only sanity check of the remote source: fetches one day and
//! summarizes its shape. Nothing is persisted.

use crate::error::Result;
use crate::source::types::{DayReport, TradeRecord};
use crate::state::AppState;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::info;

/// Records shown as samples
const SAMPLE_SIZE: usize = 3;

/// Price thresholds (cents) for "extreme" trades
const EXTREME_LOW: i64 = 5;
const EXTREME_HIGH: i64 = 95;

/// Shape summary of one day's report
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub date: NaiveDate,
    pub record_count: usize,
    /// Records left out of the statistics because they do not decode as trades
    pub malformed_records: usize,
    /// Keys of the first record, in source order
    pub field_names: Vec<String>,
    pub samples: Vec<serde_json::Value>,
    pub total_volume: i64,
    pub unique_tickers: usize,
    pub unique_report_tickers: usize,
    pub extreme_price_trades: usize,
    /// Share of trades at `price <= 5` or `price >= 95`, 0.0-1.0
    pub extreme_price_share: f64,
}

impl ProbeReport {
    /// Summarize a report body. Statistics cover the records that decode as
    /// trades; the rest are only counted.
    pub fn from_report(report: &DayReport) -> Result<Self> {
        let raw = report.raw_records()?;
        let records: Vec<TradeRecord> = raw
            .iter()
            .filter_map(|value| TradeRecord::deserialize(value).ok())
            .collect();
        let malformed_records = raw.len() - records.len();

        let field_names: Vec<String> = raw
            .first()
            .and_then(|first| first.as_object())
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default();
        let samples: Vec<serde_json::Value> = raw.into_iter().take(SAMPLE_SIZE).collect();

        Ok(Self::summarize(
            report.date,
            field_names,
            samples,
            &records,
            malformed_records,
        ))
    }

    fn summarize(
        date: NaiveDate,
        field_names: Vec<String>,
        samples: Vec<serde_json::Value>,
        records: &[TradeRecord],
        malformed_records: usize,
    ) -> Self {
        let total_volume: i64 = records.iter().map(|r| r.contracts_traded).sum();
        let unique_tickers = records
            .iter()
            .map(|r| r.ticker_name.as_str())
            .collect::<HashSet<_>>()
            .len();
        let unique_report_tickers = records
            .iter()
            .map(|r| r.report_ticker.as_str())
            .collect::<HashSet<_>>()
            .len();
        let extreme_price_trades = records
            .iter()
            .filter(|r| r.price <= EXTREME_LOW || r.price >= EXTREME_HIGH)
            .count();
        let extreme_price_share = if records.is_empty() {
            0.0
        } else {
            extreme_price_trades as f64 / records.len() as f64
        };

        Self {
            date,
            record_count: records.len() + malformed_records,
            malformed_records,
            field_names,
            samples,
            total_volume,
            unique_tickers,
            unique_report_tickers,
            extreme_price_trades,
            extreme_price_share,
        }
    }
}

/// Probe service for business logic
pub struct ProbeService;

impl ProbeService {
    /// Fetch and summarize one day; `None` when the source has no data
    pub async fn probe(state: &AppState, date: NaiveDate) -> Result<Option<ProbeReport>> {
        info!("ProbeService::probe - {} via {}", date, state.source.name());

        let report = match state.source.fetch_day(date).await {
            Some(report) if !report.is_empty() => report,
            _ => {
                info!("No data for {}", date);
                return Ok(None);
            }
        };

        ProbeReport::from_report(&report).map(Some)
    }
}
