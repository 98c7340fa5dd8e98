//! Warehouse Service
//!
//! Columnar conversion of the combined table and the repetitive-trade
//! analysis on top of it, both run through an in-memory DuckDB.

use crate::db::duckdb::models::{
    CategoryRepetition, GapBucket, HourlyActivity, MarketRepetition, MarketVolume,
    MonthlyRepetition, SizeRepetition,
};
use crate::db::duckdb::TradeWarehouse;
use crate::error::Result;
use crate::state::AppState;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

/// Result of a CSV to Parquet conversion
#[derive(Debug, Clone)]
pub struct ConvertResult {
    pub source: PathBuf,
    pub target: PathBuf,
    pub rows: i64,
}

/// Result of the repetitive-trade analysis.
///
/// `months`, `sizes` and `gaps` honor the report ticker prefix; the market
/// breakdowns always cover every market.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub source: PathBuf,
    pub report_prefix: Option<String>,
    pub since: NaiveDate,
    pub months: Vec<MonthlyRepetition>,
    pub markets: Vec<MarketRepetition>,
    pub sizes: Vec<SizeRepetition>,
    pub hourly: Vec<HourlyActivity>,
    pub gaps: Vec<GapBucket>,
    pub volumes: Vec<MarketVolume>,
    pub comparison: Vec<CategoryRepetition>,
}

impl AnalysisResult {
    pub fn total_trades(&self) -> i64 {
        self.months.iter().map(|m| m.total).sum()
    }

    pub fn repetitive_trades(&self) -> i64 {
        self.months.iter().map(|m| m.repetitive).sum()
    }

    pub fn total_volume(&self) -> i64 {
        self.volumes.iter().map(|v| v.volume).sum()
    }

    /// Trades of `market` in all hours combined
    pub fn market_trades(&self, market: &str) -> i64 {
        self.hourly
            .iter()
            .filter(|h| h.market == market)
            .map(|h| h.trades)
            .sum()
    }
}

/// Warehouse service for business logic
pub struct WarehouseService;

impl WarehouseService {
    /// Write the combined CSV as Parquet next to it
    pub fn convert(state: &AppState) -> Result<ConvertResult> {
        let source = state.config.combined_path();
        let target = state.config.parquet_path();
        info!(
            "WarehouseService::convert - {} -> {}",
            source.display(),
            target.display()
        );

        let warehouse = TradeWarehouse::open_in_memory()?;
        let rows = warehouse.export_parquet(&source, &target)?;

        Ok(ConvertResult {
            source,
            target,
            rows,
        })
    }

    /// Run every analysis over the Parquet file when present, the CSV otherwise
    pub fn analyze(state: &AppState, report_prefix: Option<&str>) -> Result<AnalysisResult> {
        let parquet = state.config.parquet_path();
        let source = if parquet.is_file() {
            parquet
        } else {
            state.config.combined_path()
        };
        let since = state.config.analysis_since;
        info!(
            "WarehouseService::analyze - {} since {} (prefix {:?})",
            source.display(),
            since,
            report_prefix
        );

        let warehouse = TradeWarehouse::open_in_memory()?;
        let months = warehouse.repetitive_by_month(&source, report_prefix, since)?;
        let markets =
            warehouse.repetitive_by_market(&source, since, state.config.min_market_trades)?;
        let sizes = warehouse.repetitive_by_size(&source, report_prefix, since)?;
        let hourly = warehouse.hourly_activity(&source, since)?;
        let gaps = warehouse.size_one_gaps(&source, report_prefix, since)?;
        let volumes = warehouse.volume_by_market(&source, since)?;
        let comparison = warehouse.sports_vs_crypto(&source, since)?;

        Ok(AnalysisResult {
            source,
            report_prefix: report_prefix.map(str::to_string),
            since,
            months,
            markets,
            sizes,
            hourly,
            gaps,
            volumes,
            comparison,
        })
    }
}
