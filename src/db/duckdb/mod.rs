//! DuckDB engine for the combined trade table

pub mod models;
mod queries;

use crate::config::DATE_FORMAT;
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use duckdb::Connection;
use models::{
    CategoryRepetition, GapBucket, HourlyActivity, MarketRepetition, MarketVolume,
    MonthlyRepetition, SizeRepetition,
};
use parking_lot::Mutex;
use std::path::Path;

/// In-memory DuckDB connection that reads the archive files directly
pub struct TradeWarehouse {
    conn: Mutex<Connection>,
}

impl TradeWarehouse {
    /// Open a transient in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Copy the combined CSV into a Parquet file, returning its row count
    pub fn export_parquet(&self, csv_path: &Path, parquet_path: &Path) -> Result<i64> {
        if !csv_path.is_file() {
            return Err(AppError::NotFound(format!(
                "Combined table {} does not exist; run combine first",
                csv_path.display()
            )));
        }

        let sql = queries::EXPORT_PARQUET
            .replace("{source}", &table_function(csv_path)?)
            .replace("{target}", &sql_literal(parquet_path)?);

        {
            let conn = self.conn.lock();
            conn.execute_batch(&sql)?;
        }

        tracing::info!("Exported {} to {}", csv_path.display(), parquet_path.display());
        self.count_rows(parquet_path)
    }

    /// Number of trades in a CSV or Parquet file
    pub fn count_rows(&self, path: &Path) -> Result<i64> {
        let sql = queries::COUNT_ROWS.replace("{source}", &table_function(path)?);
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Monthly totals of repetitive trades since `since`, optionally limited
    /// to report tickers starting with `report_prefix`
    pub fn repetitive_by_month(
        &self,
        path: &Path,
        report_prefix: Option<&str>,
        since: NaiveDate,
    ) -> Result<Vec<MonthlyRepetition>> {
        let sql = source_query(queries::REPETITIVE_BY_MONTH, path)?;
        self.collect_rows(
            &sql,
            duckdb::params![report_prefix.unwrap_or(""), since_param(since)],
            |row| {
                Ok(MonthlyRepetition {
                    month: row.get(0)?,
                    total: row.get(1)?,
                    repetitive: row.get(2)?,
                })
            },
        )
    }

    /// Repetitive rate per market family with more than `min_trades` trades
    pub fn repetitive_by_market(
        &self,
        path: &Path,
        since: NaiveDate,
        min_trades: i64,
    ) -> Result<Vec<MarketRepetition>> {
        let sql = source_query(queries::REPETITIVE_BY_MARKET, path)?
            .replace("{market}", queries::MARKET_CASE);
        self.collect_rows(&sql, duckdb::params![since_param(since), min_trades], |row| {
            Ok(MarketRepetition {
                market: row.get(0)?,
                total: row.get(1)?,
                repetitive: row.get(2)?,
            })
        })
    }

    /// Repetitive rate for the common trade sizes
    pub fn repetitive_by_size(
        &self,
        path: &Path,
        report_prefix: Option<&str>,
        since: NaiveDate,
    ) -> Result<Vec<SizeRepetition>> {
        let sql = source_query(queries::REPETITIVE_BY_SIZE, path)?;
        self.collect_rows(
            &sql,
            duckdb::params![report_prefix.unwrap_or(""), since_param(since)],
            |row| {
                Ok(SizeRepetition {
                    size: row.get(0)?,
                    total: row.get(1)?,
                    repetitive: row.get(2)?,
                })
            },
        )
    }

    /// Trades per hour of day for the daily bitcoin and NFL markets
    pub fn hourly_activity(&self, path: &Path, since: NaiveDate) -> Result<Vec<HourlyActivity>> {
        let sql = source_query(queries::HOURLY_ACTIVITY, path)?;
        self.collect_rows(&sql, duckdb::params![since_param(since)], |row| {
            Ok(HourlyActivity {
                market: row.get(0)?,
                hour: row.get(1)?,
                trades: row.get(2)?,
            })
        })
    }

    /// Bucketed gaps between consecutive size-1 trades on the same contract
    pub fn size_one_gaps(
        &self,
        path: &Path,
        report_prefix: Option<&str>,
        since: NaiveDate,
    ) -> Result<Vec<GapBucket>> {
        let sql = source_query(queries::SIZE_ONE_GAPS, path)?;
        self.collect_rows(
            &sql,
            duckdb::params![report_prefix.unwrap_or(""), since_param(since)],
            |row| Ok(GapBucket::from_number(row.get(0)?, row.get(1)?)),
        )
    }

    /// Contracts traded per market family, largest first
    pub fn volume_by_market(&self, path: &Path, since: NaiveDate) -> Result<Vec<MarketVolume>> {
        let sql = source_query(queries::VOLUME_BY_MARKET, path)?
            .replace("{market}", queries::MARKET_CASE);
        self.collect_rows(&sql, duckdb::params![since_param(since)], |row| {
            Ok(MarketVolume {
                market: row.get(0)?,
                volume: row.get(1)?,
            })
        })
    }

    /// Repetitive rate of the major sports leagues and the daily bitcoin market
    pub fn sports_vs_crypto(&self, path: &Path, since: NaiveDate) -> Result<Vec<CategoryRepetition>> {
        let sql = source_query(queries::SPORTS_VS_CRYPTO, path)?
            .replace("{market}", queries::COMPARISON_CASE);
        self.collect_rows(&sql, duckdb::params![since_param(since)], |row| {
            Ok(CategoryRepetition {
                market: row.get(0)?,
                category: row.get(1)?,
                total: row.get(2)?,
                repetitive: row.get(3)?,
            })
        })
    }

    fn collect_rows<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: duckdb::Params,
        F: FnMut(&duckdb::Row<'_>) -> duckdb::Result<T>,
    {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// `sql` with `{source}` bound to an existing CSV or Parquet file
fn source_query(sql: &str, path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(AppError::NotFound(format!("{} does not exist", path.display())));
    }
    Ok(sql.replace("{source}", &table_function(path)?))
}

fn since_param(since: NaiveDate) -> String {
    since.format(DATE_FORMAT).to_string()
}

/// `read_parquet(..)` for `.parquet` files, a typed `read_csv(..)` otherwise
fn table_function(path: &Path) -> Result<String> {
    let literal = sql_literal(path)?;
    let is_parquet = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false);

    if is_parquet {
        Ok(format!("read_parquet('{}')", literal))
    } else {
        Ok(format!(
            "read_csv('{}', header = true, columns = {})",
            literal,
            queries::CSV_COLUMNS
        ))
    }
}

/// Path contents for a single-quoted SQL string
fn sql_literal(path: &Path) -> Result<String> {
    let text = path
        .to_str()
        .ok_or_else(|| AppError::Validation(format!("Path is not valid UTF-8: {}", path.display())))?;
    Ok(text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "ticker_name,report_ticker,date,create_ts,contracts_traded,price";

    fn row(ticker: &str, report: &str, ts: &str, size: i64) -> String {
        format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",{},50",
            ticker,
            report,
            &ts[..10],
            ts,
            size
        )
    }

    fn since() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn sample_table(dir: &Path) -> std::path::PathBuf {
        let rows = [
            // 4 equal sizes 10 s apart: the two middle trades are repetitive
            row("T1", "KXBTCD-25JAN05", "2025-01-05 10:00:00", 5),
            row("T1", "KXBTCD-25JAN05", "2025-01-05 10:00:10", 5),
            row("T1", "KXBTCD-25JAN05", "2025-01-05 10:00:20", 5),
            row("T1", "KXBTCD-25JAN05", "2025-01-05 10:00:30", 5),
            // equal sizes but 2 minutes apart
            row("T2", "KXBTCD-25JAN06", "2025-01-06 10:00:00", 3),
            row("T2", "KXBTCD-25JAN06", "2025-01-06 10:02:00", 3),
            row("T2", "KXBTCD-25JAN06", "2025-01-06 10:04:00", 3),
            // size-1 trades 1 s then 2 s apart: the middle one is repetitive
            row("T6", "KXBTCD-25JAN08", "2025-01-08 09:00:00", 1),
            row("T6", "KXBTCD-25JAN08", "2025-01-08 09:00:01", 1),
            row("T6", "KXBTCD-25JAN08", "2025-01-08 09:00:03", 1),
            // sizes differ
            row("T3", "KXNFLGAME-25FEB09", "2025-02-09 20:00:00", 1),
            row("T3", "KXNFLGAME-25FEB09", "2025-02-09 20:00:05", 2),
            row("T3", "KXNFLGAME-25FEB09", "2025-02-09 20:00:09", 1),
            // unclassified market
            row("T5", "KXWEATHER-25JAN07", "2025-01-07 12:00:00", 2),
            // before the analysis window
            row("T4", "KXNBAGAME-24DEC31", "2024-12-31 23:59:59", 1),
        ];
        let path = dir.join("all_trades.csv");
        fs::write(&path, format!("{}\n{}\n", HEADER, rows.join("\n"))).unwrap();
        path
    }

    #[test]
    fn test_export_parquet_round_trip_count() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let parquet_path = dir.path().join("all_trades.parquet");

        let warehouse = TradeWarehouse::open_in_memory().unwrap();
        let rows = warehouse.export_parquet(&csv_path, &parquet_path).unwrap();

        assert_eq!(rows, 15);
        assert!(parquet_path.is_file());
        assert_eq!(warehouse.count_rows(&csv_path).unwrap(), 15);
    }

    #[test]
    fn test_export_requires_combined_table() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = TradeWarehouse::open_in_memory().unwrap();
        let err = warehouse
            .export_parquet(&dir.path().join("missing.csv"), &dir.path().join("out.parquet"))
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_analysis_requires_source() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = TradeWarehouse::open_in_memory().unwrap();
        let err = warehouse
            .volume_by_market(&dir.path().join("missing.parquet"), since())
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_repetitive_by_month() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let warehouse = TradeWarehouse::open_in_memory().unwrap();

        let all = warehouse.repetitive_by_month(&csv_path, None, since()).unwrap();
        assert_eq!(
            all,
            vec![
                MonthlyRepetition { month: "2025-01".into(), total: 11, repetitive: 3 },
                MonthlyRepetition { month: "2025-02".into(), total: 3, repetitive: 0 },
            ]
        );

        let btc = warehouse
            .repetitive_by_month(&csv_path, Some("KXBTCD"), since())
            .unwrap();
        assert_eq!(btc.len(), 1);
        assert!((btc[0].rate() - 30.0).abs() < 1e-9);

        let earlier = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let with_december = warehouse.repetitive_by_month(&csv_path, None, earlier).unwrap();
        assert_eq!(with_december[0].month, "2024-12");
    }

    #[test]
    fn test_repetitive_by_market() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let warehouse = TradeWarehouse::open_in_memory().unwrap();

        let markets = warehouse.repetitive_by_market(&csv_path, since(), 0).unwrap();
        assert_eq!(
            markets,
            vec![
                MarketRepetition { market: "Bitcoin Daily".into(), total: 10, repetitive: 3 },
                MarketRepetition { market: "NFL".into(), total: 3, repetitive: 0 },
            ]
        );

        let busy = warehouse.repetitive_by_market(&csv_path, since(), 5).unwrap();
        assert_eq!(busy.len(), 1);
        assert_eq!(busy[0].market, "Bitcoin Daily");
    }

    #[test]
    fn test_repetitive_by_size() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let warehouse = TradeWarehouse::open_in_memory().unwrap();

        let sizes = warehouse
            .repetitive_by_size(&csv_path, Some("KXBTCD"), since())
            .unwrap();
        assert_eq!(
            sizes,
            vec![
                SizeRepetition { size: 1, total: 3, repetitive: 1 },
                SizeRepetition { size: 3, total: 3, repetitive: 0 },
                SizeRepetition { size: 5, total: 4, repetitive: 2 },
            ]
        );
    }

    #[test]
    fn test_hourly_activity() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let warehouse = TradeWarehouse::open_in_memory().unwrap();

        let hours = warehouse.hourly_activity(&csv_path, since()).unwrap();
        assert_eq!(
            hours,
            vec![
                HourlyActivity { market: "Bitcoin Daily".into(), hour: 9, trades: 3 },
                HourlyActivity { market: "Bitcoin Daily".into(), hour: 10, trades: 7 },
                HourlyActivity { market: "NFL".into(), hour: 20, trades: 3 },
            ]
        );
    }

    #[test]
    fn test_size_one_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let warehouse = TradeWarehouse::open_in_memory().unwrap();

        let btc = warehouse.size_one_gaps(&csv_path, Some("KXBTCD"), since()).unwrap();
        assert_eq!(
            btc,
            vec![
                GapBucket { label: "1 second", trades: 1 },
                GapBucket { label: "2 seconds", trades: 1 },
            ]
        );

        // NFL size-1 trades are 9 s apart once the size-2 trade is filtered out
        let all = warehouse.size_one_gaps(&csv_path, None, since()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2], GapBucket { label: "5-9 seconds", trades: 1 });
    }

    #[test]
    fn test_volume_by_market() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let warehouse = TradeWarehouse::open_in_memory().unwrap();

        let volumes = warehouse.volume_by_market(&csv_path, since()).unwrap();
        assert_eq!(
            volumes,
            vec![
                MarketVolume { market: "Bitcoin Daily".into(), volume: 32 },
                MarketVolume { market: "NFL".into(), volume: 4 },
                MarketVolume { market: "Other".into(), volume: 2 },
            ]
        );
    }

    #[test]
    fn test_sports_vs_crypto() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let warehouse = TradeWarehouse::open_in_memory().unwrap();

        let comparison = warehouse.sports_vs_crypto(&csv_path, since()).unwrap();
        assert_eq!(
            comparison,
            vec![
                CategoryRepetition {
                    market: "NFL".into(),
                    category: "Sports".into(),
                    total: 3,
                    repetitive: 0,
                },
                CategoryRepetition {
                    market: "Bitcoin Daily".into(),
                    category: "Crypto".into(),
                    total: 10,
                    repetitive: 3,
                },
            ]
        );
    }

    #[test]
    fn test_parquet_and_csv_analysis_agree() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = sample_table(dir.path());
        let parquet_path = dir.path().join("all_trades.parquet");
        let warehouse = TradeWarehouse::open_in_memory().unwrap();
        warehouse.export_parquet(&csv_path, &parquet_path).unwrap();

        assert_eq!(
            warehouse.repetitive_by_month(&csv_path, None, since()).unwrap(),
            warehouse.repetitive_by_month(&parquet_path, None, since()).unwrap()
        );
        assert_eq!(
            warehouse.size_one_gaps(&csv_path, None, since()).unwrap(),
            warehouse.size_one_gaps(&parquet_path, None, since()).unwrap()
        );
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(sql_literal(Path::new("/tmp/o'brien.csv")).unwrap(), "/tmp/o''brien.csv");
    }
}
