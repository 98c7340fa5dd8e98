//! Trade report sources

pub mod types;
pub mod http;

use async_trait::async_trait;
use chrono::NaiveDate;
use types::DayReport;

pub use http::HttpReportSource;

/// Source of daily trade reports
///
/// A fetch never fails loudly: any transport error, bad status, timeout or
/// malformed body is reported as `None` and the caller treats the day as
/// missing.
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Source name for log lines
    fn name(&self) -> &'static str;

    /// Fetch the report for one calendar day
    async fn fetch_day(&self, date: NaiveDate) -> Option<DayReport>;
}
