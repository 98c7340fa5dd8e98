//! Public S3 reporting bucket adapter

use crate::config::{AppConfig, DATE_FORMAT};
use crate::error::Result;
use crate::source::types::DayReport;
use crate::source::TradeSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches `{base_url}{YYYY-MM-DD}.json` with a per-request timeout
pub struct HttpReportSource {
    client: Client,
    base_url: String,
}

impl HttpReportSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.report_base_url.clone(), config.request_timeout())
    }

    /// URL of the report for `date`
    pub fn report_url(&self, date: NaiveDate) -> String {
        format!("{}{}.json", self.base_url, date.format(DATE_FORMAT))
    }

    async fn try_fetch(&self, date: NaiveDate) -> Result<Option<DayReport>> {
        let url = self.report_url(date);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("No report for {} (HTTP {})", date, status.as_u16());
            return Ok(None);
        }

        let body = response.bytes().await?;
        DayReport::from_body(date, body.to_vec()).map(Some)
    }
}

#[async_trait]
impl TradeSource for HttpReportSource {
    fn name(&self) -> &'static str {
        "kalshi-s3"
    }

    async fn fetch_day(&self, date: NaiveDate) -> Option<DayReport> {
        match self.try_fetch(date).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Fetch failed for {}: {}", date, e);
                None
            }
        }
    }
}
