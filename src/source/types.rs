//! Trade report types

use crate::error::Result;
use chrono::NaiveDate;
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer};

/// Column order of the combined table
pub const TRADE_FIELDS: [&str; 6] = [
    "ticker_name",
    "report_ticker",
    "date",
    "create_ts",
    "contracts_traded",
    "price",
];

/// Largest magnitude a count or price may have; beyond it a JSON number is
/// no longer an exact integer for every reader
pub const MAX_WHOLE_NUMBER: i64 = 9_007_199_254_740_991;

/// One executed trade as published in the daily report
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeRecord {
    /// Specific contract, e.g. `KXBTCD-25JAN0117-T94999.99`
    pub ticker_name: String,
    /// Market/category the contract belongs to
    pub report_ticker: String,
    pub date: String,
    pub create_ts: String,
    #[serde(deserialize_with = "whole_number")]
    pub contracts_traded: i64,
    /// Price in cents, 0-100
    #[serde(deserialize_with = "whole_number")]
    pub price: i64,
}

/// Integer-valued JSON number; `3.0` and `1e2` are accepted, `50.5` is not
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    let value = match number.as_i64() {
        Some(value) => Some(value),
        None => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_WHOLE_NUMBER as f64)
            .map(|f| f as i64),
    };

    value
        .filter(|v| v.abs() <= MAX_WHOLE_NUMBER)
        .ok_or_else(|| de::Error::custom(format!("expected a whole number, got {}", number)))
}

/// Decode a day file body into trades.
///
/// Every element must be a complete trade or the whole body is rejected.
/// Duplicate keys resolve to their last value.
pub fn parse_trades(body: &[u8]) -> Result<Vec<TradeRecord>> {
    let items: Vec<serde_json::Value> = serde_json::from_slice(body)?;
    let records = items
        .iter()
        .map(|item| TradeRecord::deserialize(item))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Raw response for one calendar day.
///
/// The body is kept byte for byte so it can be persisted without re-encoding.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub date: NaiveDate,
    pub body: Vec<u8>,
    pub trade_count: usize,
}

impl DayReport {
    /// Wrap a response body, rejecting anything that is not a JSON array
    pub fn from_body(date: NaiveDate, body: Vec<u8>) -> Result<Self> {
        let trade_count = count_records(&body)?;
        Ok(Self {
            date,
            body,
            trade_count,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.trade_count == 0
    }

    /// Decode the body as loosely typed JSON objects
    pub fn raw_records(&self) -> Result<Vec<serde_json::Value>> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Number of elements in a JSON array without materializing them
pub fn count_records(body: &[u8]) -> Result<usize> {
    let items: Vec<IgnoredAny> = serde_json::from_slice(body)?;
    Ok(items.len())
}
