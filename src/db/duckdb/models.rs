//! DuckDB result models

/// Share of `part` in `whole`, in percent
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Repetitive-trade counts for one calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRepetition {
    /// `YYYY-MM` of `create_ts`
    pub month: String,
    pub total: i64,
    pub repetitive: i64,
}

impl MonthlyRepetition {
    /// Repetitive share in percent
    pub fn rate(&self) -> f64 {
        percent(self.repetitive, self.total)
    }
}

/// Repetitive-trade counts for one market family
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRepetition {
    pub market: String,
    pub total: i64,
    pub repetitive: i64,
}

impl MarketRepetition {
    pub fn rate(&self) -> f64 {
        percent(self.repetitive, self.total)
    }
}

/// Repetitive-trade counts for one trade size
#[derive(Debug, Clone, PartialEq)]
pub struct SizeRepetition {
    pub size: i64,
    pub total: i64,
    pub repetitive: i64,
}

impl SizeRepetition {
    pub fn rate(&self) -> f64 {
        percent(self.repetitive, self.total)
    }
}

/// Sports league or crypto market with its repetitive counts
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRepetition {
    pub market: String,
    /// `Sports` or `Crypto`
    pub category: String,
    pub total: i64,
    pub repetitive: i64,
}

impl CategoryRepetition {
    pub fn rate(&self) -> f64 {
        percent(self.repetitive, self.total)
    }
}

/// Trades in one hour of the day for one market
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyActivity {
    pub market: String,
    /// 0-23
    pub hour: i64,
    pub trades: i64,
}

/// Labels of the size-1 gap buckets, indexed by bucket number - 1
pub const GAP_BUCKETS: [&str; 8] = [
    "0 (same second)",
    "1 second",
    "2 seconds",
    "3-4 seconds",
    "5-9 seconds",
    "10-29 seconds",
    "30-59 seconds",
    "60+ seconds",
];

/// Count of size-1 trades whose gap to the previous one falls in a bucket
#[derive(Debug, Clone, PartialEq)]
pub struct GapBucket {
    pub label: &'static str,
    pub trades: i64,
}

impl GapBucket {
    /// Bucket from its 1-based number; out-of-range numbers land in the last bucket
    pub fn from_number(bucket: i64, trades: i64) -> Self {
        let index = usize::try_from(bucket - 1)
            .unwrap_or(0)
            .min(GAP_BUCKETS.len() - 1);
        Self {
            label: GAP_BUCKETS[index],
            trades,
        }
    }
}

/// Contracts traded in one market family
#[derive(Debug, Clone, PartialEq)]
pub struct MarketVolume {
    pub market: String,
    pub volume: i64,
}
