//! SQL used against the combined table
//!
//! `{source}` is replaced with a table function over the CSV or Parquet file,
//! `{market}` with one of the market classification expressions below.

/// Explicit schema for the combined CSV so type sniffing never guesses
pub const CSV_COLUMNS: &str = "{'ticker_name': 'VARCHAR', 'report_ticker': 'VARCHAR', \
'date': 'DATE', 'create_ts': 'VARCHAR', 'contracts_traded': 'BIGINT', 'price': 'BIGINT'}";

pub const EXPORT_PARQUET: &str = "COPY (SELECT * FROM {source}) TO '{target}' (FORMAT PARQUET)";

pub const COUNT_ROWS: &str = "SELECT COUNT(*) FROM {source}";

/// Market family of a report ticker
pub const MARKET_CASE: &str = r#"CASE
            WHEN report_ticker LIKE 'KXNFL%' THEN 'NFL'
            WHEN report_ticker LIKE 'KXNCAAF%' THEN 'NCAA Football'
            WHEN report_ticker LIKE 'KXNBA%' THEN 'NBA'
            WHEN report_ticker LIKE 'KXMLB%' THEN 'MLB'
            WHEN report_ticker LIKE 'KXMARMAD%' THEN 'March Madness'
            WHEN report_ticker LIKE 'KXBTCD%' THEN 'Bitcoin Daily'
            WHEN report_ticker LIKE 'KXATP%' THEN 'Tennis'
            WHEN report_ticker = 'KXFEDDECISION' THEN 'Fed Decisions'
            WHEN report_ticker LIKE 'KXPGA%' THEN 'Golf'
            ELSE 'Other'
        END"#;

/// Major sports leagues and the daily bitcoin market; NULL for the rest
pub const COMPARISON_CASE: &str = r#"CASE
            WHEN report_ticker LIKE 'KXNFL%' THEN 'NFL'
            WHEN report_ticker LIKE 'KXNCAAF%' THEN 'NCAA FB'
            WHEN report_ticker LIKE 'KXNBA%' THEN 'NBA'
            WHEN report_ticker LIKE 'KXMLB%' THEN 'MLB'
            WHEN report_ticker LIKE 'KXBTCD%' THEN 'Bitcoin Daily'
            ELSE NULL
        END"#;

/// A trade is repetitive when the previous and next trade on the same
/// contract have the same size and the previous one was 1-60 s earlier.
pub const REPETITIVE_BY_MONTH: &str = r#"
WITH trade_patterns AS (
    SELECT
        strftime(create_ts::TIMESTAMP, '%Y-%m') AS month,
        contracts_traded,
        LAG(contracts_traded) OVER (PARTITION BY ticker_name ORDER BY create_ts) AS prev_size,
        LEAD(contracts_traded) OVER (PARTITION BY ticker_name ORDER BY create_ts) AS next_size,
        EXTRACT(EPOCH FROM (create_ts::TIMESTAMP
            - LAG(create_ts::TIMESTAMP) OVER (PARTITION BY ticker_name ORDER BY create_ts))) AS gap
    FROM {source}
    WHERE starts_with(report_ticker, ?)
      AND create_ts::TIMESTAMP >= CAST(? AS TIMESTAMP)
)
SELECT
    month,
    COUNT(*) AS total,
    COUNT(*) FILTER (
        WHERE contracts_traded = prev_size
          AND contracts_traded = next_size
          AND gap BETWEEN 1 AND 60
    ) AS repetitive
FROM trade_patterns
GROUP BY month
ORDER BY month
"#;

/// Repetitive rate per market family, highest rate first. Families
/// with too few trades to be meaningful are dropped.
pub const REPETITIVE_BY_MARKET: &str = r#"
WITH trade_patterns AS (
    SELECT
        {market} AS market,
        contracts_traded,
        LAG(contracts_traded) OVER (PARTITION BY ticker_name ORDER BY create_ts) AS prev_size,
        LEAD(contracts_traded) OVER (PARTITION BY ticker_name ORDER BY create_ts) AS next_size,
        EXTRACT(EPOCH FROM (create_ts::TIMESTAMP
            - LAG(create_ts::TIMESTAMP) OVER (PARTITION BY ticker_name ORDER BY create_ts))) AS gap
    FROM {source}
    WHERE create_ts::TIMESTAMP >= CAST(? AS TIMESTAMP)
),
counted AS (
    SELECT
        market,
        COUNT(*) AS total,
        COUNT(*) FILTER (
            WHERE contracts_traded = prev_size
              AND contracts_traded = next_size
              AND gap BETWEEN 1 AND 60
        ) AS repetitive
    FROM trade_patterns
    WHERE market != 'Other'
    GROUP BY market
    HAVING COUNT(*) > ?
)
SELECT market, total, repetitive
FROM counted
ORDER BY repetitive::DOUBLE / total DESC, market
"#;

/// Repetitive rate for a fixed ladder of common trade sizes
pub const REPETITIVE_BY_SIZE: &str = r#"
WITH trade_patterns AS (
    SELECT
        contracts_traded,
        LAG(contracts_traded) OVER (PARTITION BY ticker_name ORDER BY create_ts) AS prev_size,
        LEAD(contracts_traded) OVER (PARTITION BY ticker_name ORDER BY create_ts) AS next_size,
        EXTRACT(EPOCH FROM (create_ts::TIMESTAMP
            - LAG(create_ts::TIMESTAMP) OVER (PARTITION BY ticker_name ORDER BY create_ts))) AS gap
    FROM {source}
    WHERE starts_with(report_ticker, ?)
      AND create_ts::TIMESTAMP >= CAST(? AS TIMESTAMP)
)
SELECT
    contracts_traded AS size,
    COUNT(*) AS total,
    COUNT(*) FILTER (
        WHERE contracts_traded = prev_size
          AND contracts_traded = next_size
          AND gap BETWEEN 1 AND 60
    ) AS repetitive
FROM trade_patterns
WHERE contracts_traded IN (1, 2, 3, 5, 10, 25, 50, 100)
GROUP BY contracts_traded
ORDER BY contracts_traded
"#;

/// Trades per hour of day for the daily bitcoin and NFL markets
pub const HOURLY_ACTIVITY: &str = r#"
SELECT
    CASE
        WHEN report_ticker LIKE 'KXBTCD%' THEN 'Bitcoin Daily'
        ELSE 'NFL'
    END AS market,
    EXTRACT(HOUR FROM create_ts::TIMESTAMP)::BIGINT AS hour,
    COUNT(*) AS trades
FROM {source}
WHERE create_ts::TIMESTAMP >= CAST(? AS TIMESTAMP)
  AND (report_ticker LIKE 'KXBTCD%' OR report_ticker LIKE 'KXNFL%')
GROUP BY market, hour
ORDER BY market, hour
"#;

/// Gaps between consecutive size-1 trades on the same contract
pub const SIZE_ONE_GAPS: &str = r#"
WITH gaps AS (
    SELECT
        EXTRACT(EPOCH FROM (create_ts::TIMESTAMP
            - LAG(create_ts::TIMESTAMP) OVER (PARTITION BY ticker_name ORDER BY create_ts))) AS gap_seconds
    FROM {source}
    WHERE starts_with(report_ticker, ?)
      AND create_ts::TIMESTAMP >= CAST(? AS TIMESTAMP)
      AND contracts_traded = 1
),
bucketed AS (
    SELECT
        CASE
            WHEN gap_seconds < 1 THEN 1
            WHEN gap_seconds < 2 THEN 2
            WHEN gap_seconds < 3 THEN 3
            WHEN gap_seconds < 5 THEN 4
            WHEN gap_seconds < 10 THEN 5
            WHEN gap_seconds < 30 THEN 6
            WHEN gap_seconds < 60 THEN 7
            ELSE 8
        END AS bucket
    FROM gaps
    WHERE gap_seconds IS NOT NULL AND gap_seconds >= 0
)
SELECT bucket, COUNT(*) AS trades
FROM bucketed
GROUP BY bucket
ORDER BY bucket
"#;

/// Contracts traded per market family
pub const VOLUME_BY_MARKET: &str = r#"
SELECT
    {market} AS market,
    SUM(contracts_traded)::BIGINT AS volume
FROM {source}
WHERE create_ts::TIMESTAMP >= CAST(? AS TIMESTAMP)
GROUP BY market
ORDER BY volume DESC, market
"#;

/// Repetitive rate of the sports leagues next to the daily bitcoin market
pub const SPORTS_VS_CRYPTO: &str = r#"
WITH trade_patterns AS (
    SELECT
        {market} AS market,
        CASE
            WHEN report_ticker LIKE 'KXBTCD%' THEN 'Crypto'
            ELSE 'Sports'
        END AS category,
        contracts_traded,
        LAG(contracts_traded) OVER (PARTITION BY ticker_name ORDER BY create_ts) AS prev_size,
        LEAD(contracts_traded) OVER (PARTITION BY ticker_name ORDER BY create_ts) AS next_size,
        EXTRACT(EPOCH FROM (create_ts::TIMESTAMP
            - LAG(create_ts::TIMESTAMP) OVER (PARTITION BY ticker_name ORDER BY create_ts))) AS gap
    FROM {source}
    WHERE create_ts::TIMESTAMP >= CAST(? AS TIMESTAMP)
),
counted AS (
    SELECT
        market,
        category,
        COUNT(*) AS total,
        COUNT(*) FILTER (
            WHERE contracts_traded = prev_size
              AND contracts_traded = next_size
              AND gap BETWEEN 1 AND 60
        ) AS repetitive
    FROM trade_patterns
    WHERE market IS NOT NULL
    GROUP BY market, category
)
SELECT market, category, total, repetitive
FROM counted
ORDER BY category DESC, repetitive::DOUBLE / total, market
"#;
