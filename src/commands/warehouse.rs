//! Parquet conversion and analysis commands

use crate::db::duckdb::models::percent;
use crate::services::WarehouseService;
use crate::state::AppState;
use anyhow::Context;

/// Convert the combined CSV table to Parquet
pub fn convert(state: &AppState) -> anyhow::Result<()> {
    let result = WarehouseService::convert(state).context("Parquet conversion failed")?;
    println!("Wrote {} rows to {}", result.rows, result.target.display());
    Ok(())
}

/// Print the repetitive-trade report
pub fn analyze(state: &AppState, report_prefix: Option<&str>) -> anyhow::Result<()> {
    let result = WarehouseService::analyze(state, report_prefix).context("Analysis failed")?;

    println!(
        "Source: {} (trades since {}, report tickers: {})",
        result.source.display(),
        result.since,
        report_prefix.unwrap_or("all")
    );

    println!("\nRepetitive rate by month");
    println!("{:<8} {:>12} {:>12} {:>8}", "month", "trades", "repetitive", "rate");
    for month in &result.months {
        println!(
            "{:<8} {:>12} {:>12} {:>7.2}%",
            month.month,
            month.total,
            month.repetitive,
            month.rate()
        );
    }
    println!(
        "{:<8} {:>12} {:>12}",
        "total",
        result.total_trades(),
        result.repetitive_trades()
    );

    println!(
        "\nRepetitive rate by market (more than {} trades)",
        state.config.min_market_trades
    );
    for market in &result.markets {
        println!(
            "{:<16} {:>12} {:>12} {:>7.2}%",
            market.market,
            market.total,
            market.repetitive,
            market.rate()
        );
    }

    println!("\nRepetitive rate by trade size");
    for size in &result.sizes {
        println!(
            "{:<16} {:>12} {:>12} {:>7.2}%",
            size.size,
            size.total,
            size.repetitive,
            size.rate()
        );
    }

    println!("\nSports vs crypto");
    for entry in &result.comparison {
        println!(
            "{:<16} {:<8} {:>12} {:>12} {:>7.2}%",
            entry.market,
            entry.category,
            entry.total,
            entry.repetitive,
            entry.rate()
        );
    }

    println!("\nGaps between size-1 trades");
    for bucket in &result.gaps {
        println!("{:<16} {:>12}", bucket.label, bucket.trades);
    }

    println!("\nHourly share of trades");
    for hour in &result.hourly {
        println!(
            "{:<16} {:02}:00 {:>12} {:>7.2}%",
            hour.market,
            hour.hour,
            hour.trades,
            percent(hour.trades, result.market_trades(&hour.market))
        );
    }

    println!("\nVolume share by market");
    let total_volume = result.total_volume();
    for volume in &result.volumes {
        println!(
            "{:<16} {:>14} {:>7.2}%",
            volume.market,
            volume.volume,
            percent(volume.volume, total_volume)
        );
    }
    Ok(())
}
