//! Single-day probe command

use crate::services::ProbeService;
use crate::state::AppState;
use anyhow::Context;
use chrono::NaiveDate;

/// Fetch one day (default: the configured probe date) and print its shape
pub async fn run(state: &AppState, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let date = date.unwrap_or(state.config.probe_date);
    println!("Probing {} ...", date);

    let report = ProbeService::probe(state, date)
        .await
        .with_context(|| format!("Failed to summarize report for {}", date))?;

    let Some(report) = report else {
        println!("No data for {}", date);
        return Ok(());
    };

    println!("Records:              {}", report.record_count);
    if report.malformed_records > 0 {
        println!("Malformed (ignored):  {}", report.malformed_records);
    }
    println!("Fields:               {}", report.field_names.join(", "));
    println!("Total volume:         {} contracts", report.total_volume);
    println!("Unique tickers:       {}", report.unique_tickers);
    println!("Unique report groups: {}", report.unique_report_tickers);
    println!(
        "Extreme prices:       {} ({:.1}% at <=5 or >=95)",
        report.extreme_price_trades,
        report.extreme_price_share * 100.0
    );
    println!("Samples:");
    for sample in &report.samples {
        println!("  {}", serde_json::to_string(sample)?);
    }

    Ok(())
}
