//! Combine command

use crate::services::CombineService;
use crate::state::AppState;
use anyhow::Context;

/// Merge every day file into the combined CSV table
pub async fn run(state: &AppState) -> anyhow::Result<()> {
    let summary = CombineService::combine(state)
        .await
        .context("Combine aborted")?;

    println!(
        "Processed {} of {} files ({} via jq)",
        summary.files_processed, summary.files_found, summary.delegated
    );
    for skipped in &summary.skipped {
        println!("  skipped {}: {}", skipped.file_name, skipped.reason);
    }
    println!("Rows: {} -> {}", summary.rows, summary.output.display());
    Ok(())
}
