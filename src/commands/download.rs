//! Date-range download command

use crate::calendar::yesterday;
use crate::services::DownloadService;
use crate::state::AppState;
use anyhow::Context;
use chrono::NaiveDate;

/// Download from `start` (default: configured start date) through yesterday
pub async fn run(state: &AppState, start: Option<NaiveDate>) -> anyhow::Result<()> {
    let start = start.unwrap_or(state.config.default_start_date);
    let end = yesterday();
    println!("Downloading {} through {} into {}", start, end, state.store.dir().display());

    let metadata = DownloadService::download_range(state, start, end)
        .await
        .context("Download aborted")?;

    println!("Days requested:  {}", metadata.total_days);
    println!("Days downloaded: {}", metadata.successful_days);
    println!("Days missing:    {}", metadata.total_days - metadata.successful_days);
    println!("Trades:          {}", metadata.total_trades);
    println!("Metadata:        {}", state.store.metadata_path().display());
    Ok(())
}
