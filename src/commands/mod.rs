//! Command-line operations
//!
//! One module per operation. Each parses nothing itself: arguments arrive as
//! a `Command`, results are printed for the operator.

pub mod probe;
pub mod download;
pub mod combine;
pub mod warehouse;

use crate::config::parse_date;
use crate::error::Result;
use crate::state::AppState;
use chrono::NaiveDate;

pub const USAGE: &str = "\
Usage: kalshi-trades <operation> [args]

Operations:
  probe [YYYY-MM-DD]        Fetch one day and summarize its shape
  download [YYYY-MM-DD]     Download every day from the start date to yesterday
  combine                   Merge all day files into the combined CSV table
  convert                   Convert the combined CSV table to Parquet
  analyze [REPORT_PREFIX]   Repetitive-trade, timing and volume breakdowns
  help                      Show this message

Environment:
  KALSHI_DATA_DIR, KALSHI_REPORT_BASE_URL, KALSHI_START_DATE, KALSHI_PROBE_DATE,
  KALSHI_BATCH_SIZE, KALSHI_BATCH_DELAY_MS, KALSHI_REQUEST_TIMEOUT_SECS,
  KALSHI_COMBINED_FILE, KALSHI_PARQUET_FILE, KALSHI_USE_JQ, KALSHI_SKIP_EXISTING,
  KALSHI_ANALYSIS_SINCE, KALSHI_MIN_MARKET_TRADES, RUST_LOG";

/// A parsed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Probe { date: Option<NaiveDate> },
    Download { start: Option<NaiveDate> },
    Combine,
    Convert,
    Analyze { report_prefix: Option<String> },
}

/// Parse operation name and arguments.
///
/// `Ok(None)` means "print usage": no operation, `help`, or an unknown name.
pub fn parse_args<I, S>(args: I) -> Result<Option<Command>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    let Some(operation) = args.first() else {
        return Ok(None);
    };
    let argument = args.get(1).map(String::as_str);

    let command = match operation.as_str() {
        "probe" => Command::Probe {
            date: argument.map(parse_date).transpose()?,
        },
        "download" => Command::Download {
            start: argument.map(parse_date).transpose()?,
        },
        "combine" => Command::Combine,
        "convert" => Command::Convert,
        "analyze" => Command::Analyze {
            report_prefix: argument.map(str::to_string),
        },
        _ => return Ok(None),
    };

    Ok(Some(command))
}

/// Run a parsed command
pub async fn execute(state: &AppState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Probe { date } => probe::run(state, date).await,
        Command::Download { start } => download::run(state, start).await,
        Command::Combine => combine::run(state).await,
        Command::Convert => warehouse::convert(state),
        Command::Analyze { report_prefix } => warehouse::analyze(state, report_prefix.as_deref()),
    }
}
