//! Kalshi Trade Archive
//!
//! Downloads the daily public trade reports, keeps one JSON file per day,
//! merges them into a single CSV table and runs the repetitive-trade
//! analysis over it.

pub mod calendar;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod source;
pub mod state;
pub mod storage;

use anyhow::Context;
use config::AppConfig;
use error::AppError;
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kalshi_trade_archive=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Parse `args` (without the program name) and run the operation.
///
/// Invalid arguments or configuration are reported together with the usage
/// text and nothing runs; only failures of a started operation are errors.
pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    init_tracing();

    let command = match commands::parse_args(&args) {
        Ok(Some(command)) => command,
        Ok(None) => {
            println!("{}", commands::USAGE);
            return Ok(());
        }
        Err(e) => {
            report_invalid_invocation("Invalid arguments", &e);
            return Ok(());
        }
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report_invalid_invocation("Invalid configuration", &e);
            return Ok(());
        }
    };
    let state = AppState::new(config).context("Failed to initialize")?;

    tracing::info!("Running {:?}", command);
    commands::execute(&state, command).await
}

fn report_invalid_invocation(what: &str, err: &AppError) {
    eprintln!("{}: {}\n", what, err);
    println!("{}", commands::USAGE);
}
