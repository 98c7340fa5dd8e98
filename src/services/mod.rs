//! Services Layer
//!
//! Business logic behind the command-line operations. Commands parse
//! arguments and print results; services do the work against `AppState`.
//!
//! # Architecture
//!
//! ```text
//! CLI --> Commands --> Services --> TradeSource (HTTP)
//!                               --> DayFileStore (disk)
//!                               --> TradeWarehouse (DuckDB)
//! ```
//!
//! # Services
//!
//! - `ProbeService` - Single-day shape check of the remote source
//! - `DownloadService` - Batched date-range download and run metadata
//! - `CombineService` - Day files to one CSV table
//! - `WarehouseService` - Parquet conversion and repetitive-trade analysis

pub mod probe_service;
pub mod download_service;
pub mod combine_service;
pub mod warehouse_service;

pub use probe_service::{ProbeService, ProbeReport};
pub use download_service::{DownloadService, RunMetadata, DayResult};
pub use combine_service::{CombineService, CombineSummary};
pub use warehouse_service::{WarehouseService, ConvertResult, AnalysisResult};
