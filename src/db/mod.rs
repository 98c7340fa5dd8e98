//! Analytic storage
//!
//! - `duckdb` - columnar export and pattern queries over the combined table

pub mod duckdb;
