//! This crate implements the experiments measured by the harness, including:
//! - synthetic sales and taxi-trip datasets
//! - CSV and Parquet reads and writes
//! - Parquet scans with projection and filter pushdown, on a blocking and a
//!   streaming engine
//! - the benchmark suites tying those experiments to reports and charts

pub mod io;
pub mod scan;
pub mod session;
pub mod sink;
pub mod suite;
pub mod table;
pub mod util;
