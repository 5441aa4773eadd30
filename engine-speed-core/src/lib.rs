//! This crate provides the benchmarking harness shared by every experiment:
//! - [`timer`]: time a zero-argument operation over N runs and take the mean
//! - [`runner`]: measure an ordered batch of labeled experiments
//! - [`result`]: ordered timing results and their relative-speed view
//! - [`report`] / [`chart`]: console tables and bar charts
//!
//! Measurement is single-threaded and sequential: an experiment runs to
//! completion before the next one starts.

pub mod chart;
pub mod error;
pub mod experiment;
pub mod report;
pub mod result;
pub mod runner;
pub mod timer;

pub use chart::{render_chart, render_panels, Panel};
pub use error::{Error, Result};
pub use experiment::{Experiment, ExperimentSet};
pub use report::{report, write_report, ReportOptions};
pub use result::{normalize, Entry, RelativeResult, Series, TimingResult, ValueKind};
pub use runner::run_all;
pub use timer::{measure, Measurement, DEFAULT_RUNS};
