//! `engine-speed`: generate the datasets, run the selected benchmark suites
//! and report every batch as a table and a chart.

mod config;
mod log;
mod record;

use anyhow::Result;
use clap::Parser;
use engine_speed_eval::{session::Session, suite::run_suite};
use tracing::info;

use crate::config::{Args, RunConfig};

/// What `main()` does:
/// 1. Validate the arguments
/// 2. Open a session, generating and writing the input files
/// 3. Run every selected suite in order, printing and charting each batch
/// 4. Optionally dump all timings as JSON
fn main() -> Result<()> {
  let args = Args::parse();
  log::init_logger(args.verbose);

  let config = RunConfig::try_from(args)?;
  let session = Session::open(config.session.clone())?;

  let mut measured = Vec::with_capacity(config.suites.len());
  for &suite in &config.suites {
    let batches = run_suite(&session, suite, config.runs, &config.presentation)?;
    measured.push((suite, batches));
  }
  drop(session);

  if let Some(path) = &config.json {
    let records: Vec<_> = measured
      .iter()
      .flat_map(|(suite, batches)| record::records(*suite, batches))
      .collect();
    record::write_json(&records, path)?;
  }

  info!(suites = config.suites.len(), "finished all benchmarks");
  Ok(())
}
