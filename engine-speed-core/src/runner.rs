use std::num::NonZeroUsize;

use tracing::info;

use crate::{
  error::{Error, Result},
  experiment::ExperimentSet,
  result::TimingResult,
  timer::measure,
};

/// Measure every experiment of a batch, in insertion order, with the same
/// run count.
///
/// The batch aborts on the first failing operation: nothing is measured after
/// it and no partial result is returned.
pub fn run_all(experiments: ExperimentSet<'_>, runs: usize) -> Result<TimingResult> {
  let runs_nz = NonZeroUsize::new(runs).ok_or(Error::InvalidRuns(runs))?;
  if experiments.is_empty() {
    return Err(Error::EmptyBatch);
  }

  info!(experiments = experiments.len(), runs, "starting batch");
  let mut measurements = Vec::with_capacity(experiments.len());
  for experiment in experiments {
    let (label, operation) = experiment.into_parts();
    let measurement = measure(operation, runs_nz, &label)
      .map_err(|source| Error::Operation { label, source })?;
    measurements.push(measurement);
  }

  Ok(TimingResult::from_measurements(runs, measurements))
}
