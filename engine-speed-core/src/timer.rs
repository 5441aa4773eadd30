use std::{
  hint::black_box,
  num::NonZeroUsize,
  time::{Duration, Instant},
};

use tracing::debug;

/// Number of runs used when the caller does not pick one.
pub const DEFAULT_RUNS: NonZeroUsize = match NonZeroUsize::new(5) {
  Some(runs) => runs,
  None => unreachable!(),
};

/// Per-run samples of one timed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
  pub label: String,
  pub samples: Vec<Duration>,
}

impl Measurement {
  pub fn runs(&self) -> usize {
    self.samples.len()
  }

  /// Arithmetic mean of all samples, in seconds. Averaged in whole
  /// nanoseconds so it never leaves `[min, max]`.
  pub fn mean_secs(&self) -> f64 {
    match u32::try_from(self.samples.len()) {
      Ok(0) => 0.0,
      Ok(runs) => (self.samples.iter().sum::<Duration>() / runs).as_secs_f64(),
      Err(_) => {
        let total: u128 = self.samples.iter().map(Duration::as_nanos).sum();
        (total / self.samples.len() as u128) as f64 / 1e9
      }
    }
  }

  pub fn min(&self) -> Duration {
    self.samples.iter().copied().min().unwrap_or_default()
  }

  pub fn max(&self) -> Duration {
    self.samples.iter().copied().max().unwrap_or_default()
  }

  /// The one-line progress report printed once a measurement completes.
  pub fn progress_line(&self) -> String {
    format!(
      "{:<15} | Avg: {:.6}s over {} runs",
      self.label,
      self.mean_secs(),
      self.runs()
    )
  }
}

/// Run `operation` exactly `runs` times and time every invocation with a
/// monotonic clock.
///
/// The value produced by the operation is discarded. The first failing
/// invocation aborts the measurement and its error is returned as is, so no
/// partial mean is ever produced.
pub fn measure<F, T, E>(mut operation: F, runs: NonZeroUsize, label: &str) -> Result<Measurement, E>
where
  F: FnMut() -> Result<T, E>,
{
  let mut samples = Vec::with_capacity(runs.get());
  for run in 0..runs.get() {
    let start = Instant::now();
    let output = operation()?;
    let elapsed = start.elapsed();
    black_box(output);
    debug!(label, run, elapsed_secs = elapsed.as_secs_f64(), "sample");
    samples.push(elapsed);
  }

  let measurement = Measurement {
    label: label.to_owned(),
    samples,
  };
  println!("{}", measurement.progress_line());
  Ok(measurement)
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, thread::sleep};

  use rstest::rstest;

  use super::*;

  #[rstest]
  #[case(1)]
  #[case(3)]
  #[case(5)]
  fn test_mean_within_observed_range(#[case] runs: usize) {
    let runs = NonZeroUsize::new(runs).unwrap();
    let measurement = measure(
      || {
        sleep(Duration::from_millis(2));
        Ok::<_, anyhow::Error>(())
      },
      runs,
      "sleep",
    )
    .unwrap();

    assert_eq!(measurement.runs(), runs.get());
    let mean = measurement.mean_secs();
    assert!(measurement.min().as_secs_f64() <= mean);
    assert!(mean <= measurement.max().as_secs_f64());
  }

  #[test]
  fn test_invokes_exactly_runs_times() {
    let calls = Cell::new(0);
    measure(
      || {
        calls.set(calls.get() + 1);
        Ok::<_, anyhow::Error>(calls.get())
      },
      DEFAULT_RUNS,
      "count",
    )
    .unwrap();
    assert_eq!(calls.get(), 5);
  }

  #[test]
  fn test_failure_propagates_unchanged() {
    let calls = Cell::new(0);
    let err = measure(
      || {
        calls.set(calls.get() + 1);
        if calls.get() == 2 {
          Err("second call")
        } else {
          Ok(())
        }
      },
      DEFAULT_RUNS,
      "flaky",
    )
    .unwrap_err();

    assert_eq!(err, "second call");
    assert_eq!(calls.get(), 2);
  }

  #[rstest]
  #[case(vec![Duration::from_millis(100); 3])]
  #[case(vec![Duration::from_nanos(1); 7])]
  #[case(vec![Duration::from_millis(250), Duration::from_millis(250), Duration::from_millis(251)])]
  fn test_mean_of_equal_samples_stays_in_range(#[case] samples: Vec<Duration>) {
    let measurement = Measurement {
      label: "equal".to_owned(),
      samples,
    };
    let mean = measurement.mean_secs();
    assert!(measurement.min().as_secs_f64() <= mean, "mean = {mean}");
    assert!(mean <= measurement.max().as_secs_f64(), "mean = {mean}");
  }

  #[test]
  fn test_mean_of_repeated_sample_is_exact() {
    let measurement = Measurement {
      label: "repeat".to_owned(),
      samples: vec![Duration::from_millis(100); 3],
    };
    assert_eq!(measurement.mean_secs(), 0.1);
  }

  #[test]
  fn test_progress_line_format() {
    let measurement = Measurement {
      label: "CSV Read".to_owned(),
      samples: vec![Duration::from_millis(250), Duration::from_millis(750)],
    };
    assert_eq!(
      measurement.progress_line(),
      "CSV Read        | Avg: 0.500000s over 2 runs"
    );
  }
}
