use std::path::PathBuf;

/// Errors surfaced by the benchmarking harness.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A batch was started without any experiment to measure.
  #[error("no operations to benchmark")]
  EmptyBatch,

  /// Two experiments of one batch share a label.
  #[error("duplicate experiment label `{0}`")]
  DuplicateLabel(String),

  /// A measurement was requested with zero runs.
  #[error("run count must be at least 1, got {0}")]
  InvalidRuns(usize),

  /// Results measured with different run counts cannot be combined.
  #[error("cannot merge results measured over {left} and {right} runs")]
  MismatchedRuns { left: usize, right: usize },

  /// Normalization was requested on an empty result.
  #[error("no baseline to normalize against: result set is empty")]
  EmptyResult,

  /// A duration that cannot serve as a ratio denominator.
  #[error("invalid duration {seconds}s for `{label}`: durations must be finite and positive")]
  InvalidDuration { label: String, seconds: f64 },

  /// The benchmarked operation itself failed.
  #[error("operation `{label}` failed")]
  Operation {
    label: String,
    #[source]
    source: anyhow::Error,
  },

  #[error("unsupported chart format for {}", .0.display())]
  UnsupportedFormat(PathBuf),

  #[error("failed to render chart: {0}")]
  Chart(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Whether this error comes from a misconfigured batch rather than from a
  /// measurement or an operation.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      Error::EmptyBatch
        | Error::DuplicateLabel(_)
        | Error::InvalidRuns(_)
        | Error::MismatchedRuns { .. }
        | Error::EmptyResult
    )
  }
}

pub type Result<T> = std::result::Result<T, Error>;
