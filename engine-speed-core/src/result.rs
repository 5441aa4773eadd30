//! Ordered label → value mappings produced by a batch and their relative-speed view.

use serde::Serialize;

use crate::{
  error::{Error, Result},
  timer::Measurement,
};

/// One row of a result: a label and its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
  pub label: String,
  pub value: f64,
}

/// What the values of a [`Series`] mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
  /// Mean elapsed seconds.
  Seconds,
  /// Dimensionless ratio to the fastest entry.
  Relative,
}

impl ValueKind {
  /// Column header used by tables and chart axes.
  pub fn header(self) -> &'static str {
    match self {
      ValueKind::Seconds => "Time (s)",
      ValueKind::Relative => "Relative Time (x)",
    }
  }
}

/// Read-only view shared by every reportable result.
pub trait Series {
  fn entries(&self) -> &[Entry];

  fn kind(&self) -> ValueKind;

  fn get(&self, label: &str) -> Option<f64> {
    self
      .entries()
      .iter()
      .find(|entry| entry.label == label)
      .map(|entry| entry.value)
  }

  fn labels(&self) -> Vec<&str> {
    self.entries().iter().map(|entry| entry.label.as_str()).collect()
  }

  fn len(&self) -> usize {
    self.entries().len()
  }

  fn is_empty(&self) -> bool {
    self.entries().is_empty()
  }
}

/// Mean durations of one batch, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingResult {
  runs: usize,
  entries: Vec<Entry>,
}

impl TimingResult {
  /// Build a result from `(label, mean seconds)` pairs.
  pub fn new<L: Into<String>>(runs: usize, entries: impl IntoIterator<Item = (L, f64)>) -> Self {
    let entries = entries
      .into_iter()
      .map(|(label, value)| Entry {
        label: label.into(),
        value,
      })
      .collect();
    TimingResult { runs, entries }
  }

  pub(crate) fn from_measurements(runs: usize, measurements: Vec<Measurement>) -> Self {
    TimingResult::new(
      runs,
      measurements
        .into_iter()
        .map(|m| {
          let mean = m.mean_secs();
          (m.label, mean)
        }),
    )
  }

  /// Run count every mean was computed over.
  pub fn runs(&self) -> usize {
    self.runs
  }

  /// Concatenate two batches measured with the same run count.
  pub fn merge(mut self, other: TimingResult) -> Result<TimingResult> {
    if self.runs != other.runs {
      return Err(Error::MismatchedRuns {
        left: self.runs,
        right: other.runs,
      });
    }
    for entry in other.entries {
      if self.get(&entry.label).is_some() {
        return Err(Error::DuplicateLabel(entry.label));
      }
      self.entries.push(entry);
    }
    Ok(self)
  }
}

impl Series for TimingResult {
  fn entries(&self) -> &[Entry] {
    &self.entries
  }

  fn kind(&self) -> ValueKind {
    ValueKind::Seconds
  }
}

/// Every entry divided by the minimum of its batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeResult {
  entries: Vec<Entry>,
}

impl RelativeResult {
  /// Label of the baseline entry (the one mapped to 1.0).
  pub fn fastest(&self) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|entry| entry.value == 1.0)
      .map(|entry| entry.label.as_str())
  }
}

impl Series for RelativeResult {
  fn entries(&self) -> &[Entry] {
    &self.entries
  }

  fn kind(&self) -> ValueKind {
    ValueKind::Relative
  }
}

/// Convert a result to relative speed: each value over the minimum value.
///
/// The minimum entry maps to exactly `1.0`. Durations must be finite and
/// strictly positive.
pub fn normalize<S: Series + ?Sized>(result: &S) -> Result<RelativeResult> {
  let mut min = f64::INFINITY;
  for entry in result.entries() {
    if !(entry.value.is_finite() && entry.value > 0.0) {
      return Err(Error::InvalidDuration {
        label: entry.label.clone(),
        seconds: entry.value,
      });
    }
    min = min.min(entry.value);
  }
  if result.is_empty() {
    return Err(Error::EmptyResult);
  }

  let entries = result
    .entries()
    .iter()
    .map(|entry| Entry {
      label: entry.label.clone(),
      value: entry.value / min,
    })
    .collect();
  Ok(RelativeResult { entries })
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;

  #[rstest]
  #[case(vec![("a", 0.5), ("b", 1.0), ("c", 2.0)], "a")]
  #[case(vec![("csv", 3.2), ("parquet", 0.4)], "parquet")]
  #[case(vec![("only", 0.001)], "only")]
  #[case(vec![("x", 1e-9), ("y", 1e-9), ("z", 5.0)], "x")]
  fn test_normalize_baseline(#[case] entries: Vec<(&str, f64)>, #[case] fastest: &str) {
    let result = TimingResult::new(5, entries);
    let relative = normalize(&result).unwrap();

    assert_eq!(relative.len(), result.len());
    assert_eq!(relative.get(fastest), Some(1.0));
    assert_eq!(relative.fastest(), Some(fastest));
    for entry in relative.entries() {
      assert!(entry.value >= 1.0, "{} maps to {}", entry.label, entry.value);
    }
  }

  #[test]
  fn test_normalize_preserves_order() {
    let result = TimingResult::new(1, [("slow", 3.0), ("fast", 1.0), ("mid", 2.0)]);
    let relative = normalize(&result).unwrap();
    assert_eq!(relative.labels(), vec!["slow", "fast", "mid"]);
    assert_eq!(relative.get("slow"), Some(3.0));
  }

  #[test]
  fn test_normalize_idempotent() {
    let result = TimingResult::new(5, [("a", 0.02), ("b", 0.07), ("c", 0.03)]);
    let once = normalize(&result).unwrap();
    let twice = normalize(&once).unwrap();
    assert_eq!(once, twice);
  }

  #[test]
  fn test_normalize_empty() {
    let result = TimingResult::new::<&str>(5, []);
    let err = normalize(&result).unwrap_err();
    assert!(matches!(err, Error::EmptyResult));
    assert!(err.is_configuration());
  }

  #[rstest]
  #[case(0.0)]
  #[case(-0.5)]
  #[case(f64::NAN)]
  #[case(f64::INFINITY)]
  fn test_normalize_rejects_invalid_duration(#[case] bad: f64) {
    let result = TimingResult::new(5, [("ok", 1.0), ("bad", bad)]);
    match normalize(&result).unwrap_err() {
      Error::InvalidDuration { label, .. } => assert_eq!(label, "bad"),
      other => panic!("unexpected error {other:?}"),
    }
  }

  #[test]
  fn test_merge() {
    let write = TimingResult::new(5, [("CSV Write", 2.0), ("Parquet Write", 1.0)]);
    let read = TimingResult::new(5, [("CSV Read", 1.5), ("Parquet Read", 0.2)]);
    let combined = write.merge(read).unwrap();
    assert_eq!(
      combined.labels(),
      vec!["CSV Write", "Parquet Write", "CSV Read", "Parquet Read"]
    );
  }

  #[test]
  fn test_merge_conflicts() {
    let a = TimingResult::new(5, [("x", 1.0)]);
    let b = TimingResult::new(5, [("x", 2.0)]);
    assert!(matches!(a.clone().merge(b), Err(Error::DuplicateLabel(label)) if label == "x"));

    let c = TimingResult::new(3, [("y", 1.0)]);
    assert!(matches!(
      a.merge(c),
      Err(Error::MismatchedRuns { left: 5, right: 3 })
    ));
  }
}
