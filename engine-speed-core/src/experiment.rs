use std::{fmt, hint::black_box};

use crate::error::{Error, Result};

type Operation<'a> = Box<dyn FnMut() -> anyhow::Result<()> + 'a>;

/// A labeled zero-argument operation. Only the time it takes matters, its
/// output is dropped.
pub struct Experiment<'a> {
  label: String,
  operation: Operation<'a>,
}

impl<'a> Experiment<'a> {
  pub fn new<F, T>(label: impl Into<String>, mut operation: F) -> Self
  where
    F: FnMut() -> anyhow::Result<T> + 'a,
  {
    Experiment {
      label: label.into(),
      operation: Box::new(move || {
        black_box(operation()?);
        Ok(())
      }),
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub(crate) fn into_parts(self) -> (String, Operation<'a>) {
    (self.label, self.operation)
  }
}

impl fmt::Debug for Experiment<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Experiment").field("label", &self.label).finish()
  }
}

/// Experiments of one batch, kept in insertion order with unique labels.
#[derive(Debug, Default)]
pub struct ExperimentSet<'a> {
  experiments: Vec<Experiment<'a>>,
}

impl<'a> ExperimentSet<'a> {
  pub fn new() -> Self {
    ExperimentSet {
      experiments: Vec::new(),
    }
  }

  pub fn push(&mut self, experiment: Experiment<'a>) -> Result<()> {
    if self.contains(experiment.label()) {
      return Err(Error::DuplicateLabel(experiment.label));
    }
    self.experiments.push(experiment);
    Ok(())
  }

  /// Shorthand for pushing `Experiment::new(label, operation)`.
  pub fn add<F, T>(&mut self, label: impl Into<String>, operation: F) -> Result<()>
  where
    F: FnMut() -> anyhow::Result<T> + 'a,
  {
    self.push(Experiment::new(label, operation))
  }

  pub fn contains(&self, label: &str) -> bool {
    self.experiments.iter().any(|e| e.label == label)
  }

  pub fn labels(&self) -> Vec<&str> {
    self.experiments.iter().map(Experiment::label).collect()
  }

  pub fn len(&self) -> usize {
    self.experiments.len()
  }

  pub fn is_empty(&self) -> bool {
    self.experiments.is_empty()
  }
}

impl<'a> IntoIterator for ExperimentSet<'a> {
  type Item = Experiment<'a>;
  type IntoIter = std::vec::IntoIter<Experiment<'a>>;

  fn into_iter(self) -> Self::IntoIter {
    self.experiments.into_iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_insertion_order() {
    let mut set = ExperimentSet::new();
    set.add("Read", || Ok(1)).unwrap();
    set.add("Scan", || Ok("lazy")).unwrap();
    set.add("Write", || Ok(())).unwrap();
    assert_eq!(set.labels(), vec!["Read", "Scan", "Write"]);
  }

  #[test]
  fn test_duplicate_label() {
    let mut set = ExperimentSet::new();
    set.add("Read", || Ok(())).unwrap();
    let err = set.add("Read", || Ok(())).unwrap_err();
    assert!(matches!(err, Error::DuplicateLabel(ref label) if label == "Read"));
    assert!(err.is_configuration());
    assert_eq!(set.len(), 1);
  }
}
