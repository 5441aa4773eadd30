use anyhow::Result;
use engine_speed_core::ExperimentSet;

use crate::{scan::ScanConfig, session::Session};

/// What a single experiment does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  /// Write the generated sales records as CSV.
  WriteCsv,
  /// Write the generated sales records as Parquet.
  WriteParquet,
  ReadCsv,
  ReadParquet,
  /// Scan the trips file to completion.
  Scan(ScanConfig),
  /// Scan every file of the trips source as one input.
  ScanMulti(ScanConfig),
  /// Open and configure a trips stream without draining it.
  Plan(ScanConfig),
  /// Write the already materialized result of a scan.
  WriteMaterialized(ScanConfig),
  /// Stream the result of a scan into a new file.
  Sink(ScanConfig),
}

/// Ordered `label → action` rows describing one batch.
#[derive(Debug, Clone, Default)]
pub struct ExperimentTable {
  rows: Vec<(String, Action)>,
}

impl ExperimentTable {
  pub fn new() -> Self {
    ExperimentTable { rows: Vec::new() }
  }

  pub fn row(mut self, label: impl Into<String>, action: Action) -> Self {
    self.rows.push((label.into(), action));
    self
  }

  pub fn labels(&self) -> Vec<&str> {
    self.rows.iter().map(|(label, _)| label.as_str()).collect()
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// Bind every row to `session`, keeping row order.
  pub fn bind<'s>(&self, session: &'s Session) -> Result<ExperimentSet<'s>> {
    let mut experiments = ExperimentSet::new();
    for (label, action) in &self.rows {
      experiments.push(session.bind(label, action)?)?;
    }
    Ok(experiments)
  }
}

impl FromIterator<(String, Action)> for ExperimentTable {
  fn from_iter<I: IntoIterator<Item = (String, Action)>>(iter: I) -> Self {
    ExperimentTable {
      rows: iter.into_iter().collect(),
    }
  }
}
