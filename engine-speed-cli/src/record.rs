use std::{fs, path::Path};

use anyhow::{Context, Result};
use engine_speed_core::TimingResult;
use engine_speed_eval::suite::{BatchResult, Suite};
use serde::Serialize;
use tracing::info;

/// One measured batch as written to the JSON dump.
#[derive(Debug, Serialize)]
pub(crate) struct BatchRecord<'a> {
  suite: &'static str,
  title: &'a str,
  #[serde(flatten)]
  result: &'a TimingResult,
}

pub(crate) fn records(
  suite: Suite,
  batches: &[BatchResult],
) -> impl Iterator<Item = BatchRecord<'_>> {
  batches.iter().map(move |batch| BatchRecord {
    suite: suite.name(),
    title: &batch.title,
    result: &batch.result,
  })
}

pub(crate) fn write_json(records: &[BatchRecord<'_>], path: &Path) -> Result<()> {
  let json = serde_json::to_string_pretty(records)?;
  fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
  info!(path = %path.display(), batches = records.len(), "wrote timings");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_json_layout() {
    let batches = vec![BatchResult {
      title: "Read Benchmark: CSV vs Parquet".to_owned(),
      result: TimingResult::new(5, [("CSV Read", 0.5), ("Parquet Read", 0.125)]),
    }];
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timings.json");
    let records: Vec<_> = records(Suite::ReadWrite, &batches).collect();
    write_json(&records, &path).unwrap();

    let written: serde_json::Value =
      serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
      written,
      serde_json::json!([{
        "suite": "read-write",
        "title": "Read Benchmark: CSV vs Parquet",
        "runs": 5,
        "entries": [
          { "label": "CSV Read", "value": 0.5 },
          { "label": "Parquet Read", "value": 0.125 },
        ],
      }])
    );
  }
}
