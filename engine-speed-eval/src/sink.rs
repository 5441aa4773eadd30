use std::{fs::File, path::Path};

use anyhow::Result;
use arrow::array::RecordBatch;
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

use crate::scan::{ScanConfig, StreamPlan};

/// Stream the result of a scan straight into a Parquet file without ever
/// holding the whole result in memory. Returns the number of rows written.
pub async fn sink_parquet(
  source: &Path,
  config: &ScanConfig,
  destination: &Path,
  row_group_size: usize,
) -> Result<usize> {
  let mut plan = StreamPlan::open(source, config).await?;
  let properties = WriterProperties::builder()
    .set_max_row_group_size(row_group_size)
    .build();

  let mut writer: Option<ArrowWriter<File>> = None;
  let mut rows = 0;
  while let Some(next_batch) = plan.next_batch().await {
    let batch = next_batch?;
    if writer.is_none() {
      writer = Some(ArrowWriter::try_new(
        File::create(destination)?,
        batch.schema(),
        Some(properties.clone()),
      )?);
    }
    if let Some(writer) = writer.as_mut() {
      writer.write(&batch)?;
    }
    rows += batch.num_rows();
  }

  match writer {
    Some(writer) => {
      writer.close()?;
    }
    // Nothing matched: still leave a valid, empty file behind.
    None => write_empty(&plan, destination, properties)?,
  }
  Ok(rows)
}

fn write_empty(plan: &StreamPlan, destination: &Path, properties: WriterProperties) -> Result<()> {
  let empty = RecordBatch::new_empty(plan.schema());
  let mut writer =
    ArrowWriter::try_new(File::create(destination)?, empty.schema(), Some(properties))?;
  writer.write(&empty)?;
  writer.close()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use parquet::file::reader::{FileReader, SerializedFileReader};

  use super::*;
  use crate::{
    io::{read_parquet, write_parquet},
    scan::{scan_eager, Engine, Predicate, Pushdown},
    util::{gen_trips, row_count, AMOUNT_COLUMN, PICKUP_COLUMN, PICKUP_CUTOFF_MICROS},
  };

  #[tokio::test]
  async fn test_sink_matches_scan() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("trips.parquet");
    let destination = dir.path().join("sink.parquet");
    write_parquet(&[gen_trips(3000, 9).unwrap()], &source, 500).unwrap();

    let config = ScanConfig::new(Engine::Streaming)
      .pushdown(Pushdown::ALL)
      .project([PICKUP_COLUMN, AMOUNT_COLUMN])
      .filter(Predicate::after(PICKUP_COLUMN, PICKUP_CUTOFF_MICROS));
    let written = sink_parquet(&source, &config, &destination, 500).await.unwrap();

    let expected = scan_eager(&source, &config).unwrap();
    assert_eq!(written, expected.rows);

    let sunk = read_parquet(&destination).unwrap();
    assert_eq!(row_count(&sunk), expected.rows);
    assert_eq!(sunk[0].num_columns(), 2);
  }

  #[tokio::test]
  async fn test_sink_nothing_matches() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("trips.parquet");
    let destination = dir.path().join("sink.parquet");
    write_parquet(&[gen_trips(1000, 9).unwrap()], &source, 200).unwrap();

    let config = ScanConfig::new(Engine::Streaming)
      .pushdown(Pushdown::ALL)
      .filter(Predicate::after(PICKUP_COLUMN, i64::MAX));
    let written = sink_parquet(&source, &config, &destination, 200).await.unwrap();

    assert_eq!(written, 0);
    let reader = SerializedFileReader::new(File::open(&destination).unwrap()).unwrap();
    assert_eq!(reader.metadata().file_metadata().num_rows(), 0);
  }
}
