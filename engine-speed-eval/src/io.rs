//! Whole-file CSV and Parquet reads and writes through `arrow` and `parquet`.

use std::{
  fs::{self, File},
  path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use arrow::{
  array::RecordBatch,
  csv::{ReaderBuilder, WriterBuilder},
  datatypes::SchemaRef,
};
use parquet::{
  arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
  file::properties::WriterProperties,
};

pub const DEFAULT_ROW_GROUP_SIZE: usize = 100_000;

/// Write `batches` as a CSV file with a header row.
pub fn write_csv(batches: &[RecordBatch], path: impl AsRef<Path>) -> Result<()> {
  let file = File::create(path)?;
  let mut writer = WriterBuilder::new().with_header(true).build(file);
  for batch in batches {
    writer.write(batch)?;
  }
  Ok(())
}

/// Read a CSV file with a header row against a known schema.
pub fn read_csv(path: impl AsRef<Path>, schema: SchemaRef) -> Result<Vec<RecordBatch>> {
  let file = File::open(path)?;
  let reader = ReaderBuilder::new(schema).with_header(true).build(file)?;
  Ok(reader.collect::<Result<Vec<_>, _>>()?)
}

/// Write `batches` as a single Parquet file, cutting row groups at
/// `row_group_size` rows.
pub fn write_parquet(
  batches: &[RecordBatch],
  path: impl AsRef<Path>,
  row_group_size: usize,
) -> Result<()> {
  let Some(first) = batches.first() else {
    bail!("nothing to write to {}", path.as_ref().display());
  };
  let file = File::create(path)?;
  let properties = WriterProperties::builder()
    .set_max_row_group_size(row_group_size)
    .build();
  let mut writer = ArrowWriter::try_new(file, first.schema(), Some(properties))?;
  for batch in batches {
    writer.write(batch)?;
  }
  writer.close()?;
  Ok(())
}

/// Read every row of a Parquet file.
pub fn read_parquet(path: impl AsRef<Path>) -> Result<Vec<RecordBatch>> {
  let file = File::open(path)?;
  let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
  Ok(reader.collect::<Result<Vec<_>, _>>()?)
}

/// Split `batch` into `parts` files of about equal row count named
/// `part-<n>.parquet` under `dir`, returning their paths in order.
pub fn write_parquet_parts(
  batch: &RecordBatch,
  dir: impl AsRef<Path>,
  parts: usize,
  row_group_size: usize,
) -> Result<Vec<PathBuf>> {
  let dir = dir.as_ref();
  fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

  let parts = parts.max(1);
  let rows = batch.num_rows();
  let mut paths = Vec::with_capacity(parts);
  for part in 0..parts {
    let start = rows * part / parts;
    let end = rows * (part + 1) / parts;
    let path = dir.join(format!("part-{part}.parquet"));
    write_parquet(&[batch.slice(start, end - start)], &path, row_group_size)?;
    paths.push(path);
  }
  Ok(paths)
}

/// Parquet files making up `path`: the file itself, or every `.parquet`
/// file directly inside a directory, sorted by name.
pub fn parquet_files(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
  let path = path.as_ref();
  if !path.is_dir() {
    if !path.is_file() {
      bail!("{} does not exist", path.display());
    }
    return Ok(vec![path.to_path_buf()]);
  }

  let mut files = Vec::new();
  for entry in fs::read_dir(path).with_context(|| format!("failed to list {}", path.display()))? {
    let file = entry?.path();
    if file.is_file() && file.extension().is_some_and(|ext| ext == "parquet") {
      files.push(file);
    }
  }
  if files.is_empty() {
    bail!("no parquet files in {}", path.display());
  }
  files.sort();
  Ok(files)
}

#[cfg(test)]
mod tests {
  use arrow::compute::concat_batches;
  use parquet::file::reader::{FileReader, SerializedFileReader};

  use super::*;
  use crate::util::{gen_sales, gen_trips, row_count, sales_schema};

  #[test]
  fn test_csv_roundtrip_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.csv");
    let batch = gen_sales(2500, 1).unwrap();

    write_csv(&[batch.clone()], &path).unwrap();
    let read = read_csv(&path, sales_schema()).unwrap();

    assert_eq!(row_count(&read), 2500);
    let read = concat_batches(&sales_schema(), &read).unwrap();
    assert_eq!(read.column(0), batch.column(0));
    assert_eq!(read.column(2), batch.column(2));
  }

  #[test]
  fn test_parquet_row_groups() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trips.parquet");
    let batch = gen_trips(2500, 1).unwrap();

    write_parquet(&[batch.clone()], &path, 1000).unwrap();

    let reader = SerializedFileReader::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(reader.metadata().num_row_groups(), 3);

    let read = read_parquet(&path).unwrap();
    assert_eq!(concat_batches(&batch.schema(), &read).unwrap(), batch);
  }

  #[test]
  fn test_write_parquet_rejects_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.parquet");
    let err = write_parquet(&[], &path, 10).unwrap_err();
    assert!(err.to_string().contains("nothing to write"));
    assert!(!path.exists());
  }

  #[test]
  fn test_parts_cover_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let batch = gen_trips(1001, 4).unwrap();

    let parts = write_parquet_parts(&batch, dir.path().join("trips"), 3, 200).unwrap();
    assert_eq!(parts.len(), 3);

    let read: Vec<RecordBatch> = parts
      .iter()
      .flat_map(|part| read_parquet(part).unwrap())
      .collect();
    assert_eq!(concat_batches(&batch.schema(), &read).unwrap(), batch);
  }

  #[test]
  fn test_parquet_files_of_directory() {
    let dir = tempfile::tempdir().unwrap();
    let batch = gen_trips(300, 4).unwrap();
    let parts = write_parquet_parts(&batch, dir.path(), 2, 100).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a parquet file").unwrap();

    assert_eq!(parquet_files(dir.path()).unwrap(), parts);
    assert_eq!(parquet_files(&parts[1]).unwrap(), vec![parts[1].clone()]);
  }

  #[test]
  fn test_parquet_files_rejects_missing_and_empty() {
    let dir = tempfile::tempdir().unwrap();
    let err = parquet_files(dir.path()).unwrap_err();
    assert!(err.to_string().contains("no parquet files"), "{err}");

    let err = parquet_files(dir.path().join("missing.parquet")).unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{err}");
  }
}
