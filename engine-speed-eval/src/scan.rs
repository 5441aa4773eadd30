//! Parquet scans under different pushdown strategies.
//!
//! A scan reads one Parquet file, optionally keeps only a subset of columns
//! (projection) and optionally keeps only rows matching a timestamp predicate
//! (filter). Each of the two can either be pushed into the reader or applied
//! to the decoded batches afterwards:
//! - projection pushdown hands the reader a [`ProjectionMask`] so other
//!   columns are never decoded
//! - filter pushdown prunes row groups on their min/max statistics (zone map)
//!   and installs a [`RowFilter`] so non-matching rows are never materialized
//!
//! Two engines drive the same configuration: [`Engine::Eager`] uses the
//! blocking reader, [`Engine::Streaming`] the async record batch stream.

use std::{
  fs::File,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use arrow::{
  array::{Array, ArrayRef, BooleanArray, RecordBatch, Scalar, TimestampMicrosecondArray},
  compute::{cast, filter_record_batch, kernels::cmp::gt},
  datatypes::{DataType, Schema, SchemaRef, TimeUnit},
  error::ArrowError,
};
use futures::StreamExt;
use parquet::{
  arrow::{
    arrow_reader::{
      ArrowPredicateFn, ArrowReaderBuilder, ParquetRecordBatchReaderBuilder, RowFilter,
    },
    async_reader::ParquetRecordBatchStream,
    ParquetRecordBatchStreamBuilder, ProjectionMask,
  },
  file::{metadata::ParquetMetaData, statistics::Statistics},
};
use tokio::runtime::Runtime;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
  /// Blocking reader.
  Eager,
  /// Async stream, drained on a runtime.
  Streaming,
}

impl Engine {
  pub fn name(self) -> &'static str {
    match self {
      Engine::Eager => "Eager",
      Engine::Streaming => "Streaming",
    }
  }
}

/// Which parts of a scan are handed to the reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pushdown {
  pub projection: bool,
  pub filter: bool,
}

impl Pushdown {
  pub const NONE: Pushdown = Pushdown {
    projection: false,
    filter: false,
  };
  pub const PROJECTION: Pushdown = Pushdown {
    projection: true,
    filter: false,
  };
  pub const FILTER: Pushdown = Pushdown {
    projection: false,
    filter: true,
  };
  pub const ALL: Pushdown = Pushdown {
    projection: true,
    filter: true,
  };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Output {
  /// Keep the decoded batches.
  #[default]
  Rows,
  /// Only count matching rows.
  Count,
}

/// `column > after_micros`, on a timestamp column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
  pub column: String,
  pub after_micros: i64,
}

impl Predicate {
  pub fn after(column: impl Into<String>, after_micros: i64) -> Self {
    Predicate {
      column: column.into(),
      after_micros,
    }
  }

  pub fn evaluate(&self, values: &ArrayRef) -> Result<BooleanArray, ArrowError> {
    let timezone = match values.data_type() {
      DataType::Timestamp(_, timezone) => timezone.clone(),
      other => {
        return Err(ArrowError::InvalidArgumentError(format!(
          "column `{}` is {other}, expected a timestamp",
          self.column
        )))
      }
    };

    let target = DataType::Timestamp(TimeUnit::Microsecond, timezone.clone());
    let values = if values.data_type() == &target {
      values.clone()
    } else {
      cast(values, &target)?
    };
    let cutoff =
      TimestampMicrosecondArray::from(vec![self.after_micros]).with_timezone_opt(timezone);
    gt(&values, &Scalar::new(cutoff))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
  pub engine: Engine,
  pub pushdown: Pushdown,
  pub projection: Option<Vec<String>>,
  pub predicate: Option<Predicate>,
  pub output: Output,
}

impl ScanConfig {
  /// Read every column and every row.
  pub fn new(engine: Engine) -> Self {
    ScanConfig {
      engine,
      pushdown: Pushdown::NONE,
      projection: None,
      predicate: None,
      output: Output::Rows,
    }
  }

  pub fn project<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
    self.projection = Some(columns.into_iter().map(Into::into).collect());
    self
  }

  pub fn filter(mut self, predicate: Predicate) -> Self {
    self.predicate = Some(predicate);
    self
  }

  pub fn pushdown(mut self, pushdown: Pushdown) -> Self {
    self.pushdown = pushdown;
    self
  }

  pub fn count(mut self) -> Self {
    self.output = Output::Count;
    self
  }
}

#[derive(Debug, Default)]
pub struct ScanOutput {
  pub rows: usize,
  /// Empty for [`Output::Count`] scans.
  pub batches: Vec<RecordBatch>,
}

impl ScanOutput {
  fn push(&mut self, batch: RecordBatch, output: Output) {
    self.rows += batch.num_rows();
    if output == Output::Rows {
      self.batches.push(batch);
    }
  }
}

/// Work left for decoded batches after the reader has done its part.
#[derive(Debug)]
pub struct Residual {
  predicate: Option<Predicate>,
  projection: Option<Vec<String>>,
}

impl Residual {
  pub fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
    let batch = match &self.predicate {
      Some(predicate) => {
        let idx = batch.schema().index_of(&predicate.column)?;
        let mask = predicate.evaluate(batch.column(idx))?;
        filter_record_batch(&batch, &mask)?
      }
      None => batch,
    };

    // Projection is re-applied even when pushed down: the reader keeps file
    // column order and may carry the residual predicate column.
    match &self.projection {
      Some(columns) => {
        let schema = batch.schema();
        let indices = column_indices(&schema, columns)?;
        Ok(batch.project(&indices)?)
      }
      None => Ok(batch),
    }
  }
}

fn column_indices(schema: &Schema, columns: &[String]) -> Result<Vec<usize>> {
  columns
    .iter()
    .map(|column| {
      schema
        .index_of(column)
        .with_context(|| format!("unknown column `{column}`"))
    })
    .collect()
}

/// Push the parts of `config` the reader should handle into `builder` and
/// return what remains to be done on each decoded batch.
fn configure<T>(
  mut builder: ArrowReaderBuilder<T>,
  config: &ScanConfig,
) -> Result<(ArrowReaderBuilder<T>, Residual)> {
  let schema = builder.schema().clone();
  let mut residual = Residual {
    predicate: None,
    projection: config.projection.clone(),
  };

  if let Some(predicate) = &config.predicate {
    if config.pushdown.filter {
      let column = column_indices(&schema, std::slice::from_ref(&predicate.column))?[0];

      // Step 1: Perform zone-map pruning on row groups
      let row_groups = prune_row_groups(builder.metadata(), &schema, column, predicate);

      // Step 2: Perform value level filtering inside the reader
      let mask = ProjectionMask::roots(builder.parquet_schema(), [column]);
      let row_predicate = predicate.clone();
      let filter = ArrowPredicateFn::new(mask, move |batch: RecordBatch| {
        row_predicate.evaluate(batch.column(0))
      });
      builder = builder
        .with_row_groups(row_groups)
        .with_row_filter(RowFilter::new(vec![Box::new(filter)]));
    } else {
      residual.predicate = Some(predicate.clone());
    }
  }

  if let (Some(columns), true) = (&config.projection, config.pushdown.projection) {
    let mut read = column_indices(&schema, columns)?;
    if let Some(predicate) = &residual.predicate {
      read.extend(column_indices(&schema, std::slice::from_ref(&predicate.column))?);
    }
    let mask = ProjectionMask::roots(builder.parquet_schema(), read);
    builder = builder.with_projection(mask);
  }

  Ok((builder, residual))
}

/// Row groups that may hold a row matching `predicate`, judged from the
/// min/max statistics of its column.
fn prune_row_groups(
  metadata: &ParquetMetaData,
  schema: &Schema,
  column: usize,
  predicate: &Predicate,
) -> Vec<usize> {
  // Statistics are raw i64 in the column's unit; only flat microsecond
  // columns line up with the cutoff.
  let prunable = matches!(
    schema.field(column).data_type(),
    DataType::Timestamp(TimeUnit::Microsecond, _)
  ) && metadata.file_metadata().schema_descr().num_columns() == schema.fields().len();
  if !prunable {
    warn!(
      column = %predicate.column,
      data_type = %schema.field(column).data_type(),
      "no row group pruning for this column, every row group is read"
    );
  }

  let mut rowgroups = Vec::with_capacity(metadata.num_row_groups());
  for (idx, rowgroup_metadata) in metadata.row_groups().iter().enumerate() {
    if prunable {
      let column_metadata = rowgroup_metadata.column(column);
      if let Some(Statistics::Int64(s)) = column_metadata.statistics() {
        if s.has_min_max_set() && *s.max() <= predicate.after_micros {
          continue;
        }
      }
    }
    rowgroups.push(idx);
  }
  rowgroups
}

/// Run a scan to completion with the engine named in `config`.
pub fn scan(path: &Path, config: &ScanConfig, runtime: &Runtime) -> Result<ScanOutput> {
  match config.engine {
    Engine::Eager => scan_eager(path, config),
    Engine::Streaming => runtime.block_on(scan_streaming(path, config)),
  }
}

/// Scan several files as one source, one after another. Rows and batches
/// come back in file order.
pub fn scan_files(paths: &[PathBuf], config: &ScanConfig, runtime: &Runtime) -> Result<ScanOutput> {
  if paths.is_empty() {
    anyhow::bail!("no files to scan");
  }
  let mut output = ScanOutput::default();
  for path in paths {
    let part = scan(path, config, runtime)?;
    output.rows += part.rows;
    output.batches.extend(part.batches);
  }
  Ok(output)
}

pub fn scan_eager(path: &Path, config: &ScanConfig) -> Result<ScanOutput> {
  let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
  let (builder, residual) = configure(ParquetRecordBatchReaderBuilder::try_new(file)?, config)?;

  let mut output = ScanOutput::default();
  for batch in builder.build()? {
    output.push(residual.apply(batch?)?, config.output);
  }
  Ok(output)
}

pub async fn scan_streaming(path: &Path, config: &ScanConfig) -> Result<ScanOutput> {
  StreamPlan::open(path, config)
    .await?
    .collect(config.output)
    .await
}

/// An opened, configured but not yet drained record batch stream.
pub struct StreamPlan {
  stream: ParquetRecordBatchStream<tokio::fs::File>,
  residual: Residual,
}

impl StreamPlan {
  pub async fn open(path: &Path, config: &ScanConfig) -> Result<StreamPlan> {
    let file = tokio::fs::File::open(path)
      .await
      .with_context(|| format!("failed to open {}", path.display()))?;
    let builder = ParquetRecordBatchStreamBuilder::new(file).await?;
    let (builder, residual) = configure(builder, config)?;
    Ok(StreamPlan {
      stream: builder.build()?,
      residual,
    })
  }

  /// Schema of the batches the reader decodes, before residual work.
  pub fn schema(&self) -> SchemaRef {
    self.stream.schema().clone()
  }

  pub async fn next_batch(&mut self) -> Option<Result<RecordBatch>> {
    let next_batch = self.stream.next().await?;
    Some(
      next_batch
        .map_err(anyhow::Error::from)
        .and_then(|batch| self.residual.apply(batch)),
    )
  }

  pub async fn collect(mut self, output: Output) -> Result<ScanOutput> {
    let mut result = ScanOutput::default();
    while let Some(next_batch) = self.next_batch().await {
      result.push(next_batch?, output);
    }
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use arrow::{array::AsArray, datatypes::TimestampMicrosecondType};

  use super::*;
  use crate::util::PICKUP_CUTOFF_MICROS;

  #[test]
  fn test_predicate_strict_greater() {
    let values: ArrayRef = Arc::new(TimestampMicrosecondArray::from(vec![
      PICKUP_CUTOFF_MICROS - 1,
      PICKUP_CUTOFF_MICROS,
      PICKUP_CUTOFF_MICROS + 1,
    ]));
    let mask = Predicate::after("pickup_at", PICKUP_CUTOFF_MICROS)
      .evaluate(&values)
      .unwrap();
    assert_eq!(mask, BooleanArray::from(vec![false, false, true]));
  }

  #[test]
  fn test_predicate_other_unit_and_timezone() {
    let values: ArrayRef = Arc::new(
      arrow::array::TimestampMillisecondArray::from(vec![1_000, 3_000]).with_timezone("UTC"),
    );
    let mask = Predicate::after("ts", 2_000_000).evaluate(&values).unwrap();
    assert_eq!(mask, BooleanArray::from(vec![false, true]));
  }

  #[test]
  fn test_predicate_rejects_non_timestamp() {
    let values: ArrayRef = Arc::new(arrow::array::Int64Array::from(vec![1, 2]));
    assert!(Predicate::after("n", 1).evaluate(&values).is_err());
  }

  #[test]
  fn test_residual_filter_then_project() {
    let batch = crate::util::gen_trips(500, 5).unwrap();
    let residual = Residual {
      predicate: Some(Predicate::after("pickup_at", PICKUP_CUTOFF_MICROS)),
      projection: Some(vec!["total_amount".to_owned()]),
    };
    let out = residual.apply(batch.clone()).unwrap();

    let expected = batch
      .column(1)
      .as_primitive::<TimestampMicrosecondType>()
      .values()
      .iter()
      .filter(|v| **v > PICKUP_CUTOFF_MICROS)
      .count();
    assert_eq!(out.num_rows(), expected);
    assert_eq!(out.num_columns(), 1);
    assert_eq!(out.schema().field(0).name(), "total_amount");
  }
}
