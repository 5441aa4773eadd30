use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use arrow::array::RecordBatch;
use engine_speed_core::Experiment;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::{
  io::{
    parquet_files, read_csv, read_parquet, write_csv, write_parquet, write_parquet_parts,
    DEFAULT_ROW_GROUP_SIZE,
  },
  scan::{scan, scan_eager, scan_files, StreamPlan},
  sink::sink_parquet,
  table::Action,
  util::{gen_sales, gen_trips, sales_schema},
};

const SALES_CSV: &str = "sales.csv";
const SALES_PARQUET: &str = "sales.parquet";
const TRIPS_PARQUET: &str = "trips.parquet";
const TRIPS_PARTS_DIR: &str = "trips";
/// Files the generated trips are split into for multi-file scans.
pub const TRIPS_PARTS: usize = 4;
const WRITE_TARGET: &str = "write.parquet";
const SINK_TARGET: &str = "sink.parquet";

#[derive(Debug, Clone)]
pub struct SessionConfig {
  /// Directory holding every file the experiments read or write.
  pub data_dir: PathBuf,
  /// Rows of each generated dataset.
  pub rows: usize,
  pub seed: u64,
  pub row_group_size: usize,
  /// Scan this Parquet file, or the Parquet files of this directory, instead
  /// of generated trips. Every file must have a `pickup_at` timestamp column
  /// and a `total_amount` column. Single-file experiments use the first file.
  pub trips: Option<PathBuf>,
}

impl SessionConfig {
  pub fn new(data_dir: impl Into<PathBuf>) -> Self {
    SessionConfig {
      data_dir: data_dir.into(),
      rows: 1_000_000,
      seed: 42,
      row_group_size: DEFAULT_ROW_GROUP_SIZE,
      trips: None,
    }
  }
}

/// Resources shared by every experiment of a run: the data files and the
/// runtime streaming scans are driven on.
///
/// Experiments borrow the session, so it outlives every batch built from it;
/// dropping it releases the runtime.
pub struct Session {
  config: SessionConfig,
  runtime: Runtime,
  sales: Vec<RecordBatch>,
  trips: PathBuf,
  trips_parts: Vec<PathBuf>,
}

impl Session {
  /// Create the data directory, generate the datasets and write the input
  /// files. None of this is timed.
  pub fn open(config: SessionConfig) -> Result<Session> {
    fs::create_dir_all(&config.data_dir)
      .with_context(|| format!("failed to create {}", config.data_dir.display()))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()?;

    let sales = vec![gen_sales(config.rows, config.seed)?];
    write_csv(&sales, config.data_dir.join(SALES_CSV))?;
    write_parquet(&sales, config.data_dir.join(SALES_PARQUET), config.row_group_size)?;

    let (trips, trips_parts) = match &config.trips {
      Some(path) => {
        let parts = parquet_files(path)?;
        let first = parts
          .first()
          .cloned()
          .with_context(|| format!("no trips in {}", path.display()))?;
        (first, parts)
      }
      None => {
        let batch = gen_trips(config.rows, config.seed)?;
        let path = config.data_dir.join(TRIPS_PARQUET);
        write_parquet(&[batch.clone()], &path, config.row_group_size)?;
        let parts = write_parquet_parts(
          &batch,
          config.data_dir.join(TRIPS_PARTS_DIR),
          TRIPS_PARTS,
          config.row_group_size,
        )?;
        (path, parts)
      }
    };

    info!(
      data_dir = %config.data_dir.display(),
      rows = config.rows,
      trips = %trips.display(),
      trips_parts = trips_parts.len(),
      "session opened"
    );
    Ok(Session {
      config,
      runtime,
      sales,
      trips,
      trips_parts,
    })
  }

  pub fn runtime(&self) -> &Runtime {
    &self.runtime
  }

  pub fn trips_path(&self) -> &Path {
    &self.trips
  }

  /// Every file of the trips source, for multi-file scans.
  pub fn trips_parts(&self) -> &[PathBuf] {
    &self.trips_parts
  }

  pub fn data_path(&self, file: &str) -> PathBuf {
    self.config.data_dir.join(file)
  }

  /// Turn one table row into a timed operation bound to this session. Any
  /// preparation the action needs happens here, outside the timed region.
  pub fn bind(&self, label: &str, action: &Action) -> Result<Experiment<'_>> {
    let row_group_size = self.config.row_group_size;
    let experiment = match action {
      Action::WriteCsv => {
        let path = self.data_path(SALES_CSV);
        Experiment::new(label, move || write_csv(&self.sales, &path))
      }
      Action::WriteParquet => {
        let path = self.data_path(SALES_PARQUET);
        Experiment::new(label, move || {
          write_parquet(&self.sales, &path, row_group_size)
        })
      }
      Action::ReadCsv => {
        let path = self.data_path(SALES_CSV);
        Experiment::new(label, move || read_csv(&path, sales_schema()))
      }
      Action::ReadParquet => {
        let path = self.data_path(SALES_PARQUET);
        Experiment::new(label, move || read_parquet(&path))
      }
      Action::Scan(config) => {
        let config = config.clone();
        Experiment::new(label, move || scan(&self.trips, &config, &self.runtime))
      }
      Action::ScanMulti(config) => {
        let config = config.clone();
        Experiment::new(label, move || {
          scan_files(&self.trips_parts, &config, &self.runtime)
        })
      }
      Action::Plan(config) => {
        let config = config.clone();
        Experiment::new(label, move || {
          self
            .runtime
            .block_on(StreamPlan::open(&self.trips, &config))
        })
      }
      Action::WriteMaterialized(config) => {
        let batches = scan_eager(&self.trips, config)?.batches;
        let path = self.data_path(WRITE_TARGET);
        Experiment::new(label, move || write_parquet(&batches, &path, row_group_size))
      }
      Action::Sink(config) => {
        let config = config.clone();
        let path = self.data_path(SINK_TARGET);
        Experiment::new(label, move || {
          self
            .runtime
            .block_on(sink_parquet(&self.trips, &config, &path, row_group_size))
        })
      }
    };
    Ok(experiment)
  }
}

impl Drop for Session {
  fn drop(&mut self) {
    debug!(data_dir = %self.config.data_dir.display(), "session released");
  }
}
