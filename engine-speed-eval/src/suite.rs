//! The benchmark suites: which experiments run together, how they are titled
//! and which charts they produce.

use std::{fmt, path::PathBuf};

use anyhow::Result;
use engine_speed_core::{
  normalize, render_panels, report, run_all, Panel, ReportOptions, TimingResult,
};
use tracing::info;

use crate::{
  scan::{Engine, Predicate, Pushdown, ScanConfig},
  session::Session,
  table::{Action, ExperimentTable},
  util::{AMOUNT_COLUMN, PICKUP_COLUMN, PICKUP_CUTOFF_MICROS},
};

const COMBINED_LABEL_ROTATION: u16 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suite {
  /// CSV against Parquet, write then read.
  ReadWrite,
  /// Read and filter the trips file with each engine.
  Filter,
  /// Projection and filter pushdown strategies per engine.
  Pushdown,
  /// Materialize-then-write against streaming into a file.
  SinkWrite,
}

impl Suite {
  pub const ALL: [Suite; 4] = [Suite::ReadWrite, Suite::Filter, Suite::Pushdown, Suite::SinkWrite];

  pub fn name(self) -> &'static str {
    match self {
      Suite::ReadWrite => "read-write",
      Suite::Filter => "filter",
      Suite::Pushdown => "pushdown",
      Suite::SinkWrite => "sink-write",
    }
  }
}

impl fmt::Display for Suite {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Where and how results are shown.
#[derive(Debug, Clone, Default)]
pub struct Presentation {
  /// Directory chart images are written to; no charts when unset.
  pub chart_dir: Option<PathBuf>,
  /// Draw each chart on the console as well.
  pub display: bool,
}

impl Presentation {
  fn options(&self, title: &str, chart: Option<&str>) -> ReportOptions {
    let mut options = ReportOptions::new(title).display(self.display);
    if let (Some(dir), Some(chart)) = (&self.chart_dir, chart) {
      options = options.save_to(dir.join(format!("{chart}.png")));
    }
    options
  }
}

/// One measured batch of a suite.
#[derive(Debug, Clone)]
pub struct BatchResult {
  pub title: String,
  pub result: TimingResult,
}

fn trips_predicate() -> Predicate {
  Predicate::after(PICKUP_COLUMN, PICKUP_CUTOFF_MICROS)
}

/// Engines of the filter suite: reading everything then filtering, pushing
/// everything into the blocking reader, and the async stream.
fn filter_engines() -> [(&'static str, Engine, Pushdown); 3] {
  [
    ("Eager", Engine::Eager, Pushdown::NONE),
    ("Pushdown", Engine::Eager, Pushdown::ALL),
    ("Streaming", Engine::Streaming, Pushdown::ALL),
  ]
}

fn pushdown_strategies() -> [(&'static str, Pushdown); 4] {
  [
    ("Full Scan", Pushdown::NONE),
    ("Projection Pushdown", Pushdown::PROJECTION),
    ("Filter Pushdown", Pushdown::FILTER),
    ("Filter And Projection Pushdown", Pushdown::ALL),
  ]
}

pub fn read_write_tables() -> (ExperimentTable, ExperimentTable) {
  let write = ExperimentTable::new()
    .row("CSV Write", Action::WriteCsv)
    .row("Parquet Write", Action::WriteParquet);
  let read = ExperimentTable::new()
    .row("CSV Read", Action::ReadCsv)
    .row("Parquet Read", Action::ReadParquet);
  (write, read)
}

/// `(title, chart name, table)` for every batch of the filter suite.
pub fn filter_tables() -> Vec<(&'static str, &'static str, ExperimentTable)> {
  type Shape = fn(ScanConfig) -> ScanConfig;
  // (row name, title, chart, shape, also scan every file of the source)
  let shapes: [(&str, &str, &str, Shape, bool); 4] = [
    ("Read All", "Benchmark: Read All Data", "speed_read_all", |config| config, true),
    (
      "Filter & Return All Cols",
      "Benchmark: Filter & Return All Columns",
      "speed_filter_all",
      |config| config.filter(trips_predicate()),
      false,
    ),
    (
      "Filter & Return One Col",
      "Benchmark: Filter & Return One Column",
      "speed_filter_one",
      |config| config.filter(trips_predicate()).project([PICKUP_COLUMN]),
      false,
    ),
    (
      "Filtered Count",
      "Benchmark: Filtered Row Count",
      "speed_filter_count",
      |config| config.filter(trips_predicate()).project([PICKUP_COLUMN]).count(),
      false,
    ),
  ];

  let mut tables: Vec<(&str, &str, ExperimentTable)> = shapes
    .into_iter()
    .map(|(name, title, chart, shape, multi)| {
      let mut rows = Vec::new();
      for (engine_name, engine, pushdown) in filter_engines() {
        let config = shape(ScanConfig::new(engine).pushdown(pushdown));
        rows.push((format!("{engine_name} {name}"), Action::Scan(config.clone())));
        if multi {
          rows.push((format!("{engine_name} Read Multi"), Action::ScanMulti(config)));
        }
      }
      (title, chart, rows.into_iter().collect::<ExperimentTable>())
    })
    .collect();
  tables.push((
    "Benchmark: Miscellaneous Comparisons",
    "speed_misc",
    misc_table(),
  ));
  tables
}

/// Lazy against eager filtered reads, and filtering after the read against
/// filtering on read when a single column is kept.
pub fn misc_table() -> ExperimentTable {
  let filtered = |engine, pushdown| {
    ScanConfig::new(engine)
      .pushdown(pushdown)
      .filter(trips_predicate())
  };
  ExperimentTable::new()
    .row(
      "Lazy Filter Read",
      Action::Scan(filtered(Engine::Streaming, Pushdown::ALL)),
    )
    .row(
      "Eager Filter Read",
      Action::Scan(filtered(Engine::Eager, Pushdown::NONE)),
    )
    .row(
      "Read Then Filter",
      Action::Scan(filtered(Engine::Eager, Pushdown::NONE).project([PICKUP_COLUMN])),
    )
    .row(
      "Filter On Read",
      Action::Scan(filtered(Engine::Eager, Pushdown::FILTER).project([PICKUP_COLUMN])),
    )
}

pub fn pushdown_table(engine: Engine) -> ExperimentTable {
  pushdown_strategies()
    .into_iter()
    .map(|(strategy, pushdown)| {
      let config = ScanConfig::new(engine)
        .project([PICKUP_COLUMN, AMOUNT_COLUMN])
        .filter(trips_predicate())
        .pushdown(pushdown);
      (format!("{strategy} ({})", engine.name()), Action::Scan(config))
    })
    .collect()
}

pub fn sink_write_table() -> ExperimentTable {
  let config = ScanConfig::new(Engine::Streaming)
    .pushdown(Pushdown::ALL)
    .project([PICKUP_COLUMN, AMOUNT_COLUMN])
    .filter(trips_predicate());
  ExperimentTable::new()
    .row(
      "Read",
      Action::Scan(ScanConfig {
        engine: Engine::Eager,
        ..config.clone()
      }),
    )
    .row("Scan", Action::Plan(config.clone()))
    .row("Write", Action::WriteMaterialized(config.clone()))
    .row("Sink", Action::Sink(config))
}

/// Measure, report and chart every batch of `suite`.
pub fn run_suite(
  session: &Session,
  suite: Suite,
  runs: usize,
  presentation: &Presentation,
) -> Result<Vec<BatchResult>> {
  info!(%suite, runs, "running suite");
  match suite {
    Suite::ReadWrite => run_read_write(session, runs, presentation),
    Suite::Filter => run_filter(session, runs, presentation),
    Suite::Pushdown => run_pushdown(session, runs, presentation),
    Suite::SinkWrite => run_sink_write(session, runs, presentation),
  }
}

fn run_read_write(
  session: &Session,
  runs: usize,
  presentation: &Presentation,
) -> Result<Vec<BatchResult>> {
  const WRITE_TITLE: &str = "Write Benchmark: CSV vs Parquet";
  const READ_TITLE: &str = "Read Benchmark: CSV vs Parquet";

  let (write_table, read_table) = read_write_tables();
  let write = run_all(write_table.bind(session)?, runs)?;
  let read = run_all(read_table.bind(session)?, runs)?;

  let combined = write.clone().merge(read.clone())?;
  report(&combined, &presentation.options("Benchmark: CSV vs Parquet", None))?;
  if let Some(dir) = &presentation.chart_dir {
    render_panels(
      &[
        Panel {
          title: WRITE_TITLE,
          series: &write,
          label_rotation: 0,
        },
        Panel {
          title: READ_TITLE,
          series: &read,
          label_rotation: 0,
        },
      ],
      &dir.join("speed_csv_parquet.png"),
    )?;
  }

  Ok(vec![
    BatchResult {
      title: WRITE_TITLE.to_owned(),
      result: write,
    },
    BatchResult {
      title: READ_TITLE.to_owned(),
      result: read,
    },
  ])
}

fn run_filter(
  session: &Session,
  runs: usize,
  presentation: &Presentation,
) -> Result<Vec<BatchResult>> {
  let mut results = Vec::new();
  for (title, chart, table) in filter_tables() {
    let result = run_all(table.bind(session)?, runs)?;
    report(&result, &presentation.options(title, Some(chart)))?;
    results.push(BatchResult {
      title: title.to_owned(),
      result,
    });
  }
  Ok(results)
}

fn run_pushdown(
  session: &Session,
  runs: usize,
  presentation: &Presentation,
) -> Result<Vec<BatchResult>> {
  let mut results = Vec::new();
  let mut combined: Option<TimingResult> = None;

  for engine in [Engine::Eager, Engine::Streaming] {
    let title = format!("Benchmark: Pushdown Methods ({})", engine.name());
    let chart = format!("speed_pushdown_methods_{}", engine.name().to_lowercase());

    let result = run_all(pushdown_table(engine).bind(session)?, runs)?;
    report(&result, &presentation.options(&title, Some(chart.as_str())))?;

    let relative = normalize(&result)?;
    report(
      &relative,
      &presentation.options(&title, Some(format!("{chart}_relative").as_str())),
    )?;

    combined = Some(match combined {
      Some(combined) => combined.merge(result.clone())?,
      None => result.clone(),
    });
    results.push(BatchResult { title, result });
  }

  if let Some(combined) = combined {
    let title = "Benchmark: Pushdown Methods Combined";
    report(
      &combined,
      &presentation
        .options(title, Some("speed_pushdown_methods"))
        .rotate_labels(COMBINED_LABEL_ROTATION),
    )?;
  }
  Ok(results)
}

fn run_sink_write(
  session: &Session,
  runs: usize,
  presentation: &Presentation,
) -> Result<Vec<BatchResult>> {
  let title = "Parquet Sink vs Write Methods (With Filters)";
  let result = run_all(sink_write_table().bind(session)?, runs)?;
  report(
    &result,
    &presentation.options(title, Some("speed_sink_write_with_filters")),
  )?;
  Ok(vec![BatchResult {
    title: title.to_owned(),
    result,
  }])
}
