use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use engine_speed_core::DEFAULT_RUNS;
use engine_speed_eval::{
  io::DEFAULT_ROW_GROUP_SIZE,
  session::SessionConfig,
  suite::{Presentation, Suite},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SuiteName {
  ReadWrite,
  Filter,
  Pushdown,
  SinkWrite,
}

impl From<SuiteName> for Suite {
  fn from(name: SuiteName) -> Suite {
    match name {
      SuiteName::ReadWrite => Suite::ReadWrite,
      SuiteName::Filter => Suite::Filter,
      SuiteName::Pushdown => Suite::Pushdown,
      SuiteName::SinkWrite => Suite::SinkWrite,
    }
  }
}

/// Measures CSV, Parquet and scan engine speed and reports the results.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub(crate) struct Args {
  /// Suites to run, in order. Runs every suite when omitted.
  #[clap(long = "suite", short, value_enum)]
  pub suites: Vec<SuiteName>,
  /// Timed invocations of every experiment
  #[clap(long, short, default_value_t = DEFAULT_RUNS.get())]
  pub runs: usize,
  /// Rows of each generated dataset
  #[clap(long, default_value_t = 1_000_000)]
  pub rows: usize,
  #[clap(long, default_value_t = 42)]
  pub seed: u64,
  #[clap(long, default_value_t = DEFAULT_ROW_GROUP_SIZE)]
  pub row_group_size: usize,
  /// Scan this Parquet file, or every Parquet file of this directory, instead
  /// of generated trips
  #[clap(long)]
  pub trips: Option<PathBuf>,
  /// Directory for generated and written data files
  #[clap(long, default_value = "data")]
  pub data_dir: PathBuf,
  /// Directory chart images are saved to
  #[clap(long, short, default_value = "charts")]
  pub out_dir: PathBuf,
  #[clap(long, help = "Do not save chart images")]
  pub no_charts: bool,
  #[clap(long, help = "Also draw every chart on the console")]
  pub display: bool,
  #[clap(long, help = "Write every measured batch to this file as JSON")]
  pub json: Option<PathBuf>,
  #[clap(long, short, action = ArgAction::Count, help = "More log output, repeat for more")]
  pub verbose: u8,
}

/// Everything a run needs, checked up front so that no suite starts with a
/// configuration that would fail halfway.
#[derive(Debug, Clone)]
pub(crate) struct RunConfig {
  pub suites: Vec<Suite>,
  pub runs: usize,
  pub session: SessionConfig,
  pub presentation: Presentation,
  pub json: Option<PathBuf>,
}

impl TryFrom<Args> for RunConfig {
  type Error = anyhow::Error;

  fn try_from(args: Args) -> Result<RunConfig> {
    if args.runs == 0 {
      bail!("--runs must be at least 1");
    }
    if args.rows == 0 {
      bail!("--rows must be at least 1");
    }
    if args.row_group_size == 0 {
      bail!("--row-group-size must be at least 1");
    }
    if let Some(trips) = &args.trips {
      if !trips.exists() {
        bail!("trips input {} does not exist", trips.display());
      }
    }

    let mut suites: Vec<Suite> = Vec::new();
    for suite in args.suites.into_iter().map(Suite::from) {
      if !suites.contains(&suite) {
        suites.push(suite);
      }
    }
    if suites.is_empty() {
      suites = Suite::ALL.to_vec();
    }

    let chart_dir = if args.no_charts {
      None
    } else {
      fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
      Some(args.out_dir)
    };

    let mut session = SessionConfig::new(args.data_dir);
    session.rows = args.rows;
    session.seed = args.seed;
    session.row_group_size = args.row_group_size;
    session.trips = args.trips;

    Ok(RunConfig {
      suites,
      runs: args.runs,
      session,
      presentation: Presentation {
        chart_dir,
        display: args.display,
      },
      json: args.json,
    })
  }
}
