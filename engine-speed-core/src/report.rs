use std::{
  io::{self, Write},
  path::PathBuf,
};

use crate::{
  chart::render_chart,
  error::Result,
  result::{Series, ValueKind},
};

const LABEL_HEADER: &str = "Method";
const TEXT_BAR_WIDTH: usize = 40;

/// How a result is presented.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
  pub title: String,
  /// Chart image to write, format picked from the extension.
  pub destination: Option<PathBuf>,
  /// Rotation of the chart's x labels, in degrees.
  pub label_rotation: u16,
  /// Also draw the chart on the console.
  pub display: bool,
}

impl ReportOptions {
  pub fn new(title: impl Into<String>) -> Self {
    ReportOptions {
      title: title.into(),
      ..Default::default()
    }
  }

  pub fn save_to(mut self, destination: impl Into<PathBuf>) -> Self {
    self.destination = Some(destination.into());
    self
  }

  pub fn rotate_labels(mut self, degrees: u16) -> Self {
    self.label_rotation = degrees;
    self
  }

  pub fn display(mut self, display: bool) -> Self {
    self.display = display;
    self
  }
}

/// Print the table (and, when asked, the console chart) to stdout and write
/// the chart image if a destination is set.
pub fn report(result: &dyn Series, options: &ReportOptions) -> Result<()> {
  let stdout = io::stdout();
  let mut out = stdout.lock();
  write_report(&mut out, result, options)?;
  out.flush()?;

  if let Some(destination) = &options.destination {
    render_chart(result, &options.title, options.label_rotation, destination)?;
  }
  Ok(())
}

/// Console part of [`report`], written to any sink.
pub fn write_report<W: Write>(
  out: &mut W,
  result: &dyn Series,
  options: &ReportOptions,
) -> Result<()> {
  if !options.title.is_empty() {
    writeln!(out, "\n{}", options.title)?;
  }
  write_table(out, result)?;
  if options.display {
    write_text_chart(out, result)?;
  }
  Ok(())
}

fn format_value(kind: ValueKind, value: f64) -> String {
  match kind {
    ValueKind::Seconds => format!("{value:.6}"),
    ValueKind::Relative => format!("{value:.3}"),
  }
}

/// Markdown table of label and value.
pub fn write_table<W: Write>(out: &mut W, result: &dyn Series) -> Result<()> {
  let kind = result.kind();
  let header = kind.header();
  let values: Vec<String> = result
    .entries()
    .iter()
    .map(|entry| format_value(kind, entry.value))
    .collect();

  let label_width = result
    .labels()
    .iter()
    .map(|label| label.chars().count())
    .chain([LABEL_HEADER.len()])
    .max()
    .unwrap_or(0);
  let value_width = values
    .iter()
    .map(String::len)
    .chain([header.len()])
    .max()
    .unwrap_or(0);

  writeln!(out, "| {LABEL_HEADER:<label_width$} | {header:<value_width$} |")?;
  writeln!(
    out,
    "|{}|{}|",
    "-".repeat(label_width + 2),
    "-".repeat(value_width + 2)
  )?;
  for (entry, value) in result.entries().iter().zip(&values) {
    writeln!(out, "| {:<label_width$} | {value:>value_width$} |", entry.label)?;
  }
  Ok(())
}

/// Horizontal bars scaled to the largest value.
pub fn write_text_chart<W: Write>(out: &mut W, result: &dyn Series) -> Result<()> {
  let kind = result.kind();
  let label_width = result
    .labels()
    .iter()
    .map(|label| label.chars().count())
    .max()
    .unwrap_or(0);
  let max = result
    .entries()
    .iter()
    .map(|entry| entry.value)
    .filter(|value| value.is_finite())
    .fold(0.0, f64::max);

  writeln!(out)?;
  for entry in result.entries() {
    let width = if max > 0.0 && entry.value.is_finite() && entry.value > 0.0 {
      ((entry.value / max) * TEXT_BAR_WIDTH as f64).round().max(1.0) as usize
    } else {
      0
    };
    writeln!(
      out,
      "{:<label_width$} | {} {}",
      entry.label,
      "█".repeat(width),
      format_value(kind, entry.value)
    )?;
  }
  Ok(())
}
