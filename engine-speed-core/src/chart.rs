//! Bar charts of a [`Series`], rendered with `plotters`.

use std::path::Path;

use plotters::{
  coord::Shift,
  prelude::*,
  style::text_anchor::{HPos, Pos, VPos},
};
use tracing::info;

use crate::{
  error::{Error, Result},
  result::{Series, ValueKind},
};

const PANEL_SIZE: (u32, u32) = (640, 480);
const BAR_MARGIN: u32 = 12;

/// One titled chart inside an image.
pub struct Panel<'a> {
  pub title: &'a str,
  pub series: &'a dyn Series,
  pub label_rotation: u16,
}

/// Label orientations the text renderer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
  None,
  Quarter,
  Half,
  ThreeQuarter,
}

impl Rotation {
  /// Snap an angle in degrees to the nearest supported quarter turn. Small
  /// non-zero angles snap up so a requested rotation is never dropped.
  pub fn from_degrees(degrees: u16) -> Rotation {
    match degrees % 360 {
      0 => Rotation::None,
      1..=134 => Rotation::Quarter,
      135..=224 => Rotation::Half,
      225..=314 => Rotation::ThreeQuarter,
      _ => Rotation::None,
    }
  }

  fn transform(self) -> FontTransform {
    match self {
      Rotation::None => FontTransform::None,
      Rotation::Quarter => FontTransform::Rotate90,
      Rotation::Half => FontTransform::Rotate180,
      Rotation::ThreeQuarter => FontTransform::Rotate270,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageFormat {
  Raster,
  Svg,
}

fn image_format(destination: &Path) -> Result<ImageFormat> {
  let extension = destination
    .extension()
    .and_then(|ext| ext.to_str())
    .map(str::to_ascii_lowercase);
  match extension.as_deref() {
    Some("png" | "bmp" | "jpg" | "jpeg") => Ok(ImageFormat::Raster),
    Some("svg") => Ok(ImageFormat::Svg),
    _ => Err(Error::UnsupportedFormat(destination.to_path_buf())),
  }
}

/// Render a single bar chart to `destination`.
pub fn render_chart(
  series: &dyn Series,
  title: &str,
  label_rotation: u16,
  destination: &Path,
) -> Result<()> {
  render_panels(
    &[Panel {
      title,
      series,
      label_rotation,
    }],
    destination,
  )
}

/// Render several bar charts side by side into one image. The image format
/// follows the file extension of `destination`.
pub fn render_panels(panels: &[Panel<'_>], destination: &Path) -> Result<()> {
  let format = image_format(destination)?;
  if panels.is_empty() || panels.iter().any(|panel| panel.series.is_empty()) {
    return Err(Error::EmptyResult);
  }

  let size = (PANEL_SIZE.0 * panels.len() as u32, PANEL_SIZE.1);
  match format {
    ImageFormat::Raster => {
      draw(BitMapBackend::new(destination, size).into_drawing_area(), panels)?
    }
    ImageFormat::Svg => draw(SVGBackend::new(destination, size).into_drawing_area(), panels)?,
  }
  info!(path = %destination.display(), panels = panels.len(), "chart written");
  Ok(())
}

fn draw<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, panels: &[Panel<'_>]) -> Result<()> {
  root.fill(&WHITE).map_err(chart_error)?;
  let areas = root.split_evenly((1, panels.len()));
  for (area, panel) in areas.iter().zip(panels) {
    draw_panel(area, panel)?;
  }
  root.present().map_err(chart_error)
}

fn draw_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &Panel<'_>) -> Result<()> {
  let entries = panel.series.entries();
  let kind = panel.series.kind();
  let labels = panel.series.labels();
  let rotation = Rotation::from_degrees(panel.label_rotation);

  let longest = labels.iter().map(|label| label.len()).max().unwrap_or(0) as u32;
  let x_label_area = match rotation {
    Rotation::Quarter | Rotation::ThreeQuarter => 20 + longest * 7,
    _ => 40,
  };

  let mut chart = ChartBuilder::on(area)
    .caption(panel.title, ("sans-serif", 20))
    .margin(10)
    .x_label_area_size(x_label_area)
    .y_label_area_size(60)
    .build_cartesian_2d((0..entries.len() - 1).into_segmented(), 0f64..y_upper(panel.series))
    .map_err(chart_error)?;

  chart
    .configure_mesh()
    .disable_x_mesh()
    .x_labels(entries.len())
    .x_label_formatter(&|value: &SegmentValue<usize>| match value {
      SegmentValue::CenterOf(idx) => labels.get(*idx).map(|l| l.to_string()).unwrap_or_default(),
      _ => String::new(),
    })
    .x_label_style(("sans-serif", 12).into_font().transform(rotation.transform()))
    .y_desc(kind.header())
    .y_label_formatter(&|value: &f64| format!("{value:.3}"))
    .draw()
    .map_err(chart_error)?;

  chart
    .draw_series(
      Histogram::vertical(&chart)
        .style_func(|value, _| {
          let idx = match value {
            SegmentValue::Exact(idx) | SegmentValue::CenterOf(idx) => *idx,
            SegmentValue::Last => 0,
          };
          Palette99::pick(idx).mix(0.6).filled()
        })
        .margin(BAR_MARGIN)
        .data(entries.iter().enumerate().map(|(idx, entry)| (idx, entry.value))),
    )
    .map_err(chart_error)?;

  let annotation = ("sans-serif", 12)
    .into_font()
    .color(&BLACK)
    .pos(Pos::new(HPos::Center, VPos::Bottom));
  chart
    .draw_series(entries.iter().enumerate().map(|(idx, entry)| {
      Text::new(
        annotate(kind, entry.value),
        (SegmentValue::CenterOf(idx), entry.value),
        annotation.clone(),
      )
    }))
    .map_err(chart_error)?;

  Ok(())
}

/// Y-axis upper bound leaving headroom for the value annotations.
fn y_upper(series: &dyn Series) -> f64 {
  let max = series
    .entries()
    .iter()
    .map(|entry| entry.value)
    .filter(|value| value.is_finite())
    .fold(0.0, f64::max);
  if max > 0.0 {
    max * 1.15
  } else {
    1.0
  }
}

fn annotate(kind: ValueKind, value: f64) -> String {
  match kind {
    ValueKind::Seconds => format!("{value:.4}"),
    ValueKind::Relative => format!("{value:.2}x"),
  }
}

fn chart_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> Error {
  Error::Chart(err.to_string())
}
