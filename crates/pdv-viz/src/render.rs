//! Plot artifacts for one comparison frame: which plots, where they go, which backend draws them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use pdv_core::{slugify, ComparisonFrame, PdvError, StatisticsMode, ValueKind, ValueRange};

use crate::color::ColorAssignment;
use crate::figure::{FigureSettings, ImageFormat};
use crate::fonts::ensure_fonts;
use crate::plots::{
    plot_bool_correlation, plot_bool_summary, plot_float_boxplot, plot_float_grid, plot_float_overlay,
    plot_scatter_matrix,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    BoolSummary,
    BoolCorrelation,
    Histogram,
    HistogramLog,
    Grid,
    GridLog,
    Boxplot,
    ScatterMatrix,
}

impl PlotKind {
    /// File name suffix appended to the frame slug.
    pub fn suffix(&self) -> &'static str {
        match self {
            PlotKind::HistogramLog => "_log_scale",
            PlotKind::Grid => "_grid",
            PlotKind::GridLog => "_grid_log_scale",
            PlotKind::Boxplot => "_boxplot",
            PlotKind::BoolSummary | PlotKind::BoolCorrelation | PlotKind::Histogram | PlotKind::ScatterMatrix => "",
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            PlotKind::BoolSummary | PlotKind::BoolCorrelation => ValueKind::Bool,
            _ => ValueKind::Float,
        }
    }

    /// Plots drawn for a frame in a comparison sweep. Boolean correlation is left out.
    pub fn for_frame(kind: ValueKind, statistics: StatisticsMode) -> &'static [PlotKind] {
        match (kind, statistics) {
            (ValueKind::Bool, StatisticsMode::Summary) => &[PlotKind::BoolSummary],
            (ValueKind::Bool, StatisticsMode::Correlation) => &[],
            (ValueKind::Float, StatisticsMode::Summary) => &[
                PlotKind::Histogram,
                PlotKind::HistogramLog,
                PlotKind::Grid,
                PlotKind::GridLog,
                PlotKind::Boxplot,
            ],
            (ValueKind::Float, StatisticsMode::Correlation) => &[PlotKind::ScatterMatrix],
        }
    }
}

pub fn plot_path(dir: &Path, frame_name: &str, kind: PlotKind, format: ImageFormat) -> PathBuf {
    dir.join(format!("{}{}.{}", slugify(frame_name), kind.suffix(), format.extension()))
}

/// Draws one plot of `frame` into `path` with the configured backend.
pub fn render_plot(
    kind: PlotKind,
    frame: &ComparisonFrame,
    colors: &ColorAssignment,
    settings: &FigureSettings,
    path: &Path,
) -> Result<()> {
    let size = settings.pixel_size();
    match settings.extension {
        ImageFormat::Svg => draw_plot(SVGBackend::new(path, size).into_drawing_area(), kind, frame, colors, settings),
        ImageFormat::Png => draw_plot(BitMapBackend::new(path, size).into_drawing_area(), kind, frame, colors, settings),
    }
    .with_context(|| format!("drawing {}", path.display()))
}

fn draw_plot<DB>(
    root: DrawingArea<DB, Shift>,
    kind: PlotKind,
    frame: &ComparisonFrame,
    colors: &ColorAssignment,
    settings: &FigureSettings,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if frame.is_empty() {
        return Err(PdvError::Render(format!("'{}' has no values to plot", frame.name)).into());
    }
    if frame.kind() != kind.value_kind() {
        return Err(PdvError::Render(format!(
            "{kind:?} needs {} values but '{}' holds {} values",
            kind.value_kind(),
            frame.name,
            frame.kind()
        ))
        .into());
    }
    ensure_fonts()?;
    let theme = settings.theme();
    let range = || -> Result<ValueRange> {
        let range = frame
            .range
            .or_else(|| frame.data_range())
            .ok_or_else(|| PdvError::Render(format!("'{}' has no value range", frame.name)))?;
        if !range.is_finite() {
            return Err(PdvError::Render(format!(
                "'{}' has a non-finite value range [{}, {}]",
                frame.name, range.low, range.high
            ))
            .into());
        }
        Ok(range)
    };

    match kind {
        PlotKind::BoolSummary => plot_bool_summary(&root, frame, colors, &theme)?,
        PlotKind::BoolCorrelation => plot_bool_correlation(&root, frame, &theme)?,
        PlotKind::Histogram => plot_float_overlay(&root, frame, &range()?, colors, &theme, false)?,
        PlotKind::HistogramLog => plot_float_overlay(&root, frame, &range()?, colors, &theme, true)?,
        PlotKind::Grid => plot_float_grid(&root, frame, &range()?, colors, &theme, false)?,
        PlotKind::GridLog => plot_float_grid(&root, frame, &range()?, colors, &theme, true)?,
        PlotKind::Boxplot => plot_float_boxplot(&root, frame, &range()?, colors, &theme)?,
        PlotKind::ScatterMatrix => plot_scatter_matrix(&root, frame, colors, &theme)?,
    }
    root.present()?;
    Ok(())
}

/// A plot that could not be drawn.
#[derive(Debug, Clone, Serialize)]
pub struct FailedPlot {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlotOutput {
    pub written: Vec<PathBuf>,
    pub failed: Vec<FailedPlot>,
}

/// Draws every plot the sweep wants for `frame` under `dir`.
///
/// Missing colors and an unwritable directory fail the whole frame; a plot that
/// fails to draw is recorded in [`PlotOutput::failed`] and the others still run.
pub fn display_plot(
    frame: &ComparisonFrame,
    statistics: StatisticsMode,
    colors: &ColorAssignment,
    settings: &FigureSettings,
    dir: &Path,
) -> Result<PlotOutput> {
    colors.check_versions(frame.versions())?;
    let kinds = PlotKind::for_frame(frame.kind(), statistics);
    let mut output = PlotOutput::default();
    if kinds.is_empty() {
        debug!(frame = %frame.name, statistics = %statistics, "no plot for this combination");
        return Ok(output);
    }
    fs::create_dir_all(dir).with_context(|| format!("creating plot directory {}", dir.display()))?;

    for &kind in kinds {
        let path = plot_path(dir, &frame.name, kind, settings.extension);
        match render_plot(kind, frame, colors, settings, &path) {
            Ok(()) => output.written.push(path),
            Err(err) => {
                warn!(plot = %path.display(), error = %format!("{err:#}"), "plot failed");
                output.failed.push(FailedPlot {
                    path,
                    error: format!("{err:#}"),
                });
            }
        }
    }
    Ok(output)
}
