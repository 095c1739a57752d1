//! Plot bodies for comparison frames, generic over the plotters backend.
//!
//! Every function draws into an already-created drawing area and leaves
//! presenting it to the caller, so the same code renders SVG files, PNG files
//! and in-memory SVG strings.

use anyhow::Result;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::{CoordTranslate, Shift};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use pdv_core::stats::quantile_sorted;
use pdv_core::{correlation_matrix, ComparisonFrame, PdvError, ValueRange};

use crate::color::ColorAssignment;
use crate::figure::Theme;
use crate::fonts::{ensure_fonts, FONT_FAMILY};
use crate::histogram::{Histogram, HISTOGRAM_BINS};
use crate::layout::grid_layout;

/// Half the width of a box, in units of the distance between two boxes.
const BOX_HALF_WIDTH: f64 = 0.3;
/// Whisker caps are half as wide as the box.
const CAP_HALF_WIDTH: f64 = 0.15;
/// Empty margin left and right of the outer boxes.
const BOX_MARGIN: f64 = 0.6;

fn caption_style(theme: &Theme) -> TextStyle<'static> {
    (FONT_FAMILY, 20).into_font().color(&theme.foreground)
}

fn panel_caption_style(theme: &Theme) -> TextStyle<'static> {
    (FONT_FAMILY, 14).into_font().color(&theme.foreground)
}

fn label_style(theme: &Theme) -> TextStyle<'static> {
    (FONT_FAMILY, 12).into_font().color(&theme.foreground)
}

macro_rules! themed_mesh {
    ($chart:expr, $theme:expr) => {
        $chart
            .configure_mesh()
            .axis_style(&$theme.foreground)
            .label_style(label_style($theme))
            .bold_line_style(&$theme.foreground.mix(0.1))
            .light_line_style(&$theme.background)
    };
}

fn frame_colors(frame: &ComparisonFrame, colors: &ColorAssignment) -> Result<Vec<RGBColor>> {
    let palette = frame
        .versions()
        .map(|version| colors.color_for(version))
        .collect::<Result<Vec<_>, PdvError>>()?;
    Ok(palette)
}

/// Version name for an axis position that falls exactly on a version slot.
fn version_label(versions: &[&str], position: f64) -> String {
    let slot = position.round();
    if (position - slot).abs() > 1e-6 || slot < 0.0 {
        return String::new();
    }
    versions
        .get(slot as usize)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn scale_caption(name: &str, log: bool) -> String {
    if log {
        format!("{name} - Log Scale")
    } else {
        name.to_string()
    }
}

fn frame_histograms(frame: &ComparisonFrame, bounds: (f64, f64)) -> Vec<Histogram> {
    frame
        .columns
        .iter()
        .map(|c| Histogram::density(&c.values.present_f64(), bounds, HISTOGRAM_BINS))
        .collect()
}

fn padded_max(histograms: &[Histogram]) -> f64 {
    let max = histograms.iter().map(Histogram::max_density).fold(0.0, f64::max);
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

/// Lower bound of a log-scaled density axis, below every drawn bar.
fn log_floor(histograms: &[Histogram], y_max: f64) -> f64 {
    let min = histograms
        .iter()
        .filter_map(Histogram::min_positive_density)
        .fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        (min / 2.0).min(y_max / 10.0)
    } else {
        y_max / 10.0
    }
}

fn draw_density<'a, DB, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, Y>>,
    histogram: &Histogram,
    color: RGBColor,
    alpha: f64,
    floor: f64,
    label: Option<&str>,
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    Y: Ranged<ValueType = f64>,
{
    let fill = color.mix(alpha).filled();
    let series = chart.draw_series(
        histogram
            .bins()
            .filter(|(_, _, density)| *density > floor)
            .map(|(left, right, density)| Rectangle::new([(left, floor), (right, density)], fill)),
    )?;
    if let Some(label) = label {
        series
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], fill));
    }
    Ok(())
}

fn draw_legend<'a, DB, CT>(chart: &mut ChartContext<'a, DB, CT>, theme: &Theme) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    CT: CoordTranslate,
{
    chart
        .configure_series_labels()
        .background_style(&theme.background.mix(0.8))
        .border_style(&theme.foreground)
        .label_font(label_style(theme))
        .draw()?;
    Ok(())
}

/// Share of `true` cells per version, the bar heights of the boolean summary.
pub fn bar_heights(frame: &ComparisonFrame) -> Vec<f64> {
    frame
        .columns
        .iter()
        .map(|c| c.values.true_fraction().unwrap_or(0.0))
        .collect()
}

/// One bar per version on a fixed `[0, 1.1]` axis, labelled with its percentage.
pub fn plot_bool_summary<DB>(
    root: &DrawingArea<DB, Shift>,
    frame: &ComparisonFrame,
    colors: &ColorAssignment,
    theme: &Theme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    ensure_fonts()?;
    let palette = frame_colors(frame, colors)?;
    let versions: Vec<&str> = frame.versions().collect();
    let heights = bar_heights(frame);
    let n = versions.len();

    root.fill(&theme.background)?;
    let mut chart = ChartBuilder::on(root)
        .caption(&frame.name, caption_style(theme))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..n as f64 - 0.5, 0.0f64..1.1)?;

    themed_mesh!(chart, theme)
        .disable_x_mesh()
        .x_labels(n + 1)
        .x_label_formatter(&|x| version_label(&versions, *x))
        .y_labels(3)
        .y_label_formatter(&|y| format!("{:.0}%", y * 100.0))
        .draw()?;

    chart.draw_series(heights.iter().zip(&palette).enumerate().map(|(i, (&height, color))| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, height)], color.filled())
    }))?;

    let annotation = label_style(theme).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(heights.iter().enumerate().map(|(i, &height)| {
        Text::new(
            format!("{:.2}%", height * 100.0),
            (i as f64, height + 0.03),
            annotation.clone(),
        )
    }))?;
    Ok(())
}

fn heat_style(r: f64) -> (ShapeStyle, RGBColor) {
    if r.is_nan() {
        return (RGBColor(0x80, 0x80, 0x80).filled(), WHITE);
    }
    let t = ((r + 1.0) / 2.0).clamp(0.0, 1.0);
    let lightness = 0.22 + 0.50 * t;
    let text = if lightness > 0.5 { BLACK } else { WHITE };
    (HSLColor((240.0 - 240.0 * t) / 360.0, 0.85, lightness).filled(), text)
}

/// Correlation matrix of a boolean frame as a heat map on `[-1, 1]`.
pub fn plot_bool_correlation<DB>(
    root: &DrawingArea<DB, Shift>,
    frame: &ComparisonFrame,
    theme: &Theme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    ensure_fonts()?;
    let versions: Vec<&str> = frame.versions().collect();
    let n = versions.len();
    if n == 0 {
        return Err(PdvError::Render(format!("'{}' has no versions to correlate", frame.name)).into());
    }
    let matrix = correlation_matrix(frame);
    let top = (n - 1) as f64;

    root.fill(&theme.background)?;
    let mut chart = ChartBuilder::on(root)
        .caption(&frame.name, caption_style(theme))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..n as f64 - 0.5, -0.5f64..n as f64 - 0.5)?;

    themed_mesh!(chart, theme)
        .disable_mesh()
        .x_labels(n + 1)
        .y_labels(n + 1)
        .x_label_formatter(&|x| version_label(&versions, *x))
        .y_label_formatter(&|y| version_label(&versions, top - *y))
        .draw()?;

    let cells: Vec<(f64, f64, f64)> = (0..n)
        .flat_map(|i| (0..n).map(move |j| (j as f64, top - i as f64, i * n + j)))
        .map(|(x, y, k)| (x, y, matrix[k / n][k % n]))
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, r)| {
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], heat_style(r).0)
    }))?;
    chart.draw_series(cells.iter().map(|&(x, y, r)| {
        let style = (FONT_FAMILY, 12)
            .into_font()
            .color(&heat_style(r).1)
            .pos(Pos::new(HPos::Center, VPos::Center));
        Text::new(format!("{r:.2}"), (x, y), style)
    }))?;
    Ok(())
}

/// Overlaid semi-transparent density histograms of every version.
pub fn plot_float_overlay<DB>(
    root: &DrawingArea<DB, Shift>,
    frame: &ComparisonFrame,
    range: &ValueRange,
    colors: &ColorAssignment,
    theme: &Theme,
    log: bool,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    ensure_fonts()?;
    let palette = frame_colors(frame, colors)?;
    let (low, high) = range.drawing_bounds();
    let histograms = frame_histograms(frame, (low, high));
    let y_max = padded_max(&histograms);

    root.fill(&theme.background)?;
    let mut builder = ChartBuilder::on(root);
    builder
        .caption(scale_caption(&frame.name, log), caption_style(theme))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(15);

    let series = histograms.iter().zip(&palette).zip(frame.versions());
    if log {
        let y_min = log_floor(&histograms, y_max);
        let mut chart = builder.build_cartesian_2d(low..high, (y_min..y_max).log_scale())?;
        themed_mesh!(chart, theme)
            .y_label_formatter(&|_| String::new())
            .draw()?;
        for ((histogram, color), version) in series {
            draw_density(&mut chart, histogram, *color, 0.5, y_min, Some(version))?;
        }
        draw_legend(&mut chart, theme)?;
    } else {
        let mut chart = builder.build_cartesian_2d(low..high, 0.0..y_max)?;
        themed_mesh!(chart, theme)
            .y_label_formatter(&|_| String::new())
            .draw()?;
        for ((histogram, color), version) in series {
            draw_density(&mut chart, histogram, *color, 0.5, 0.0, Some(version))?;
        }
        draw_legend(&mut chart, theme)?;
    }
    Ok(())
}

/// One histogram panel per version, all panels sharing the y scale.
pub fn plot_float_grid<DB>(
    root: &DrawingArea<DB, Shift>,
    frame: &ComparisonFrame,
    range: &ValueRange,
    colors: &ColorAssignment,
    theme: &Theme,
    log: bool,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    ensure_fonts()?;
    let palette = frame_colors(frame, colors)?;
    let (low, high) = range.drawing_bounds();
    let histograms = frame_histograms(frame, (low, high));
    let y_max = padded_max(&histograms);
    let y_min = log_floor(&histograms, y_max);

    root.fill(&theme.background)?;
    let body = root.titled(&scale_caption(&frame.name, log), caption_style(theme))?;
    let panels = body.split_evenly(grid_layout(histograms.len()));

    // Panels past the last version stay empty.
    let series = histograms.iter().zip(&palette).zip(frame.versions());
    for (panel, ((histogram, color), version)) in panels.iter().zip(series) {
        let mut builder = ChartBuilder::on(panel);
        builder
            .caption(version, panel_caption_style(theme))
            .margin(5)
            .x_label_area_size(25)
            .y_label_area_size(5);
        if log {
            let mut chart = builder.build_cartesian_2d(low..high, (y_min..y_max).log_scale())?;
            themed_mesh!(chart, theme)
                .x_labels(4)
                .y_label_formatter(&|_| String::new())
                .draw()?;
            draw_density(&mut chart, histogram, *color, 1.0, y_min, None)?;
        } else {
            let mut chart = builder.build_cartesian_2d(low..high, 0.0..y_max)?;
            themed_mesh!(chart, theme)
                .x_labels(4)
                .y_label_formatter(&|_| String::new())
                .draw()?;
            draw_density(&mut chart, histogram, *color, 1.0, 0.0, None)?;
        }
    }
    Ok(())
}

/// Quartiles, 1.5 IQR whiskers and outliers of one version's values.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let (fence_low, fence_high) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
        let whisker_low = sorted.iter().copied().find(|v| *v >= fence_low).unwrap_or(q1);
        let whisker_high = sorted.iter().rev().copied().find(|v| *v <= fence_high).unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < fence_low || *v > fence_high)
            .collect();
        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// Hollow box plots, one per version at evenly spaced positions, y clipped to the range.
pub fn plot_float_boxplot<DB>(
    root: &DrawingArea<DB, Shift>,
    frame: &ComparisonFrame,
    range: &ValueRange,
    colors: &ColorAssignment,
    theme: &Theme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    ensure_fonts()?;
    let palette = frame_colors(frame, colors)?;
    let versions: Vec<&str> = frame.versions().collect();
    let n = versions.len();
    let (low, high) = range.drawing_bounds();

    root.fill(&theme.background)?;
    let mut chart = ChartBuilder::on(root)
        .caption(&frame.name, caption_style(theme))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(-BOX_MARGIN..(n as f64 - 1.0) + BOX_MARGIN, low..high)?;

    themed_mesh!(chart, theme)
        .disable_x_mesh()
        .x_labels(n + 1)
        .x_label_formatter(&|x| version_label(&versions, *x))
        .draw()?;

    for (i, (column, color)) in frame.columns.iter().zip(&palette).enumerate() {
        let Some(stats) = BoxStats::of(&column.values.present_f64()) else {
            continue;
        };
        let x = i as f64;
        let stroke = color.stroke_width(1);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - BOX_HALF_WIDTH, stats.q1), (x + BOX_HALF_WIDTH, stats.q3)],
            stroke,
        )))?;
        chart.draw_series([
            PathElement::new(
                vec![(x - BOX_HALF_WIDTH, stats.median), (x + BOX_HALF_WIDTH, stats.median)],
                stroke,
            ),
            PathElement::new(vec![(x, stats.q1), (x, stats.whisker_low)], stroke),
            PathElement::new(vec![(x, stats.q3), (x, stats.whisker_high)], stroke),
            PathElement::new(
                vec![(x - CAP_HALF_WIDTH, stats.whisker_low), (x + CAP_HALF_WIDTH, stats.whisker_low)],
                stroke,
            ),
            PathElement::new(
                vec![(x - CAP_HALF_WIDTH, stats.whisker_high), (x + CAP_HALF_WIDTH, stats.whisker_high)],
                stroke,
            ),
        ])?;
        chart.draw_series(stats.outliers.iter().map(|&v| Circle::new((x, v), 3, stroke)))?;
    }
    Ok(())
}

/// Pairwise scatter matrix: histograms on the diagonal, `y = x` reference lines elsewhere.
///
/// The axes span the frame's own values padded by 10%.
pub fn plot_scatter_matrix<DB>(
    root: &DrawingArea<DB, Shift>,
    frame: &ComparisonFrame,
    colors: &ColorAssignment,
    theme: &Theme,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    ensure_fonts()?;
    let n = frame.n_columns();
    if n < 2 {
        return Err(PdvError::Render(format!(
            "scatter matrix of '{}' needs at least two versions, got {n}",
            frame.name
        ))
        .into());
    }
    let palette = frame_colors(frame, colors)?;
    let range = frame
        .data_range()
        .ok_or_else(|| PdvError::Render(format!("'{}' has no values to plot", frame.name)))?;
    let (low, high) = range.drawing_bounds();
    let identity = theme.foreground.mix(0.5).stroke_width(1);
    let marker = theme.scatter.filled();

    root.fill(&theme.background)?;
    let body = root.titled(&frame.name, caption_style(theme))?;
    let panels = body.split_evenly((n, n));

    for (k, panel) in panels.iter().enumerate() {
        let (row, col) = (k / n, k % n);
        let x_desc = if row + 1 == n { frame.columns[col].version.as_str() } else { "" };
        let y_desc = if col == 0 { frame.columns[row].version.as_str() } else { "" };
        let mut builder = ChartBuilder::on(panel);
        builder
            .margin(3)
            .x_label_area_size(if row + 1 == n { 35 } else { 0 })
            .y_label_area_size(if col == 0 { 25 } else { 0 });

        if row == col {
            let histogram = Histogram::density(
                &frame.columns[row].values.present_f64(),
                (low, high),
                HISTOGRAM_BINS,
            );
            let y_max = padded_max(std::slice::from_ref(&histogram));
            let mut chart = builder.build_cartesian_2d(low..high, 0.0..y_max)?;
            themed_mesh!(chart, theme)
                .x_labels(3)
                .x_desc(x_desc)
                .y_desc(y_desc)
                .y_label_formatter(&|_| String::new())
                .draw()?;
            draw_density(&mut chart, &histogram, palette[row], 1.0, 0.0, None)?;
        } else {
            let mut chart = builder.build_cartesian_2d(low..high, low..high)?;
            themed_mesh!(chart, theme)
                .x_labels(3)
                .x_desc(x_desc)
                .y_desc(y_desc)
                .y_label_formatter(&|_| String::new())
                .draw()?;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(low, low), (high, high)],
                identity,
            )))?;
            let xs = &frame.columns[col].values;
            let ys = &frame.columns[row].values;
            chart.draw_series(
                (0..xs.len().min(ys.len()))
                    .filter_map(|r| Some((xs.get_f64(r)?, ys.get_f64(r)?)))
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|point| Circle::new(point, 1, marker)),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::FigureSettings;
    use pdv_core::{FrameColumn, Values};

    fn colors() -> ColorAssignment {
        ColorAssignment::from_specs([("ref", Some("tab:blue")), ("gen", Some("tab:orange"))]).unwrap()
    }

    fn frame(name: &str, a: Values, b: Values) -> ComparisonFrame {
        let rows = a.len();
        let mut frame = ComparisonFrame {
            name: name.to_string(),
            index: (0..rows).map(|i| i.to_string()).collect(),
            columns: vec![
                FrameColumn { version: "ref".into(), values: a },
                FrameColumn { version: "gen".into(), values: b },
            ],
            range: None,
        };
        frame.range = frame.data_range();
        frame
    }

    fn float_frame() -> ComparisonFrame {
        frame(
            "Bus Voltage (p.u.)",
            Values::from_floats([0.95, 1.0, 1.02, 1.05, 1.3]),
            Values::from_floats([0.97, 0.99, 1.01, 1.03, 1.04]),
        )
    }

    fn render_svg<F>(draw: F) -> String
    where
        F: FnOnce(&DrawingArea<SVGBackend, Shift>) -> Result<()>,
    {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (640, 480)).into_drawing_area();
            draw(&root).unwrap();
            root.present().unwrap();
        }
        svg
    }

    #[test]
    fn all_true_flags_give_full_bars() {
        let frame = frame(
            "Line N-1",
            Values::from_bools([true, true]),
            Values::from_bools([true, true]),
        );
        assert_eq!(bar_heights(&frame), vec![1.0, 1.0]);

        let theme = FigureSettings::default().theme();
        let svg = render_svg(|root| plot_bool_summary(root, &frame, &colors(), &theme));
        assert!(svg.contains("100.00%"));
        assert!(svg.contains("Line N-1"));
    }

    #[test]
    fn missing_flags_do_not_count_as_false() {
        let frame = frame(
            "flags",
            Values::Bool(vec![Some(true), None, Some(false), Some(true)]),
            Values::Bool(vec![None; 4]),
        );
        let heights = bar_heights(&frame);
        assert!((heights[0] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(heights[1], 0.0);
    }

    #[test]
    fn box_stats_use_one_and_a_half_iqr_whiskers() {
        let stats = BoxStats::of(&[1.0, 2.0, 3.0, 4.0, 100.0, f64::NAN, f64::INFINITY]).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (2.0, 3.0, 4.0));
        assert_eq!((stats.whisker_low, stats.whisker_high), (1.0, 4.0));
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(BoxStats::of(&[]).is_none());
    }

    #[test]
    fn float_summary_plots_draw_every_version() {
        let frame = float_frame();
        let range = frame.range.unwrap();
        let theme = FigureSettings::default().theme();
        for log in [false, true] {
            let svg = render_svg(|root| plot_float_overlay(root, &frame, &range, &colors(), &theme, log));
            assert!(svg.contains("<rect"));
            assert!(svg.contains("gen"));
            let svg = render_svg(|root| plot_float_grid(root, &frame, &range, &colors(), &theme, log));
            assert!(svg.contains("ref"));
        }
        let svg = render_svg(|root| plot_float_boxplot(root, &frame, &range, &colors(), &theme));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn degenerate_range_still_draws() {
        let frame = frame("flat", Values::from_floats([1.0, 1.0]), Values::from_floats([1.0, 1.0]));
        let range = frame.range.unwrap();
        assert!(range.is_degenerate());
        let theme = FigureSettings::default().theme();
        render_svg(|root| plot_float_overlay(root, &frame, &range, &colors(), &theme, false));
    }

    #[test]
    fn scatter_matrix_needs_two_versions() {
        let mut single = float_frame();
        single.columns.truncate(1);
        let theme = FigureSettings::default().theme();
        let mut svg = String::new();
        let root = SVGBackend::with_string(&mut svg, (640, 480)).into_drawing_area();
        let err = plot_scatter_matrix(&root, &single, &colors(), &theme).unwrap_err();
        assert!(matches!(err.downcast_ref::<PdvError>(), Some(PdvError::Render(_))));

        let svg = render_svg(|root| plot_scatter_matrix(root, &float_frame(), &colors(), &theme));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn unassigned_version_is_a_config_error() {
        let frame = float_frame();
        let range = frame.range.unwrap();
        let only_ref = ColorAssignment::from_specs([("ref", Some("red"))]).unwrap();
        let theme = FigureSettings::default().theme();
        let mut svg = String::new();
        let root = SVGBackend::with_string(&mut svg, (640, 480)).into_drawing_area();
        let err = plot_float_boxplot(&root, &frame, &range, &only_ref, &theme).unwrap_err();
        assert!(err.to_string().contains("'gen'"));
    }

    #[test]
    fn bool_correlation_annotates_the_diagonal() {
        let frame = frame(
            "flags",
            Values::from_bools([true, false, true, false]),
            Values::from_bools([true, false, false, false]),
        );
        let theme = FigureSettings { night_mode: true, ..FigureSettings::default() }.theme();
        let svg = render_svg(|root| plot_bool_correlation(root, &frame, &theme));
        assert!(svg.contains("1.00"));
    }
}
