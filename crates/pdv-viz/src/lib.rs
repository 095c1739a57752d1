//! Plot rendering for comparison frames on top of `plotters`.
//!
//! [`display_plot`] picks the plots for a frame's value kind and statistics
//! mode, names them after the frame and draws them as SVG or PNG files.

pub mod color;
pub mod figure;
pub mod fonts;
pub mod histogram;
pub mod layout;
pub mod plots;
pub mod render;

pub use color::{parse_color, ColorAssignment, TAB10};
pub use figure::{FigureSettings, ImageFormat, Theme};
pub use fonts::{ensure_fonts, FONT_FAMILY};
pub use histogram::{Histogram, HISTOGRAM_BINS};
pub use layout::grid_layout;
pub use plots::{
    bar_heights, plot_bool_correlation, plot_bool_summary, plot_float_boxplot, plot_float_grid,
    plot_float_overlay, plot_scatter_matrix, BoxStats,
};
pub use render::{display_plot, plot_path, render_plot, FailedPlot, PlotKind, PlotOutput};
