//! Filesystem side of the pdv pipeline: metric tables as CSV, the per-version
//! metrics cache, and statistics reports.

pub mod cache;
pub mod csv_table;
pub mod report;

pub use cache::{load_metrics, load_multiple_metrics, metrics_cache_dir, save_metrics, VersionSource};
pub use csv_table::{parse_table, read_table, write_table};
pub use report::{display_table, render_latex, render_plain, write_report};
