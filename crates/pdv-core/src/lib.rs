//! Data model and pure computations of the pdv comparison pipeline.
//!
//! Metric tables from several dataset versions are validated into a
//! [`VersionedMetricSet`], aggregated into [`ComparisonFrame`]s along a
//! [`FocusMode`], and summarized into [`StatsTable`]s. Nothing in this crate
//! touches the filesystem; persistence lives in `pdv-io` and drawing in
//! `pdv-viz`.

pub mod aggregate;
pub mod error;
pub mod metric_set;
pub mod modes;
pub mod slug;
pub mod stats;
pub mod table;

pub use aggregate::{aggregate_versions, AggregatedMetric, ComparisonFrame, FrameColumn, ValueRange};
pub use error::{PdvError, PdvResult};
pub use metric_set::VersionedMetricSet;
pub use modes::{DisplayMode, FocusMode, StatisticsMode};
pub use slug::slugify;
pub use stats::{correlation_matrix, format_percent, format_sci, summarize, summarize_named, Describe, StatsTable};
pub use table::{MetricTable, MetricTableBuilder, ValueKind, Values, SCALAR_ENTITY};
