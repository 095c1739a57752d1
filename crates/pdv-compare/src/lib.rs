//! Runs a full comparison of several dataset versions: every enabled
//! display, statistics and focus mode, for every metric, with a manifest of
//! what was written and what was skipped.

pub mod driver;
pub mod manifest;

pub use driver::{AggregationCache, ComparisonDriver, ComparisonPlan, ComparisonSummary};
pub use manifest::{
    load_comparison_manifest, write_comparison_manifest, ComparisonManifest, SkippedArtifact, MANIFEST_FILE,
};
