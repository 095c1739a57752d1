use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use pdv_core::{DisplayMode, FocusMode, StatisticsMode};

pub const MANIFEST_FILE: &str = "comparison_manifest.json";

/// An artifact the sweep could not produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedArtifact {
    pub display: DisplayMode,
    pub statistics: StatisticsMode,
    pub focus: FocusMode,
    pub frame: String,
    pub path: Option<String>,
    pub error: String,
}

impl fmt::Display for SkippedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} '{}'",
            self.display, self.statistics, self.focus, self.frame
        )?;
        if let Some(path) = &self.path {
            write!(f, " ({path})")?;
        }
        write!(f, ": {}", self.error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonManifest {
    pub created_at: DateTime<Utc>,
    pub versions: Vec<String>,
    pub metrics: Vec<String>,
    pub display_modes: Vec<DisplayMode>,
    pub statistics_modes: Vec<StatisticsMode>,
    pub focus_modes: Vec<FocusMode>,
    pub artifacts_written: usize,
    pub skipped: Vec<SkippedArtifact>,
}

pub fn write_comparison_manifest(path: &Path, manifest: &ComparisonManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(manifest)
        .context("serializing comparison manifest to JSON")?;
    fs::write(path, json)
        .with_context(|| format!("writing comparison manifest '{}'", path.display()))?;
    Ok(())
}

pub fn load_comparison_manifest(path: &Path) -> Result<ComparisonManifest> {
    let file = fs::File::open(path)
        .with_context(|| format!("opening comparison manifest '{}'", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("parsing comparison manifest '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn manifest_lists_skipped_artifacts() {
        let skipped = SkippedArtifact {
            display: DisplayMode::Plot,
            statistics: StatisticsMode::Correlation,
            focus: FocusMode::All,
            frame: "Bus Voltage (p.u.)".into(),
            path: Some("plot/correlation/all/bus-voltage-pu/bus-voltage-pu.svg".into()),
            error: "scatter matrix needs at least two versions".into(),
        };
        let manifest = ComparisonManifest {
            created_at: Utc::now(),
            versions: vec!["ref".into()],
            metrics: vec!["Bus Voltage (p.u.)".into()],
            display_modes: vec![DisplayMode::Plot],
            statistics_modes: vec![StatisticsMode::Correlation],
            focus_modes: vec![FocusMode::All],
            artifacts_written: 0,
            skipped: vec![skipped.clone()],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("run").join(MANIFEST_FILE);
        write_comparison_manifest(&path, &manifest).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"statistics\": \"correlation\""));
        let parsed = load_comparison_manifest(&path).unwrap();
        assert_eq!(parsed.skipped, vec![skipped.clone()]);
        assert_eq!(
            skipped.to_string(),
            "plot/correlation/all 'Bus Voltage (p.u.)' (plot/correlation/all/bus-voltage-pu/bus-voltage-pu.svg): scatter matrix needs at least two versions"
        );
    }
}
