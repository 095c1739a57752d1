//! JSON run configuration of `pdv compare`.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pdv_compare::ComparisonPlan;
use pdv_core::{DisplayMode, FocusMode, PdvError, PdvResult, StatisticsMode};
use pdv_io::VersionSource;
use pdv_metrics::ProcessorKind;
use pdv_viz::{ColorAssignment, FigureSettings};

fn default_processor() -> String {
    "snapshot".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("pdv_output")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetVersion {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub color: Option<String>,
}

/// Mode name → enabled flag, one map per sweep axis. A missing map enables
/// every mode of that axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModesConfig {
    pub display_modes: Option<BTreeMap<String, bool>>,
    pub statistics_modes: Option<BTreeMap<String, bool>>,
    pub focus_modes: Option<BTreeMap<String, bool>>,
}

impl ModesConfig {
    pub fn plan(&self) -> PdvResult<ComparisonPlan> {
        Ok(ComparisonPlan {
            display_modes: enabled(self.display_modes.as_ref(), DisplayMode::all())?,
            statistics_modes: enabled(self.statistics_modes.as_ref(), StatisticsMode::all())?,
            focus_modes: enabled(self.focus_modes.as_ref(), FocusMode::all())?,
        })
    }
}

/// Enabled modes in canonical order. Every key must name a mode.
fn enabled<M>(group: Option<&BTreeMap<String, bool>>, all: &[M]) -> PdvResult<Vec<M>>
where
    M: FromStr<Err = PdvError> + Copy + PartialEq,
{
    let Some(group) = group else {
        return Ok(all.to_vec());
    };
    let mut wanted = Vec::new();
    for (name, on) in group {
        let mode: M = name.parse()?;
        if *on {
            wanted.push(mode);
        }
    }
    Ok(all.iter().copied().filter(|m| wanted.contains(m)).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_processor")]
    pub processor: String,
    pub dataset_versions: Vec<DatasetVersion>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub modes: ModesConfig,
    #[serde(default)]
    pub figure_settings: FigureSettings,
}

impl RunConfig {
    /// Reads and validates a configuration file. Relative paths are taken
    /// from the directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading configuration '{}'", path.display()))?;
        let mut config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing configuration '{}'", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config
            .validate()
            .with_context(|| format!("invalid configuration '{}'", path.display()))?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for version in &mut self.dataset_versions {
            if version.path.is_relative() {
                version.path = base.join(&version.path);
            }
        }
        if self.output_dir.is_relative() {
            self.output_dir = base.join(&self.output_dir);
        }
    }

    /// Checks every name, color and setting without touching the filesystem.
    pub fn validate(&self) -> PdvResult<()> {
        self.processor_kind()?;
        if self.dataset_versions.is_empty() {
            return Err(PdvError::Config("no dataset versions configured".into()));
        }
        let mut names = HashSet::new();
        for version in &self.dataset_versions {
            if version.name.trim().is_empty() {
                return Err(PdvError::Config("dataset version with an empty name".into()));
            }
            if !names.insert(version.name.as_str()) {
                return Err(PdvError::Config(format!(
                    "dataset version '{}' is listed twice",
                    version.name
                )));
            }
        }
        self.colors()?;
        self.plan()?;
        self.figure_settings.validate()
    }

    pub fn processor_kind(&self) -> PdvResult<ProcessorKind> {
        self.processor.parse()
    }

    pub fn plan(&self) -> PdvResult<ComparisonPlan> {
        self.modes.plan()
    }

    pub fn colors(&self) -> PdvResult<ColorAssignment> {
        ColorAssignment::from_specs(
            self.dataset_versions
                .iter()
                .map(|v| (v.name.clone(), v.color.as_deref())),
        )
    }

    pub fn version_sources(&self) -> Vec<VersionSource> {
        self.dataset_versions
            .iter()
            .map(|v| VersionSource {
                name: v.name.clone(),
                path: v.path.clone(),
            })
            .collect()
    }
}
