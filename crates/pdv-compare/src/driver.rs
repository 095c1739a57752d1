//! The comparison sweep over display × statistics × focus.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use pdv_core::{
    slugify, AggregatedMetric, DisplayMode, FocusMode, PdvResult, StatisticsMode, VersionedMetricSet,
};
use pdv_io::write_report;
use pdv_viz::{display_plot, ColorAssignment, FigureSettings};

use crate::manifest::{write_comparison_manifest, ComparisonManifest, SkippedArtifact, MANIFEST_FILE};

/// Enabled modes of one sweep. Order within each list is the sweep order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonPlan {
    pub display_modes: Vec<DisplayMode>,
    pub statistics_modes: Vec<StatisticsMode>,
    pub focus_modes: Vec<FocusMode>,
}

impl ComparisonPlan {
    pub fn all() -> Self {
        Self {
            display_modes: DisplayMode::all().to_vec(),
            statistics_modes: StatisticsMode::all().to_vec(),
            focus_modes: FocusMode::all().to_vec(),
        }
    }

    /// Cartesian product in display, statistics, focus nesting order.
    pub fn combinations(&self) -> Vec<(DisplayMode, StatisticsMode, FocusMode)> {
        let mut out = Vec::new();
        for &display in &self.display_modes {
            for &statistics in &self.statistics_modes {
                for &focus in &self.focus_modes {
                    out.push((display, statistics, focus));
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.display_modes.is_empty() || self.statistics_modes.is_empty() || self.focus_modes.is_empty()
    }
}

impl Default for ComparisonPlan {
    fn default() -> Self {
        Self::all()
    }
}

/// Aggregated frames keyed by (metric, focus), kept for the length of one run.
#[derive(Debug, Default)]
pub struct AggregationCache {
    entries: HashMap<(String, FocusMode), AggregatedMetric>,
    hits: usize,
    misses: usize,
}

impl AggregationCache {
    pub fn get_or_aggregate(
        &mut self,
        metrics: &VersionedMetricSet,
        metric: &str,
        focus: FocusMode,
    ) -> PdvResult<&AggregatedMetric> {
        match self.entries.entry((metric.to_string(), focus)) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let aggregated = metrics.aggregate(metric, focus)?;
                self.misses += 1;
                Ok(entry.insert(aggregated))
            }
        }
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of [`ComparisonDriver::run`].
#[derive(Debug, Clone)]
pub struct ComparisonSummary {
    pub artifacts: Vec<PathBuf>,
    pub skipped: Vec<SkippedArtifact>,
    pub manifest_path: PathBuf,
}

pub struct ComparisonDriver<'a> {
    metrics: &'a VersionedMetricSet,
    colors: &'a ColorAssignment,
    figure: &'a FigureSettings,
    plan: ComparisonPlan,
    cache: AggregationCache,
}

impl fmt::Debug for ComparisonDriver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonDriver")
            .field("versions", &self.metrics.versions())
            .field("figure", self.figure)
            .field("plan", &self.plan)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Artifacts and skips collected over one run. `claimed` maps each artifact
/// stem (directory plus frame slug) to the metric and frame that own it.
#[derive(Default)]
struct SweepOutput {
    artifacts: Vec<PathBuf>,
    skipped: Vec<SkippedArtifact>,
    claimed: HashMap<PathBuf, (String, String)>,
}

impl<'a> ComparisonDriver<'a> {
    /// Fails when a version has no color or the figure settings are unusable,
    /// so nothing is written for a run that cannot plot.
    pub fn new(
        metrics: &'a VersionedMetricSet,
        colors: &'a ColorAssignment,
        figure: &'a FigureSettings,
        plan: ComparisonPlan,
    ) -> Result<Self> {
        if plan.display_modes.contains(&DisplayMode::Plot) {
            colors
                .check_versions(metrics.versions().iter().map(String::as_str))
                .context("checking version colors")?;
        }
        figure.validate().context("checking figure settings")?;
        Ok(Self {
            metrics,
            colors,
            figure,
            plan,
            cache: AggregationCache::default(),
        })
    }

    pub fn cache(&self) -> &AggregationCache {
        &self.cache
    }

    /// Writes every enabled artifact under `output_root` and the manifest at its top.
    ///
    /// A frame that cannot be summarized or drawn is recorded as skipped and the
    /// sweep moves on; only failing to create directories or the manifest aborts.
    pub fn run(&mut self, output_root: &Path) -> Result<ComparisonSummary> {
        fs::create_dir_all(output_root)
            .with_context(|| format!("creating comparison output root '{}'", output_root.display()))?;
        let metric_names: Vec<String> = self.metrics.metric_names().map(str::to_string).collect();
        let mut output = SweepOutput::default();

        for (display_mode, statistics, focus) in self.plan.combinations() {
            let combo_dir = output_root
                .join(display_mode.as_str())
                .join(statistics.as_str())
                .join(focus.as_str());
            fs::create_dir_all(&combo_dir)
                .with_context(|| format!("creating output directory '{}'", combo_dir.display()))?;
            info!(display = %display_mode, %statistics, %focus, "comparing {} metrics", metric_names.len());

            for (position, metric) in metric_names.iter().enumerate() {
                info!(
                    metric = %metric,
                    "[{}/{}] {display_mode}/{statistics}/{focus}",
                    position + 1,
                    metric_names.len()
                );
                let dir = combo_dir.join(slugify(metric));
                self.compare_metric(metric, display_mode, statistics, focus, &dir, &mut output);
            }
        }

        let SweepOutput { artifacts, skipped, .. } = output;
        debug!(hits = self.cache.hits(), misses = self.cache.misses(), "aggregation cache");
        let manifest = ComparisonManifest {
            created_at: Utc::now(),
            versions: self.metrics.versions().to_vec(),
            metrics: metric_names,
            display_modes: self.plan.display_modes.clone(),
            statistics_modes: self.plan.statistics_modes.clone(),
            focus_modes: self.plan.focus_modes.clone(),
            artifacts_written: artifacts.len(),
            skipped: skipped.clone(),
        };
        let manifest_path = output_root.join(MANIFEST_FILE);
        write_comparison_manifest(&manifest_path, &manifest)?;
        if !skipped.is_empty() {
            warn!(count = skipped.len(), "some artifacts were skipped");
        }
        Ok(ComparisonSummary {
            artifacts,
            skipped,
            manifest_path,
        })
    }

    fn compare_metric(
        &mut self,
        metric: &str,
        display: DisplayMode,
        statistics: StatisticsMode,
        focus: FocusMode,
        dir: &Path,
        output: &mut SweepOutput,
    ) {
        let skip = |frame: &str, path: Option<&Path>, error: String| {
            warn!(frame = %frame, error = %error, "skipping artifact");
            SkippedArtifact {
                display,
                statistics,
                focus,
                frame: frame.to_string(),
                path: path.map(|p| p.display().to_string()),
                error,
            }
        };

        let aggregated = match self.cache.get_or_aggregate(self.metrics, metric, focus) {
            Ok(aggregated) => aggregated,
            Err(err) => {
                output.skipped.push(skip(metric, None, err.to_string()));
                return;
            }
        };

        for frame in &aggregated.frames {
            // Distinct names can share a slug; the first frame keeps the files.
            match output.claimed.entry(dir.join(slugify(&frame.name))) {
                Entry::Occupied(owner) if owner.get() != &(metric.to_string(), frame.name.clone()) => {
                    let error = format!("frame name collides with '{}' on disk", owner.get().1);
                    output.skipped.push(skip(&frame.name, Some(owner.key().as_path()), error));
                    continue;
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert((metric.to_string(), frame.name.clone()));
                }
            }
            match display {
                DisplayMode::Table => match write_report(frame, statistics, dir) {
                    Ok(path) => output.artifacts.push(path),
                    Err(err) => output.skipped.push(skip(&frame.name, None, err.to_string())),
                },
                DisplayMode::Plot => match display_plot(frame, statistics, self.colors, self.figure, dir) {
                    Ok(plots) => {
                        output.artifacts.extend(plots.written);
                        for failed in plots.failed {
                            output.skipped.push(skip(&frame.name, Some(failed.path.as_path()), failed.error));
                        }
                    }
                    Err(err) => output.skipped.push(skip(&frame.name, None, format!("{err:#}"))),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdv_core::MetricTable;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn voltage_table(offset: f64) -> MetricTable {
        MetricTable::from_float_rows(
            ids(&["s1", "s2"]),
            ids(&["b1", "b2", "b3"]),
            vec![
                vec![1.00 + offset, 0.98, 1.02],
                vec![0.97, 1.01 + offset, 0.99],
            ],
        )
        .unwrap()
    }

    fn metric_set(versions: &[&str]) -> VersionedMetricSet {
        VersionedMetricSet::from_versions(versions.iter().enumerate().map(|(i, name)| {
            let mut tables = BTreeMap::new();
            tables.insert("bus_voltage".to_string(), voltage_table(i as f64 * 0.01));
            (name.to_string(), tables)
        }))
        .unwrap()
    }

    fn colors(versions: &[&str]) -> ColorAssignment {
        ColorAssignment::from_specs(versions.iter().map(|v| (*v, None::<&str>))).unwrap()
    }

    #[test]
    fn combinations_nest_display_statistics_focus() {
        let plan = ComparisonPlan {
            display_modes: vec![DisplayMode::Table],
            statistics_modes: vec![StatisticsMode::Summary, StatisticsMode::Correlation],
            focus_modes: vec![FocusMode::All, FocusMode::Object],
        };
        assert_eq!(
            plan.combinations(),
            vec![
                (DisplayMode::Table, StatisticsMode::Summary, FocusMode::All),
                (DisplayMode::Table, StatisticsMode::Summary, FocusMode::Object),
                (DisplayMode::Table, StatisticsMode::Correlation, FocusMode::All),
                (DisplayMode::Table, StatisticsMode::Correlation, FocusMode::Object),
            ]
        );
        assert_eq!(ComparisonPlan::default().combinations().len(), 12);
    }

    #[test]
    fn table_sweep_writes_one_report_per_frame() {
        let dir = tempdir().unwrap();
        let metrics = metric_set(&["v1", "v2"]);
        let colors = colors(&["v1", "v2"]);
        let figure = FigureSettings::default();
        let plan = ComparisonPlan {
            display_modes: vec![DisplayMode::Table],
            statistics_modes: vec![StatisticsMode::Summary],
            focus_modes: vec![FocusMode::All, FocusMode::Object],
        };
        let mut driver = ComparisonDriver::new(&metrics, &colors, &figure, plan).unwrap();
        let summary = driver.run(dir.path()).unwrap();

        assert!(summary.skipped.is_empty());
        // one frame for focus all, one per entity for focus object
        assert_eq!(summary.artifacts.len(), 4);
        let base = dir.path().join("table/summary");
        assert!(base.join("all/bus_voltage/bus_voltage.txt").is_file());
        for entity in ["b1", "b2", "b3"] {
            let report = base.join(format!("object/bus_voltage/bus_voltage-{entity}.txt"));
            assert!(report.is_file(), "{}", report.display());
        }
        assert!(summary.manifest_path.ends_with(MANIFEST_FILE));
    }

    #[test]
    fn aggregation_is_reused_across_statistics_and_display() {
        let dir = tempdir().unwrap();
        let metrics = metric_set(&["v1", "v2"]);
        let colors = colors(&["v1", "v2"]);
        let figure = FigureSettings::default();
        let plan = ComparisonPlan {
            display_modes: vec![DisplayMode::Table, DisplayMode::Plot],
            statistics_modes: StatisticsMode::all().to_vec(),
            focus_modes: vec![FocusMode::All],
        };
        let mut driver = ComparisonDriver::new(&metrics, &colors, &figure, plan).unwrap();
        let summary = driver.run(dir.path()).unwrap();

        assert_eq!(driver.cache().misses(), 1);
        assert_eq!(driver.cache().hits(), 3);
        assert_eq!(driver.cache().len(), 1);
        // 2 reports, 5 summary plots, 1 scatter matrix
        assert_eq!(summary.artifacts.len(), 8);
        assert!(dir
            .path()
            .join("plot/correlation/all/bus_voltage/bus_voltage.svg")
            .is_file());
    }

    #[test]
    fn single_version_scatter_matrix_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let metrics = metric_set(&["only"]);
        let colors = colors(&["only"]);
        let figure = FigureSettings::default();
        let plan = ComparisonPlan {
            display_modes: vec![DisplayMode::Plot],
            statistics_modes: StatisticsMode::all().to_vec(),
            focus_modes: vec![FocusMode::All],
        };
        let mut driver = ComparisonDriver::new(&metrics, &colors, &figure, plan).unwrap();
        let summary = driver.run(dir.path()).unwrap();

        assert_eq!(summary.artifacts.len(), 5);
        assert_eq!(summary.skipped.len(), 1);
        let skipped = &summary.skipped[0];
        assert_eq!(skipped.statistics, StatisticsMode::Correlation);
        assert!(skipped.error.contains("at least two versions"));

        let manifest = crate::manifest::load_comparison_manifest(&summary.manifest_path).unwrap();
        assert_eq!(manifest.artifacts_written, 5);
        assert_eq!(manifest.skipped, summary.skipped);
    }

    #[test]
    fn missing_color_fails_before_any_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("run");
        let metrics = metric_set(&["v1", "v2"]);
        let colors = colors(&["v1"]);
        let figure = FigureSettings::default();
        let err = ComparisonDriver::new(&metrics, &colors, &figure, ComparisonPlan::all()).unwrap_err();
        assert!(format!("{err:#}").contains("v2"));
        assert!(!out.exists());

        let driver = ComparisonDriver::new(&metrics, &colors, &figure, ComparisonPlan {
            display_modes: vec![DisplayMode::Table],
            ..ComparisonPlan::all()
        })
        .unwrap();
        let debug = format!("{driver:?}");
        assert!(debug.starts_with("ComparisonDriver"));
        assert!(debug.contains("\"v2\""));
    }

    #[test]
    fn colliding_frame_slugs_keep_the_first_report() {
        let dir = tempdir().unwrap();
        let table = MetricTable::from_float_rows(
            ids(&["s1", "s2"]),
            ids(&["b 1", "b-1", "b3"]),
            vec![vec![1.0, 2.0, 3.0], vec![1.5, 2.5, 3.5]],
        )
        .unwrap();
        let metrics = VersionedMetricSet::from_versions(["v1", "v2"].map(|v| {
            (v.to_string(), BTreeMap::from([("bus_voltage".to_string(), table.clone())]))
        }))
        .unwrap();
        let colors = colors(&["v1", "v2"]);
        let figure = FigureSettings::default();
        let plan = ComparisonPlan {
            display_modes: vec![DisplayMode::Table],
            statistics_modes: vec![StatisticsMode::Summary],
            focus_modes: vec![FocusMode::Object],
        };
        let mut driver = ComparisonDriver::new(&metrics, &colors, &figure, plan).unwrap();
        let summary = driver.run(dir.path()).unwrap();

        assert_eq!(summary.artifacts.len(), 2);
        assert_eq!(summary.skipped.len(), 1);
        let skipped = &summary.skipped[0];
        assert_eq!(skipped.frame, "bus_voltage - b-1");
        assert!(skipped.error.contains("collides with 'bus_voltage - b 1'"), "{}", skipped.error);
        assert!(skipped.path.as_deref().unwrap().ends_with("bus_voltage-b-1"));
        let report = dir.path().join("table/summary/object/bus_voltage/bus_voltage-b-1.txt");
        assert!(report.is_file());
    }

    #[test]
    fn infinite_cells_still_plot() {
        let dir = tempdir().unwrap();
        let table = |bad: f64| {
            MetricTable::from_float_rows(ids(&["s1", "s2"]), ids(&["l1", "l2"]), vec![vec![0.4, bad], vec![0.9, 0.7]])
                .unwrap()
        };
        let metrics = VersionedMetricSet::from_versions([("v1", f64::INFINITY), ("v2", 0.5)].map(|(v, bad)| {
            (v.to_string(), BTreeMap::from([("line_loading".to_string(), table(bad))]))
        }))
        .unwrap();
        let colors = colors(&["v1", "v2"]);
        let figure = FigureSettings::default();
        let plan = ComparisonPlan {
            display_modes: vec![DisplayMode::Plot],
            statistics_modes: StatisticsMode::all().to_vec(),
            focus_modes: vec![FocusMode::All],
        };
        let mut driver = ComparisonDriver::new(&metrics, &colors, &figure, plan).unwrap();
        let summary = driver.run(dir.path()).unwrap();

        assert!(summary.skipped.is_empty(), "{:?}", summary.skipped);
        assert_eq!(summary.artifacts.len(), 6);
    }
}
