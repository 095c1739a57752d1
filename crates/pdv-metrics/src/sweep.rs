//! Evaluates a processor's metrics over every sample file of one dataset version.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use pdv_core::{MetricTable, MetricTableBuilder};

use crate::processor::MetricsProcessor;
use crate::registry::MetricValues;

/// A sample file that could not be loaded, simulated or evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSample {
    pub sample: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct MetricsSweep {
    /// Metric name → table with one row per evaluated sample.
    pub tables: BTreeMap<String, MetricTable>,
    pub evaluated: usize,
    pub skipped: Vec<SkippedSample>,
}

/// `*.json` files of `data_dir`, sorted by name.
pub fn sample_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("reading dataset directory {}", data_dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Runs `processor` over every sample of `data_dir`. A failing sample is logged
/// and skipped; it adds no row to any table.
pub fn compute_metrics(data_dir: &Path, processor: &dyn MetricsProcessor) -> Result<MetricsSweep> {
    let files = sample_files(data_dir)?;
    info!(
        processor = processor.name(),
        samples = files.len(),
        dir = %data_dir.display(),
        "computing metrics"
    );

    let mut builders: BTreeMap<&'static str, MetricTableBuilder> = processor
        .registry()
        .names()
        .map(|name| (name, MetricTableBuilder::new()))
        .collect();
    let mut evaluated = 0;
    let mut skipped = Vec::new();

    for path in files {
        let sample_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let outcome = evaluate_sample(&path, processor).and_then(|rows| {
            for (metric, values) in &rows {
                let builder = builders
                    .get(metric)
                    .ok_or_else(|| anyhow!("metric '{metric}' is not registered"))?;
                builder
                    .check_row(&sample_id, &values.entities, &values.values)
                    .with_context(|| format!("metric '{metric}'"))?;
            }
            Ok(rows)
        });

        match outcome {
            Ok(rows) => {
                for (metric, values) in rows {
                    if let Some(builder) = builders.get_mut(metric) {
                        builder.push_row(&sample_id, &values.entities, &values.values)?;
                    }
                }
                evaluated += 1;
                debug!(sample = %sample_id, "evaluated sample");
            }
            Err(err) => {
                warn!(sample = %sample_id, error = %format!("{err:#}"), "skipping sample");
                skipped.push(SkippedSample {
                    sample: sample_id,
                    error: format!("{err:#}"),
                });
            }
        }
    }

    let mut tables = BTreeMap::new();
    for (metric, builder) in builders {
        let table = builder
            .build()
            .with_context(|| format!("assembling table for metric '{metric}'"))?;
        tables.insert(metric.to_string(), table);
    }

    info!(evaluated, skipped = skipped.len(), "metrics computed");
    Ok(MetricsSweep {
        tables,
        evaluated,
        skipped,
    })
}

fn evaluate_sample(path: &Path, processor: &dyn MetricsProcessor) -> Result<Vec<(&'static str, MetricValues)>> {
    let mut sample = processor.load_sample(path)?;
    processor
        .run_simulation(&mut sample)
        .with_context(|| format!("simulating {}", path.display()))?;
    Ok(processor.registry().evaluate(&sample))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{ProcessorKind, SnapshotProcessor};
    use crate::sample::fixtures::triangle;
    use pdv_core::ValueKind;
    use tempfile::tempdir;

    fn write_sample(dir: &Path, name: &str, sample: &crate::sample::GridSample) {
        let text = serde_json::to_string(sample).unwrap();
        fs::write(dir.join(format!("{name}.json")), text).unwrap();
    }

    #[test]
    fn failing_samples_are_skipped() {
        let dir = tempdir().unwrap();
        write_sample(dir.path(), "s1", &triangle());
        let mut unsolved = triangle();
        unsolved.buses[0].res_vm_pu = None;
        write_sample(dir.path(), "s2", &unsolved);
        fs::write(dir.path().join("s3.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let mut shifted = triangle();
        shifted.buses[2].res_vm_pu = Some(1.0);
        write_sample(dir.path(), "s4", &shifted);

        let processor = SnapshotProcessor::new().unwrap();
        let sweep = compute_metrics(dir.path(), &processor).unwrap();

        assert_eq!(sweep.evaluated, 2);
        let skipped: Vec<&str> = sweep.skipped.iter().map(|s| s.sample.as_str()).collect();
        assert_eq!(skipped, vec!["s2", "s3"]);
        assert_eq!(sweep.tables.len(), 79);

        let voltage = &sweep.tables["Bus Voltage (p.u.)"];
        assert_eq!(voltage.samples(), &["s1".to_string(), "s4".to_string()][..]);
        assert_eq!(voltage.get_f64("s4", "b3"), Some(1.0));
        assert_eq!(sweep.tables["Line N-1"].kind(), ValueKind::Bool);
    }

    #[test]
    fn dc_sweep_fills_every_table() {
        let dir = tempdir().unwrap();
        write_sample(dir.path(), "a", &triangle());
        write_sample(dir.path(), "b", &triangle());
        let processor = ProcessorKind::Dc(crate::linear::SolverKind::Gauss).build().unwrap();
        let sweep = compute_metrics(dir.path(), processor.as_ref()).unwrap();
        assert!(sweep.skipped.is_empty());
        for table in sweep.tables.values() {
            assert_eq!(table.n_samples(), 2);
        }
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let processor = SnapshotProcessor::new().unwrap();
        assert!(compute_metrics(&dir.path().join("absent"), &processor).is_err());
    }
}
