use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pdv_core::{MetricTable, PdvError, PdvResult, VersionedMetricSet};

use crate::csv_table::{read_table, write_table};

const CACHE_ROOT: &str = "pdv";

/// A named dataset version and the directory holding its sample files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSource {
    pub name: String,
    pub path: PathBuf,
}

/// Directory holding the cached metric tables of one version for one processor.
pub fn metrics_cache_dir(version_path: &Path, processor: &str) -> PathBuf {
    version_path.join(CACHE_ROOT).join(processor)
}

/// Writes one `<metric>.csv` per table into `dir`, creating it if needed.
pub fn save_metrics(tables: &BTreeMap<String, MetricTable>, dir: &Path) -> PdvResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(tables.len());
    for (metric, table) in tables {
        if metric.is_empty() || metric.contains(['/', '\\']) {
            return Err(PdvError::Validation(format!(
                "metric name '{metric}' cannot be used as a file name"
            )));
        }
        let path = dir.join(format!("{metric}.csv"));
        write_table(table, &path)?;
        debug!(metric = %metric, path = %path.display(), "wrote metric table");
        written.push(path);
    }
    info!(count = written.len(), dir = %dir.display(), "saved metric tables");
    Ok(written)
}

/// Reads every `*.csv` in `dir`; the metric name is the file stem.
pub fn load_metrics(dir: &Path) -> PdvResult<BTreeMap<String, MetricTable>> {
    if !dir.is_dir() {
        return Err(PdvError::Validation(format!(
            "metrics directory {} does not exist",
            dir.display()
        )));
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut tables = BTreeMap::new();
    for path in paths {
        let Some(metric) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let table = read_table(&path)?;
        tables.insert(metric.to_string(), table);
    }
    Ok(tables)
}

/// Loads the cached metrics of every version and validates them as one set.
pub fn load_multiple_metrics(versions: &[VersionSource], processor: &str) -> PdvResult<VersionedMetricSet> {
    let mut loaded = Vec::with_capacity(versions.len());
    for version in versions {
        let dir = metrics_cache_dir(&version.path, processor);
        let tables = load_metrics(&dir).map_err(|err| match err {
            PdvError::Validation(msg) => {
                PdvError::Validation(format!("dataset version '{}': {msg}", version.name))
            }
            other => other,
        })?;
        info!(version = %version.name, metrics = tables.len(), "loaded metrics");
        loaded.push((version.name.clone(), tables));
    }
    VersionedMetricSet::from_versions(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdv_core::{ValueKind, Values};
    use tempfile::tempdir;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn metrics(names: &[&str]) -> BTreeMap<String, MetricTable> {
        names
            .iter()
            .map(|name| {
                let table = MetricTable::from_float_rows(
                    ids(&["s1", "s2"]),
                    ids(&["0"]),
                    vec![vec![1.0], vec![2.0]],
                )
                .unwrap();
                (name.to_string(), table)
            })
            .collect()
    }

    #[test]
    fn cache_dir_is_namespaced_by_processor() {
        let dir = metrics_cache_dir(Path::new("data/v1"), "dc");
        assert_eq!(dir, Path::new("data/v1/pdv/dc"));
    }

    #[test]
    fn saved_metrics_load_back() {
        let root = tempdir().unwrap();
        let dir = root.path().join("metrics");
        let mut tables = metrics(&["Joule losses", "cost"]);
        tables.insert(
            "N-1 line".to_string(),
            MetricTable::new(ids(&["s1"]), ids(&["l1"]), Values::from_bools([false])).unwrap(),
        );
        let written = save_metrics(&tables, &dir).unwrap();
        assert_eq!(written.len(), 3);

        let loaded = load_metrics(&dir).unwrap();
        assert_eq!(loaded.keys().collect::<Vec<_>>(), tables.keys().collect::<Vec<_>>());
        assert_eq!(loaded["N-1 line"].kind(), ValueKind::Bool);
        assert_eq!(loaded["cost"], tables["cost"]);
    }

    #[test]
    fn slash_in_metric_name_is_rejected() {
        let root = tempdir().unwrap();
        let err = save_metrics(&metrics(&["cost/MWh"]), root.path()).unwrap_err();
        assert!(matches!(err, PdvError::Validation(_)));
    }

    #[test]
    fn multiple_versions_build_a_set() {
        let root = tempdir().unwrap();
        let sources: Vec<VersionSource> = ["v1", "v2"]
            .iter()
            .map(|name| VersionSource {
                name: name.to_string(),
                path: root.path().join(name),
            })
            .collect();
        for source in &sources {
            save_metrics(&metrics(&["cost", "losses"]), &metrics_cache_dir(&source.path, "snapshot"))
                .unwrap();
        }
        let set = load_multiple_metrics(&sources, "snapshot").unwrap();
        assert_eq!(set.versions(), &ids(&["v1", "v2"])[..]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn mismatched_metric_files_name_version_and_metrics() {
        let root = tempdir().unwrap();
        let v1 = VersionSource {
            name: "v1".into(),
            path: root.path().join("v1"),
        };
        let v2 = VersionSource {
            name: "v2".into(),
            path: root.path().join("v2"),
        };
        save_metrics(&metrics(&["cost", "losses"]), &metrics_cache_dir(&v1.path, "dc")).unwrap();
        save_metrics(&metrics(&["cost"]), &metrics_cache_dir(&v2.path, "dc")).unwrap();

        let err = load_multiple_metrics(&[v1, v2], "dc").unwrap_err();
        assert!(matches!(err, PdvError::SchemaMismatch(_)));
        let message = err.to_string();
        assert!(message.contains("'v2'"));
        assert!(message.contains("missing [losses]"));
    }

    #[test]
    fn flag_metric_without_data_loads_next_to_flag_data() {
        let root = tempdir().unwrap();
        let sources: Vec<VersionSource> = ["reference", "generated", "partial"]
            .iter()
            .map(|name| VersionSource {
                name: name.to_string(),
                path: root.path().join(name),
            })
            .collect();
        let flags = MetricTable::from_bool_rows(ids(&["s1"]), ids(&["l1"]), vec![vec![true]]).unwrap();
        let no_rows = MetricTable::new(Vec::new(), ids(&["l1"]), Values::empty(ValueKind::Bool)).unwrap();
        let no_values = MetricTable::new(ids(&["s1"]), ids(&["l1"]), Values::missing(ValueKind::Bool, 1)).unwrap();
        for (source, table) in sources.iter().zip([no_rows, flags, no_values]) {
            let tables = BTreeMap::from([("Line N-1".to_string(), table)]);
            save_metrics(&tables, &metrics_cache_dir(&source.path, "dc")).unwrap();
        }

        let set = load_multiple_metrics(&sources, "dc").unwrap();
        assert_eq!(set.kind("Line N-1"), Some(ValueKind::Bool));
        assert_eq!(set.table("Line N-1", "reference").unwrap().n_samples(), 0);
        assert_eq!(set.table("Line N-1", "partial").unwrap().kind(), ValueKind::Bool);
    }

    #[test]
    fn missing_cache_names_the_version() {
        let root = tempdir().unwrap();
        let source = VersionSource {
            name: "generated".into(),
            path: root.path().join("nowhere"),
        };
        let err = load_multiple_metrics(&[source], "dc").unwrap_err();
        assert!(err.to_string().contains("'generated'"));
    }
}
