use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::aggregate::{aggregate_versions, AggregatedMetric};
use crate::error::{PdvError, PdvResult};
use crate::modes::FocusMode;
use crate::table::{MetricTable, ValueKind};

/// Metric name → (version → table), validated once and read-only afterwards.
///
/// Every version exposes the same metric names, and within a metric every
/// version's table has the same [`ValueKind`]. Tables are kept in version
/// order so comparison frames list versions the way the caller declared them.
#[derive(Debug, Clone)]
pub struct VersionedMetricSet {
    versions: Vec<String>,
    metrics: BTreeMap<String, Vec<MetricTable>>,
}

impl VersionedMetricSet {
    /// Builds the set from per-version metric maps, in version order.
    pub fn from_versions<I>(versions: I) -> PdvResult<Self>
    where
        I: IntoIterator<Item = (String, BTreeMap<String, MetricTable>)>,
    {
        let versions: Vec<(String, BTreeMap<String, MetricTable>)> = versions.into_iter().collect();
        let (reference_name, reference) = versions
            .first()
            .ok_or_else(|| PdvError::Validation("no dataset versions to compare".into()))?;
        let reference_names: BTreeSet<&String> = reference.keys().collect();

        let mut seen = HashSet::new();
        for (name, tables) in &versions {
            if !seen.insert(name.as_str()) {
                return Err(PdvError::Validation(format!(
                    "dataset version '{name}' is listed twice"
                )));
            }
            let names: BTreeSet<&String> = tables.keys().collect();
            if names != reference_names {
                let missing: Vec<&str> = reference_names
                    .difference(&names)
                    .map(|s| s.as_str())
                    .collect();
                let extra: Vec<&str> = names
                    .difference(&reference_names)
                    .map(|s| s.as_str())
                    .collect();
                return Err(PdvError::SchemaMismatch(format!(
                    "version '{name}' does not expose the metrics of '{reference_name}': missing [{}], extra [{}]",
                    missing.join(", "),
                    extra.join(", ")
                )));
            }
        }

        let version_names: Vec<String> = versions.iter().map(|(name, _)| name.clone()).collect();
        let mut metrics: BTreeMap<String, Vec<MetricTable>> = BTreeMap::new();
        for (_, tables) in versions {
            for (metric, table) in tables {
                metrics.entry(metric).or_default().push(table);
            }
        }

        for tables in metrics.values_mut() {
            // A table without a present cell says nothing about its kind; it
            // follows the first version that has data.
            let Some(kind) = tables.iter().find(|t| t.present_cells() > 0).map(MetricTable::kind) else {
                continue;
            };
            for table in tables.iter_mut() {
                if table.present_cells() == 0 && table.kind() != kind {
                    *table = table.blank_of(kind);
                }
            }
        }

        for (metric, tables) in &metrics {
            let kind = tables[0].kind();
            if let Some((idx, other)) = tables.iter().enumerate().find(|(_, t)| t.kind() != kind) {
                return Err(PdvError::SchemaMismatch(format!(
                    "metric '{metric}' is {kind} in version '{}' but {} in version '{}'",
                    version_names[0],
                    other.kind(),
                    version_names[idx]
                )));
            }
        }

        Ok(Self {
            versions: version_names,
            metrics,
        })
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Tables of one metric, in version order.
    pub fn tables(&self, metric: &str) -> Option<&[MetricTable]> {
        self.metrics.get(metric).map(|t| t.as_slice())
    }

    pub fn table(&self, metric: &str, version: &str) -> Option<&MetricTable> {
        let idx = self.versions.iter().position(|v| v == version)?;
        self.metrics.get(metric)?.get(idx)
    }

    pub fn kind(&self, metric: &str) -> Option<ValueKind> {
        self.metrics.get(metric).and_then(|t| t.first()).map(|t| t.kind())
    }

    pub fn aggregate(&self, metric: &str, focus: FocusMode) -> PdvResult<AggregatedMetric> {
        let tables = self
            .tables(metric)
            .ok_or_else(|| PdvError::Validation(format!("unknown metric '{metric}'")))?;
        aggregate_versions(metric, &self.versions, tables, focus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Values;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn float_table(value: f64) -> MetricTable {
        MetricTable::from_float_rows(ids(&["s1"]), ids(&["0"]), vec![vec![value]]).unwrap()
    }

    fn bool_table(value: bool) -> MetricTable {
        MetricTable::from_bool_rows(ids(&["s1"]), ids(&["0"]), vec![vec![value]]).unwrap()
    }

    fn version(name: &str, metrics: &[(&str, MetricTable)]) -> (String, BTreeMap<String, MetricTable>) {
        (
            name.to_string(),
            metrics
                .iter()
                .map(|(m, t)| (m.to_string(), t.clone()))
                .collect(),
        )
    }

    #[test]
    fn keeps_version_order_and_metric_lookup() {
        let set = VersionedMetricSet::from_versions(vec![
            version("v2", &[("cost", float_table(2.0))]),
            version("v1", &[("cost", float_table(1.0))]),
        ])
        .unwrap();
        assert_eq!(set.versions(), &ids(&["v2", "v1"])[..]);
        assert_eq!(set.table("cost", "v1").unwrap().get_f64("s1", "0"), Some(1.0));
        assert_eq!(set.kind("cost"), Some(ValueKind::Float));
    }

    #[test]
    fn mismatched_metric_names_are_fatal_and_named() {
        let err = VersionedMetricSet::from_versions(vec![
            version("v1", &[("cost", float_table(1.0)), ("losses", float_table(1.0))]),
            version("v2", &[("cost", float_table(1.0)), ("voltage", float_table(1.0))]),
        ])
        .unwrap_err();
        assert!(matches!(err, PdvError::SchemaMismatch(_)));
        let message = err.to_string();
        assert!(message.contains("'v2'"));
        assert!(message.contains("missing [losses]"));
        assert!(message.contains("extra [voltage]"));
    }

    #[test]
    fn mixed_value_kinds_are_rejected() {
        let err = VersionedMetricSet::from_versions(vec![
            version("v1", &[("n-1", bool_table(true))]),
            version("v2", &[("n-1", float_table(1.0))]),
        ])
        .unwrap_err();
        assert!(matches!(err, PdvError::SchemaMismatch(_)));
        assert!(err.to_string().contains("bool in version 'v1' but float in version 'v2'"));
    }

    #[test]
    fn tables_without_data_take_the_kind_of_the_others() {
        let no_rows = MetricTable::new(Vec::new(), ids(&["0"]), Values::empty(ValueKind::Float)).unwrap();
        let all_missing = MetricTable::new(ids(&["s1"]), ids(&["0"]), Values::missing(ValueKind::Float, 1)).unwrap();
        let set = VersionedMetricSet::from_versions(vec![
            version("v1", &[("n-1", no_rows)]),
            version("v2", &[("n-1", bool_table(true))]),
            version("v3", &[("n-1", all_missing)]),
        ])
        .unwrap();
        assert_eq!(set.kind("n-1"), Some(ValueKind::Bool));
        for table in set.tables("n-1").unwrap() {
            assert_eq!(table.kind(), ValueKind::Bool);
        }
        assert_eq!(set.table("n-1", "v3").unwrap().n_samples(), 1);
        assert_eq!(set.table("n-1", "v3").unwrap().present_cells(), 0);

        let blank = MetricTable::new(ids(&["s1"]), ids(&["0"]), Values::missing(ValueKind::Bool, 1)).unwrap();
        let set = VersionedMetricSet::from_versions(vec![
            version("v1", &[("n-1", blank.clone())]),
            version("v2", &[("n-1", blank)]),
        ])
        .unwrap();
        assert_eq!(set.kind("n-1"), Some(ValueKind::Bool));
    }

    #[test]
    fn empty_version_list_is_rejected() {
        assert!(VersionedMetricSet::from_versions(Vec::new()).is_err());
    }
}
