//! Aggregation of one metric's per-version tables into comparison frames.
//!
//! A comparison frame has one column per dataset version. Which rows it holds
//! depends on the [`FocusMode`]:
//!
//! - `all`: every (sample, entity) cell, one frame per metric
//! - `snapshot`: one frame per sample, rows are entities
//! - `object`: one frame per entity, rows are samples
//!
//! Versions do not always expose identical sample or entity sets (samples that
//! failed upstream are skipped per version). Rows are therefore outer-joined on
//! identifiers: the row key list is the union of every version's keys, in the
//! first version's order followed by keys first seen in later versions, and a
//! version without a key gets a missing cell. No row is ever dropped, so every
//! present cell of every input table lands in exactly one frame.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{PdvError, PdvResult};
use crate::modes::FocusMode;
use crate::table::{MetricTable, ValueKind, Values};

/// Shared (low, high) bounds for every plot of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    /// `[min - 10% span, max + 10% span]`; a zero span leaves the bounds at `min`/`max`.
    pub fn padded(min: f64, max: f64) -> Self {
        let span = max - min;
        Self {
            low: min - 0.1 * span,
            high: max + 0.1 * span,
        }
    }

    /// Padded range over the finite values, `None` when there are none.
    /// NaN and ±inf never reach an axis.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut bounds: Option<(f64, f64)> = None;
        for value in values.into_iter().filter(|v| v.is_finite()) {
            bounds = Some(match bounds {
                None => (value, value),
                Some((lo, hi)) => (lo.min(value), hi.max(value)),
            });
        }
        bounds.map(|(lo, hi)| Self::padded(lo, hi))
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_finite(&self) -> bool {
        self.low.is_finite() && self.high.is_finite()
    }

    pub fn is_degenerate(&self) -> bool {
        self.span() <= 0.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Bounds usable as a drawing axis: a degenerate range is widened by 0.5 on both sides.
    pub fn drawing_bounds(&self) -> (f64, f64) {
        if self.is_degenerate() {
            (self.low - 0.5, self.high + 0.5)
        } else {
            (self.low, self.high)
        }
    }
}

/// One version's column in a comparison frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameColumn {
    pub version: String,
    pub values: Values,
}

/// Table with one column per dataset version.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonFrame {
    /// Human readable name, `metric` or `metric - key`.
    pub name: String,
    pub index: Vec<String>,
    pub columns: Vec<FrameColumn>,
    /// Range of the whole metric, shared by every frame of that metric.
    pub range: Option<ValueRange>,
}

impl ComparisonFrame {
    pub fn kind(&self) -> ValueKind {
        self.columns
            .first()
            .map(|c| c.values.kind())
            .unwrap_or(ValueKind::Float)
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.version.as_str())
    }

    pub fn column(&self, version: &str) -> Option<&Values> {
        self.columns
            .iter()
            .find(|c| c.version == version)
            .map(|c| &c.values)
    }

    pub fn present_cells(&self) -> usize {
        self.columns.iter().map(|c| c.values.present_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.present_cells() == 0
    }

    /// Padded range over this frame's own cells.
    pub fn data_range(&self) -> Option<ValueRange> {
        ValueRange::from_values(self.columns.iter().flat_map(|c| c.values.present_f64()))
    }
}

/// Every comparison frame of one (metric, focus) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMetric {
    pub metric: String,
    pub focus: FocusMode,
    pub kind: ValueKind,
    pub range: Option<ValueRange>,
    pub frames: Vec<ComparisonFrame>,
}

/// Aggregates one metric's tables (one per version, same order as `versions`).
///
/// Pure: the same inputs always give identical frames.
pub fn aggregate_versions(
    metric: &str,
    versions: &[String],
    tables: &[MetricTable],
    focus: FocusMode,
) -> PdvResult<AggregatedMetric> {
    if versions.is_empty() {
        return Err(PdvError::Validation(format!("metric '{metric}' has no versions")));
    }
    if versions.len() != tables.len() {
        return Err(PdvError::Validation(format!(
            "metric '{metric}' has {} version names for {} tables",
            versions.len(),
            tables.len()
        )));
    }
    let kind = tables[0].kind();
    if let Some((idx, table)) = tables.iter().enumerate().find(|(_, t)| t.kind() != kind) {
        return Err(PdvError::SchemaMismatch(format!(
            "metric '{metric}' is {kind} in version '{}' but {} in version '{}'",
            versions[0],
            table.kind(),
            versions[idx]
        )));
    }

    let range = ValueRange::from_values(tables.iter().flat_map(|t| t.cells().present_f64()));

    let frames = match focus {
        FocusMode::All => vec![all_frame(metric, versions, tables, range)],
        FocusMode::Snapshot => {
            let samples = ordered_union(tables.iter().map(|t| t.samples()));
            let entities = ordered_union(tables.iter().map(|t| t.entities()));
            samples
                .iter()
                .map(|sample| ComparisonFrame {
                    name: format!("{metric} - {sample}"),
                    index: entities.clone(),
                    columns: columns(versions, tables, |t| {
                        entities.iter().map(|e| t.position(sample, e)).collect()
                    }),
                    range,
                })
                .collect()
        }
        FocusMode::Object => {
            let samples = ordered_union(tables.iter().map(|t| t.samples()));
            let entities = ordered_union(tables.iter().map(|t| t.entities()));
            entities
                .iter()
                .map(|entity| ComparisonFrame {
                    name: format!("{metric} - {entity}"),
                    index: samples.clone(),
                    columns: columns(versions, tables, |t| {
                        samples.iter().map(|s| t.position(s, entity)).collect()
                    }),
                    range,
                })
                .collect()
        }
    };

    Ok(AggregatedMetric {
        metric: metric.to_string(),
        focus,
        kind,
        range,
        frames,
    })
}

fn all_frame(
    metric: &str,
    versions: &[String],
    tables: &[MetricTable],
    range: Option<ValueRange>,
) -> ComparisonFrame {
    let mut seen = HashSet::new();
    let mut keys: Vec<(&str, &str)> = Vec::new();
    for table in tables {
        for sample in table.samples() {
            for entity in table.entities() {
                let present = table
                    .position(sample, entity)
                    .map(|p| table.cells().is_present(p))
                    .unwrap_or(false);
                if present && seen.insert((sample.as_str(), entity.as_str())) {
                    keys.push((sample.as_str(), entity.as_str()));
                }
            }
        }
    }

    ComparisonFrame {
        name: metric.to_string(),
        index: keys.iter().map(|(s, e)| format!("{s} / {e}")).collect(),
        columns: columns(versions, tables, |t| {
            keys.iter().map(|(s, e)| t.position(s, e)).collect()
        }),
        range,
    }
}

fn columns<F>(versions: &[String], tables: &[MetricTable], positions: F) -> Vec<FrameColumn>
where
    F: Fn(&MetricTable) -> Vec<Option<usize>>,
{
    versions
        .iter()
        .zip(tables)
        .map(|(version, table)| FrameColumn {
            version: version.clone(),
            values: table.cells().gather(positions(table)),
        })
        .collect()
}

fn ordered_union<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for id in list {
            if seen.insert(id.as_str()) {
                out.push(id.clone());
            }
        }
    }
    out
}
