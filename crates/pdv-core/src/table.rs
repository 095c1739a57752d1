//! Metric tables: one (dataset version, metric) result grid.
//!
//! Rows are sample identifiers, columns are entity identifiers and every cell
//! shares a single [`ValueKind`]. Missing cells (an entity absent from one
//! sample, a NaN written by the metric stage) are stored as `None`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PdvError, PdvResult};

/// Entity identifier used by grid-wide metrics that have no per-entity breakdown.
pub const SCALAR_ENTITY: &str = "0";

/// Cell kind shared by every cell of a table or comparison frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Float,
    Bool,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Homogeneous vector of cells. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
}

impl Values {
    pub fn empty(kind: ValueKind) -> Self {
        Self::missing(kind, 0)
    }

    /// `len` missing cells of the given kind.
    pub fn missing(kind: ValueKind, len: usize) -> Self {
        match kind {
            ValueKind::Float => Values::Float(vec![None; len]),
            ValueKind::Bool => Values::Bool(vec![None; len]),
        }
    }

    pub fn from_floats<I: IntoIterator<Item = f64>>(values: I) -> Self {
        Values::Float(values.into_iter().map(Some).collect())
    }

    pub fn from_bools<I: IntoIterator<Item = bool>>(values: I) -> Self {
        Values::Bool(values.into_iter().map(Some).collect())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Values::Float(_) => ValueKind::Float,
            Values::Bool(_) => ValueKind::Bool,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Float(v) => v.len(),
            Values::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell `index` as a float; booleans read as 0.0 / 1.0 and NaN reads as missing.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            Values::Float(v) => v.get(index).copied().flatten().filter(|x| !x.is_nan()),
            Values::Bool(v) => v
                .get(index)
                .copied()
                .flatten()
                .map(|b| if b { 1.0 } else { 0.0 }),
        }
    }

    pub fn is_present(&self, index: usize) -> bool {
        self.get_f64(index).is_some()
    }

    /// Number of non-missing cells.
    pub fn present_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_present(i)).count()
    }

    /// Non-missing cells as floats, in order.
    pub fn present_f64(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.get_f64(i)).collect()
    }

    /// Share of `true` among present cells; `None` for float vectors or when nothing is present.
    pub fn true_fraction(&self) -> Option<f64> {
        match self {
            Values::Float(_) => None,
            Values::Bool(v) => {
                let present: Vec<bool> = v.iter().flatten().copied().collect();
                if present.is_empty() {
                    None
                } else {
                    let trues = present.iter().filter(|b| **b).count();
                    Some(trues as f64 / present.len() as f64)
                }
            }
        }
    }

    /// Picks cells by position; `None` positions become missing cells.
    pub fn gather<I>(&self, positions: I) -> Values
    where
        I: IntoIterator<Item = Option<usize>>,
    {
        match self {
            Values::Float(v) => Values::Float(
                positions
                    .into_iter()
                    .map(|p| p.and_then(|i| v.get(i).copied().flatten()))
                    .collect(),
            ),
            Values::Bool(v) => Values::Bool(
                positions
                    .into_iter()
                    .map(|p| p.and_then(|i| v.get(i).copied().flatten()))
                    .collect(),
            ),
        }
    }

    /// Copies cell `from` of `source` into cell `at` of `self`.
    pub fn set_from(&mut self, at: usize, source: &Values, from: usize) -> PdvResult<()> {
        match (self, source) {
            (Values::Float(dst), Values::Float(src)) => {
                let cell = src.get(from).copied().flatten();
                let slot = dst.get_mut(at).ok_or_else(|| out_of_bounds(at))?;
                *slot = cell;
                Ok(())
            }
            (Values::Bool(dst), Values::Bool(src)) => {
                let cell = src.get(from).copied().flatten();
                let slot = dst.get_mut(at).ok_or_else(|| out_of_bounds(at))?;
                *slot = cell;
                Ok(())
            }
            (dst, src) => Err(PdvError::SchemaMismatch(format!(
                "cannot store a {} cell in a {} vector",
                src.kind(),
                dst.kind()
            ))),
        }
    }

    /// Appends `other`, then pads with missing cells until `other` occupied `width` cells.
    pub fn extend_padded(&mut self, other: &Values, width: usize) -> PdvResult<()> {
        let padding = width.saturating_sub(other.len());
        match (self, other) {
            (Values::Float(dst), Values::Float(src)) => {
                dst.extend_from_slice(src);
                dst.extend(std::iter::repeat(None).take(padding));
                Ok(())
            }
            (Values::Bool(dst), Values::Bool(src)) => {
                dst.extend_from_slice(src);
                dst.extend(std::iter::repeat(None).take(padding));
                Ok(())
            }
            (dst, src) => Err(PdvError::SchemaMismatch(format!(
                "cannot append {} cells to a {} vector",
                src.kind(),
                dst.kind()
            ))),
        }
    }
}

fn out_of_bounds(index: usize) -> PdvError {
    PdvError::Validation(format!("cell index {index} is out of bounds"))
}

/// Result grid for one (dataset version, metric) pair.
///
/// Immutable once built. Cells are stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    samples: Vec<String>,
    entities: Vec<String>,
    cells: Values,
    sample_lookup: HashMap<String, usize>,
    entity_lookup: HashMap<String, usize>,
}

impl MetricTable {
    pub fn new(samples: Vec<String>, entities: Vec<String>, cells: Values) -> PdvResult<Self> {
        let expected = samples.len() * entities.len();
        if cells.len() != expected {
            return Err(PdvError::Validation(format!(
                "table with {} samples and {} entities needs {} cells, got {}",
                samples.len(),
                entities.len(),
                expected,
                cells.len()
            )));
        }
        let sample_lookup = index_lookup(&samples, "sample")?;
        let entity_lookup = index_lookup(&entities, "entity")?;
        Ok(Self {
            samples,
            entities,
            cells,
            sample_lookup,
            entity_lookup,
        })
    }

    /// Dense float table from row vectors.
    pub fn from_float_rows(
        samples: Vec<String>,
        entities: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> PdvResult<Self> {
        check_row_widths(&rows, entities.len())?;
        let cells = Values::from_floats(rows.into_iter().flatten());
        Self::new(samples, entities, cells)
    }

    /// Dense boolean table from row vectors.
    pub fn from_bool_rows(
        samples: Vec<String>,
        entities: Vec<String>,
        rows: Vec<Vec<bool>>,
    ) -> PdvResult<Self> {
        check_row_widths(&rows, entities.len())?;
        let cells = Values::from_bools(rows.into_iter().flatten());
        Self::new(samples, entities, cells)
    }

    pub fn kind(&self) -> ValueKind {
        self.cells.kind()
    }

    /// Same samples and entities with every cell missing, stored as `kind`.
    pub fn blank_of(&self, kind: ValueKind) -> MetricTable {
        MetricTable {
            samples: self.samples.clone(),
            entities: self.entities.clone(),
            cells: Values::missing(kind, self.cells.len()),
            sample_lookup: self.sample_lookup.clone(),
            entity_lookup: self.entity_lookup.clone(),
        }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn cells(&self) -> &Values {
        &self.cells
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn present_cells(&self) -> usize {
        self.cells.present_count()
    }

    /// Row-major position of the (sample, entity) cell, if both exist.
    pub fn position(&self, sample: &str, entity: &str) -> Option<usize> {
        let row = *self.sample_lookup.get(sample)?;
        let col = *self.entity_lookup.get(entity)?;
        Some(row * self.entities.len() + col)
    }

    pub fn get_f64(&self, sample: &str, entity: &str) -> Option<f64> {
        self.position(sample, entity)
            .and_then(|p| self.cells.get_f64(p))
    }

    /// Cells of one sample, ordered like `entities()`.
    pub fn row(&self, sample: &str) -> Option<Values> {
        self.sample_lookup.get(sample)?;
        Some(
            self.cells
                .gather(self.entities.iter().map(|e| self.position(sample, e))),
        )
    }

    /// Cells of one entity, ordered like `samples()`.
    pub fn column(&self, entity: &str) -> Option<Values> {
        self.entity_lookup.get(entity)?;
        Some(
            self.cells
                .gather(self.samples.iter().map(|s| self.position(s, entity))),
        )
    }
}

fn index_lookup(ids: &[String], what: &str) -> PdvResult<HashMap<String, usize>> {
    let mut lookup = HashMap::with_capacity(ids.len());
    for (idx, id) in ids.iter().enumerate() {
        if lookup.insert(id.clone(), idx).is_some() {
            return Err(PdvError::Validation(format!("duplicate {what} identifier '{id}'")));
        }
    }
    Ok(lookup)
}

fn check_row_widths<T>(rows: &[Vec<T>], width: usize) -> PdvResult<()> {
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(PdvError::Validation(format!(
                "row {idx} has {} cells but the table has {width} entities",
                row.len()
            )));
        }
    }
    Ok(())
}

/// Accumulates one row per sample, outer-joining entity columns as they appear.
#[derive(Debug, Default)]
pub struct MetricTableBuilder {
    kind: Option<ValueKind>,
    samples: Vec<String>,
    sample_lookup: HashSet<String>,
    entities: Vec<String>,
    entity_lookup: HashMap<String, usize>,
    rows: Vec<Values>,
}

impl MetricTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose kind is fixed up front, so an empty table keeps it.
    pub fn with_kind(kind: ValueKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn contains_sample(&self, sample: &str) -> bool {
        self.sample_lookup.contains(sample)
    }

    /// Checks that a row could be pushed without mutating the builder.
    pub fn check_row(&self, sample: &str, entities: &[String], values: &Values) -> PdvResult<()> {
        if entities.len() != values.len() {
            return Err(PdvError::Validation(format!(
                "sample '{sample}' has {} entity names for {} values",
                entities.len(),
                values.len()
            )));
        }
        if let Some(kind) = self.kind {
            if kind != values.kind() {
                return Err(PdvError::SchemaMismatch(format!(
                    "sample '{sample}' produced {} values for a {} metric",
                    values.kind(),
                    kind
                )));
            }
        }
        if self.contains_sample(sample) {
            return Err(PdvError::Validation(format!("duplicate sample identifier '{sample}'")));
        }
        let mut seen = HashSet::new();
        for entity in entities {
            if !seen.insert(entity.as_str()) {
                return Err(PdvError::Validation(format!(
                    "sample '{sample}' repeats entity '{entity}'"
                )));
            }
        }
        Ok(())
    }

    pub fn push_row(&mut self, sample: &str, entities: &[String], values: &Values) -> PdvResult<()> {
        self.check_row(sample, entities, values)?;
        let kind = values.kind();
        self.kind = Some(kind);

        let mut positions = Vec::with_capacity(entities.len());
        for entity in entities {
            let idx = if let Some(&idx) = self.entity_lookup.get(entity) {
                idx
            } else {
                let idx = self.entities.len();
                self.entities.push(entity.clone());
                self.entity_lookup.insert(entity.clone(), idx);
                idx
            };
            positions.push(idx);
        }

        let mut row = Values::missing(kind, self.entities.len());
        for (from, &at) in positions.iter().enumerate() {
            row.set_from(at, values, from)?;
        }
        self.samples.push(sample.to_string());
        self.sample_lookup.insert(sample.to_string());
        self.rows.push(row);
        Ok(())
    }

    pub fn build(self) -> PdvResult<MetricTable> {
        let kind = self.kind.unwrap_or(ValueKind::Float);
        let width = self.entities.len();
        let mut cells = Values::empty(kind);
        for row in &self.rows {
            cells.extend_padded(row, width)?;
        }
        MetricTable::new(self.samples, self.entities, cells)
    }
}
