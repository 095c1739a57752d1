use std::collections::HashSet;
use std::fmt;

use pdv_core::{PdvError, PdvResult, Values, SCALAR_ENTITY};

use crate::sample::GridSample;

/// One row of a metric table: cell values and the entity each belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValues {
    pub values: Values,
    pub entities: Vec<String>,
}

impl MetricValues {
    /// Per-entity floats; NaN becomes a missing cell.
    pub fn floats<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (entities, cells): (Vec<String>, Vec<Option<f64>>) = values
            .into_iter()
            .map(|(name, v)| (name.into(), (!v.is_nan()).then_some(v)))
            .unzip();
        Self {
            values: Values::Float(cells),
            entities,
        }
    }

    pub fn flags<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let (entities, cells): (Vec<String>, Vec<Option<bool>>) = values
            .into_iter()
            .map(|(name, v)| (name.into(), Some(v)))
            .unzip();
        Self {
            values: Values::Bool(cells),
            entities,
        }
    }

    /// Grid-wide value stored under the scalar entity.
    pub fn scalar(value: f64) -> Self {
        Self::floats([(SCALAR_ENTITY, value)])
    }

    pub fn scalar_flag(value: bool) -> Self {
        Self::flags([(SCALAR_ENTITY, value)])
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

pub type MetricFn = fn(&GridSample) -> MetricValues;

#[derive(Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub formula: MetricFn,
}

impl fmt::Debug for MetricDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDef").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Ordered metric name → formula list, fixed when the processor is built.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    metrics: Vec<MetricDef>,
}

impl MetricRegistry {
    pub fn new(metrics: Vec<MetricDef>) -> PdvResult<Self> {
        let mut seen = HashSet::new();
        for def in &metrics {
            if !seen.insert(def.name) {
                return Err(PdvError::Validation(format!(
                    "metric '{}' is registered twice",
                    def.name
                )));
            }
            if def.name.contains(['/', '\\']) {
                return Err(PdvError::Validation(format!(
                    "metric name '{}' cannot be used as a file name",
                    def.name
                )));
            }
        }
        Ok(Self { metrics })
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDef> {
        self.metrics.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.metrics.iter().map(|m| m.name)
    }

    pub fn get(&self, name: &str) -> Option<&MetricDef> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Applies every formula to a solved sample, in registration order.
    pub fn evaluate(&self, sample: &GridSample) -> Vec<(&'static str, MetricValues)> {
        self.metrics
            .iter()
            .map(|m| (m.name, (m.formula)(sample)))
            .collect()
    }
}
