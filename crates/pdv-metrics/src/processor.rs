//! Metrics processors: load a sample, bring it to a solved state, expose the
//! metric registry evaluated on it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};

use pdv_core::{PdvError, PdvResult};

use crate::dc_flow::solve_dc_flow;
use crate::formulas::standard_registry;
use crate::linear::{LinearSystemBackend, SolverKind};
use crate::registry::MetricRegistry;
use crate::sample::GridSample;

pub trait MetricsProcessor: Send + Sync {
    /// Identifier used for the metrics cache directory.
    fn name(&self) -> &str;

    fn load_sample(&self, path: &Path) -> Result<GridSample> {
        GridSample::from_path(path)
    }

    fn run_simulation(&self, sample: &mut GridSample) -> Result<()>;

    fn registry(&self) -> &MetricRegistry;
}

/// Samples that already carry solved power-flow results.
#[derive(Debug, Clone)]
pub struct SnapshotProcessor {
    registry: MetricRegistry,
}

impl SnapshotProcessor {
    pub fn new() -> PdvResult<Self> {
        Ok(Self {
            registry: standard_registry()?,
        })
    }
}

impl MetricsProcessor for SnapshotProcessor {
    fn name(&self) -> &str {
        "snapshot"
    }

    /// Checks that every in-service element has results; nothing is recomputed.
    fn run_simulation(&self, sample: &mut GridSample) -> Result<()> {
        for bus in sample.buses.iter().filter(|b| b.in_service) {
            if bus.res_vm_pu.is_none() {
                bail!("bus '{}' has no solved voltage", bus.name);
            }
        }
        for branch in sample.branches().filter(|b| b.in_service) {
            if branch.res_loading_percent.is_none() || branch.res_pl_mw.is_none() {
                bail!("branch '{}' has no solved loading or losses", branch.name);
            }
        }
        for gen in sample.generators.iter().filter(|g| g.in_service) {
            if gen.res_p_mw.is_none() || gen.res_q_mvar.is_none() {
                bail!("generator '{}' has no solved dispatch", gen.name);
            }
        }
        Ok(())
    }

    fn registry(&self) -> &MetricRegistry {
        &self.registry
    }
}

/// Runs a DC power flow on every sample before evaluating metrics.
pub struct DcFlowProcessor {
    name: String,
    solver: Arc<dyn LinearSystemBackend>,
    registry: MetricRegistry,
}

impl DcFlowProcessor {
    pub fn new(solver: SolverKind) -> PdvResult<Self> {
        let name = match solver {
            SolverKind::Gauss => "dc".to_string(),
            other => format!("dc-{}", other.as_str()),
        };
        Ok(Self {
            name,
            solver: solver.build_solver(),
            registry: standard_registry()?,
        })
    }
}

impl fmt::Debug for DcFlowProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DcFlowProcessor").field("name", &self.name).finish_non_exhaustive()
    }
}

impl MetricsProcessor for DcFlowProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_simulation(&self, sample: &mut GridSample) -> Result<()> {
        solve_dc_flow(sample, self.solver.as_ref())?;
        Ok(())
    }

    fn registry(&self) -> &MetricRegistry {
        &self.registry
    }
}

/// Processor factory keyed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    Snapshot,
    Dc(SolverKind),
}

impl ProcessorKind {
    pub fn available() -> &'static [&'static str] {
        &["snapshot", "dc", "dc-faer"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorKind::Snapshot => "snapshot",
            ProcessorKind::Dc(SolverKind::Gauss) => "dc",
            ProcessorKind::Dc(SolverKind::Faer) => "dc-faer",
        }
    }

    pub fn build(self) -> PdvResult<Arc<dyn MetricsProcessor>> {
        Ok(match self {
            ProcessorKind::Snapshot => Arc::new(SnapshotProcessor::new()?),
            ProcessorKind::Dc(solver) => Arc::new(DcFlowProcessor::new(solver)?),
        })
    }
}

impl FromStr for ProcessorKind {
    type Err = PdvError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim().to_ascii_lowercase();
        match wanted.as_str() {
            "snapshot" => Ok(ProcessorKind::Snapshot),
            "dc" => Ok(ProcessorKind::Dc(SolverKind::Gauss)),
            other => match other.strip_prefix("dc-") {
                Some(solver) => Ok(ProcessorKind::Dc(solver.parse()?)),
                None => Err(PdvError::Config(format!(
                    "unknown processor '{input}'; supported values: {}",
                    Self::available().join(", ")
                ))),
            },
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
