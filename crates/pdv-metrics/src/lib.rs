//! Metric computation for grid samples.
//!
//! A [`MetricsProcessor`] loads one sample file, brings it to a solved state
//! (checking stored results or running a DC power flow) and evaluates its
//! [`MetricRegistry`]. [`compute_metrics`] sweeps a dataset version directory
//! and assembles one [`pdv_core::MetricTable`] per metric.

pub mod dc_flow;
pub mod formulas;
pub mod linear;
pub mod processor;
pub mod registry;
pub mod sample;
pub mod sweep;

pub use dc_flow::{solve_dc_flow, DcSolution};
pub use formulas::{standard_metrics, standard_registry};
pub use linear::{FaerSolver, GaussSolver, LinearSystemBackend, SolverKind};
pub use processor::{DcFlowProcessor, MetricsProcessor, ProcessorKind, SnapshotProcessor};
pub use registry::{MetricDef, MetricFn, MetricRegistry, MetricValues};
pub use sample::{Branch, Bus, Generator, GridSample, Load, Shunt};
pub use sweep::{compute_metrics, sample_files, MetricsSweep, SkippedSample};
