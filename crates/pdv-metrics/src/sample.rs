//! Grid sample files.
//!
//! One JSON document per sample. Element tables mirror the usual power-flow
//! case layout; the `res_*` fields hold solved results and are optional so
//! that unsolved cases can be fed to a backend that runs its own flow.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_base_mva() -> f64 {
    100.0
}

fn default_tap() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    pub min_vm_pu: f64,
    pub max_vm_pu: f64,
    #[serde(default = "default_true")]
    pub in_service: bool,
    #[serde(default)]
    pub res_vm_pu: Option<f64>,
    #[serde(default)]
    pub res_va_degree: Option<f64>,
}

/// Line or transformer. Transformers carry an off-nominal `tap` ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub from_bus: String,
    pub to_bus: String,
    /// Series reactance in per unit on the system base.
    pub x_pu: f64,
    #[serde(default = "default_tap")]
    pub tap: f64,
    /// Thermal rating in MVA.
    pub rate_mva: f64,
    #[serde(default = "default_true")]
    pub in_service: bool,
    #[serde(default)]
    pub res_p_from_mw: Option<f64>,
    #[serde(default)]
    pub res_loading_percent: Option<f64>,
    #[serde(default)]
    pub res_pl_mw: Option<f64>,
}

impl Branch {
    pub fn loading_percent(&self) -> f64 {
        self.res_loading_percent.unwrap_or(if self.in_service { f64::NAN } else { 0.0 })
    }

    pub fn losses_mw(&self) -> f64 {
        self.res_pl_mw.unwrap_or(if self.in_service { f64::NAN } else { 0.0 })
    }
}

/// Generator; `slack` marks the external grid / reference machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub bus: String,
    pub vm_pu: f64,
    #[serde(default)]
    pub p_mw: f64,
    pub min_q_mvar: f64,
    pub max_q_mvar: f64,
    #[serde(default)]
    pub slack: bool,
    #[serde(default = "default_true")]
    pub in_service: bool,
    #[serde(default)]
    pub res_p_mw: Option<f64>,
    #[serde(default)]
    pub res_q_mvar: Option<f64>,
}

impl Generator {
    pub fn active_power(&self) -> f64 {
        self.res_p_mw.unwrap_or(if self.in_service { f64::NAN } else { 0.0 })
    }

    pub fn reactive_power(&self) -> f64 {
        self.res_q_mvar.unwrap_or(if self.in_service { f64::NAN } else { 0.0 })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub name: String,
    pub bus: String,
    pub p_mw: f64,
    #[serde(default)]
    pub q_mvar: f64,
    #[serde(default = "default_true")]
    pub in_service: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shunt {
    pub name: String,
    pub bus: String,
    pub step: f64,
    pub max_step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSample {
    #[serde(default = "default_base_mva")]
    pub base_mva: f64,
    pub buses: Vec<Bus>,
    #[serde(default)]
    pub lines: Vec<Branch>,
    #[serde(default)]
    pub transformers: Vec<Branch>,
    #[serde(default)]
    pub generators: Vec<Generator>,
    #[serde(default)]
    pub loads: Vec<Load>,
    #[serde(default)]
    pub shunts: Vec<Shunt>,
}

impl GridSample {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let sample: GridSample = serde_json::from_str(text).context("parsing grid sample JSON")?;
        sample.validate()?;
        Ok(sample)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading grid sample {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("loading {}", path.display()))
    }

    /// Element names are unique per table (lines and transformers share one
    /// namespace) and every element refers to an existing bus.
    pub fn validate(&self) -> Result<()> {
        if self.base_mva <= 0.0 {
            bail!("base_mva must be positive, got {}", self.base_mva);
        }
        unique("bus", self.buses.iter().map(|b| b.name.as_str()))?;
        unique(
            "branch",
            self.lines.iter().chain(&self.transformers).map(|b| b.name.as_str()),
        )?;
        unique("generator", self.generators.iter().map(|g| g.name.as_str()))?;
        unique("load", self.loads.iter().map(|l| l.name.as_str()))?;
        unique("shunt", self.shunts.iter().map(|s| s.name.as_str()))?;

        let buses: HashSet<&str> = self.buses.iter().map(|b| b.name.as_str()).collect();
        let known = |what: &str, name: &str, bus: &str| -> Result<()> {
            if buses.contains(bus) {
                Ok(())
            } else {
                bail!("{what} '{name}' refers to unknown bus '{bus}'")
            }
        };
        for branch in self.lines.iter().chain(&self.transformers) {
            known("branch", &branch.name, &branch.from_bus)?;
            known("branch", &branch.name, &branch.to_bus)?;
        }
        for gen in &self.generators {
            known("generator", &gen.name, &gen.bus)?;
        }
        for load in &self.loads {
            known("load", &load.name, &load.bus)?;
        }
        for shunt in &self.shunts {
            known("shunt", &shunt.name, &shunt.bus)?;
        }
        Ok(())
    }

    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.lines.iter().chain(&self.transformers)
    }
}

fn unique<'a>(what: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            bail!("duplicate {what} name '{name}'");
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Three buses in a triangle, one slack and one PV generator, two loads.
    /// Results are filled in as a solved AC case would report them.
    pub fn triangle() -> GridSample {
        GridSample::from_json_str(
            r#"{
            "base_mva": 100.0,
            "buses": [
                {"name": "b1", "min_vm_pu": 0.9, "max_vm_pu": 1.1, "res_vm_pu": 1.02, "res_va_degree": 0.0},
                {"name": "b2", "min_vm_pu": 0.9, "max_vm_pu": 1.1, "res_vm_pu": 0.98, "res_va_degree": -1.5},
                {"name": "b3", "min_vm_pu": 0.9, "max_vm_pu": 1.1, "res_vm_pu": 1.12, "res_va_degree": -0.8}
            ],
            "lines": [
                {"name": "l12", "from_bus": "b1", "to_bus": "b2", "x_pu": 0.1, "rate_mva": 100.0,
                 "res_loading_percent": 50.0, "res_pl_mw": 0.5},
                {"name": "l23", "from_bus": "b2", "to_bus": "b3", "x_pu": 0.1, "rate_mva": 100.0,
                 "in_service": false}
            ],
            "transformers": [
                {"name": "t13", "from_bus": "b1", "to_bus": "b3", "x_pu": 0.2, "tap": 1.0, "rate_mva": 50.0,
                 "res_loading_percent": 120.0, "res_pl_mw": 0.3}
            ],
            "generators": [
                {"name": "grid", "bus": "b1", "vm_pu": 1.02, "min_q_mvar": -50.0, "max_q_mvar": 50.0,
                 "slack": true, "res_p_mw": 80.8, "res_q_mvar": 10.0},
                {"name": "g3", "bus": "b3", "vm_pu": 1.01, "p_mw": 20.0, "min_q_mvar": 0.0, "max_q_mvar": 10.0,
                 "res_p_mw": 20.0, "res_q_mvar": 12.0}
            ],
            "loads": [
                {"name": "d2", "bus": "b2", "p_mw": 60.0, "q_mvar": 20.0},
                {"name": "d3", "bus": "b3", "p_mw": 40.0, "q_mvar": 0.0}
            ],
            "shunts": [
                {"name": "sh2", "bus": "b2", "step": 1.0, "max_step": 4.0}
            ]
        }"#,
        )
        .expect("fixture parses")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::triangle;
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let sample = triangle();
        assert_eq!(sample.lines[0].tap, 1.0);
        assert!(sample.lines[0].in_service);
        assert!(!sample.lines[1].in_service);
        assert_eq!(sample.lines[1].loading_percent(), 0.0);
        assert_eq!(sample.generators[0].p_mw, 0.0);
        assert_eq!(sample.branches().count(), 3);
    }

    #[test]
    fn unknown_bus_reference_is_rejected() {
        let err = GridSample::from_json_str(
            r#"{"buses": [{"name": "b1", "min_vm_pu": 0.9, "max_vm_pu": 1.1}],
                "loads": [{"name": "d", "bus": "b9", "p_mw": 1.0}]}"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("unknown bus 'b9'"));
    }

    #[test]
    fn duplicate_branch_names_across_tables_are_rejected() {
        let mut sample = triangle();
        sample.transformers[0].name = "l12".into();
        let err = sample.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate branch name 'l12'"));
    }
}
