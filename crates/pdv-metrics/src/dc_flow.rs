//! DC power flow: small angles, flat voltages, lossless branches.
//!
//! Solves `B' θ = P` on the in-service buses with the slack angle fixed at 0,
//! then derives branch flows `(θ_from - θ_to) / x` and the slack dispatch.

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::linear::LinearSystemBackend;
use crate::sample::GridSample;

/// Bus angles in radians, ordered like the in-service buses of the sample.
#[derive(Debug, Clone, PartialEq)]
pub struct DcSolution {
    pub buses: Vec<String>,
    pub angles: Vec<f64>,
}

fn branch_reactance(x_pu: f64, tap: f64) -> f64 {
    (x_pu * tap).abs().max(1e-6)
}

/// Solves the DC flow of `sample` and writes the results back into it.
pub fn solve_dc_flow(sample: &mut GridSample, solver: &dyn LinearSystemBackend) -> Result<DcSolution> {
    let buses: Vec<String> = sample
        .buses
        .iter()
        .filter(|b| b.in_service)
        .map(|b| b.name.clone())
        .collect();
    let index: HashMap<&str, usize> = buses.iter().enumerate().map(|(i, b)| (b.as_str(), i)).collect();
    let n = buses.len();
    let base = sample.base_mva;

    let slack = sample
        .generators
        .iter()
        .filter(|g| g.in_service && g.slack)
        .find_map(|g| index.get(g.bus.as_str()).copied())
        .unwrap_or(0);

    let mut susceptance = vec![vec![0.0; n]; n];
    for branch in sample.branches().filter(|b| b.in_service) {
        let (Some(&i), Some(&j)) = (index.get(branch.from_bus.as_str()), index.get(branch.to_bus.as_str()))
        else {
            continue;
        };
        let b = 1.0 / branch_reactance(branch.x_pu, branch.tap);
        susceptance[i][j] -= b;
        susceptance[j][i] -= b;
        susceptance[i][i] += b;
        susceptance[j][j] += b;
    }

    let mut injection = vec![0.0; n];
    for gen in sample.generators.iter().filter(|g| g.in_service && !g.slack) {
        if let Some(&i) = index.get(gen.bus.as_str()) {
            injection[i] += gen.p_mw / base;
        }
    }
    for load in sample.loads.iter().filter(|l| l.in_service) {
        if let Some(&i) = index.get(load.bus.as_str()) {
            injection[i] -= load.p_mw / base;
        }
    }

    let mut angles = vec![0.0; n];
    if n > 1 {
        let keep: Vec<usize> = (0..n).filter(|&i| i != slack).collect();
        let reduced: Vec<Vec<f64>> = keep
            .iter()
            .map(|&i| keep.iter().map(|&j| susceptance[i][j]).collect())
            .collect();
        let rhs: Vec<f64> = keep.iter().map(|&i| injection[i]).collect();
        let theta = solver
            .solve(&reduced, &rhs)
            .context("solving the reduced susceptance system")?;
        for (&i, value) in keep.iter().zip(theta) {
            angles[i] = value;
        }
    }

    let mut setpoints: HashMap<&str, f64> = HashMap::new();
    for gen in sample.generators.iter().filter(|g| g.in_service) {
        setpoints.entry(gen.bus.as_str()).or_insert(gen.vm_pu);
    }
    let setpoints: HashMap<String, f64> = setpoints.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    let index: HashMap<String, usize> = index.into_iter().map(|(k, v)| (k.to_string(), v)).collect();

    for bus in &mut sample.buses {
        match index.get(&bus.name) {
            Some(&i) => {
                bus.res_va_degree = Some(angles[i].to_degrees());
                bus.res_vm_pu = Some(setpoints.get(&bus.name).copied().unwrap_or(1.0));
            }
            None => {
                bus.res_va_degree = None;
                bus.res_vm_pu = None;
            }
        }
    }

    for branch in sample.lines.iter_mut().chain(sample.transformers.iter_mut()) {
        let ends = (index.get(&branch.from_bus), index.get(&branch.to_bus));
        let flow = match ends {
            (Some(&i), Some(&j)) if branch.in_service => {
                (angles[i] - angles[j]) / branch_reactance(branch.x_pu, branch.tap) * base
            }
            _ => 0.0,
        };
        branch.res_p_from_mw = Some(flow);
        branch.res_loading_percent = Some(if branch.rate_mva > 0.0 {
            flow.abs() / branch.rate_mva * 100.0
        } else {
            f64::NAN
        });
        branch.res_pl_mw = Some(0.0);
    }

    let total_load: f64 = sample.loads.iter().filter(|l| l.in_service).map(|l| l.p_mw).sum();
    let scheduled: f64 = sample
        .generators
        .iter()
        .filter(|g| g.in_service && !g.slack)
        .map(|g| g.p_mw)
        .sum();
    let mut balance = Some(total_load - scheduled);
    for gen in &mut sample.generators {
        gen.res_q_mvar = Some(0.0);
        gen.res_p_mw = Some(match (gen.in_service, gen.slack) {
            (false, _) => 0.0,
            (true, false) => gen.p_mw,
            (true, true) => balance.take().unwrap_or(0.0),
        });
    }

    Ok(DcSolution { buses, angles })
}
