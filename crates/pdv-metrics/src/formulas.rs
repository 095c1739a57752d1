//! Standard metric battery evaluated on solved grid samples.
//!
//! Banded flags take a margin `eps`: a positive margin tightens the admissible
//! band (`[eps, 1 - eps]` of the normalized quantity), a negative one relaxes it.
//! Generator-level metrics list regular machines first, then slack machines;
//! N-1/N-2 and in-service metrics only consider regular machines.

use pdv_core::PdvResult;

use crate::registry::{MetricDef, MetricRegistry, MetricValues};
use crate::sample::{Branch, GridSample, Generator};

const CURRENT_COST_EPS: f64 = 0.1;
const VOLTAGE_COST_EPS: f64 = 0.1;
const REACTIVE_COST_EPS: f64 = 0.5;

fn machines(grid: &GridSample) -> impl Iterator<Item = &Generator> {
    let regular = grid.generators.iter().filter(|g| !g.slack);
    let slack = grid.generators.iter().filter(|g| g.slack);
    regular.chain(slack)
}

fn regular_machines(grid: &GridSample) -> impl Iterator<Item = &Generator> {
    grid.generators.iter().filter(|g| !g.slack)
}

fn nansum(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().filter(|v| !v.is_nan()).sum()
}

/// Arithmetic mean; NaN for an empty input.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// `max(0, x)` that keeps NaN.
fn positive_part(x: f64) -> f64 {
    if x.is_nan() {
        x
    } else {
        x.max(0.0)
    }
}

fn bus_vm(grid: &GridSample) -> impl Iterator<Item = (&str, f64)> {
    grid.buses
        .iter()
        .map(|b| (b.name.as_str(), b.res_vm_pu.unwrap_or(f64::NAN)))
}

fn normalized_voltages(grid: &GridSample) -> Vec<(String, f64)> {
    grid.buses
        .iter()
        .map(|b| {
            let v = b.res_vm_pu.unwrap_or(f64::NAN);
            (b.name.clone(), (v - b.min_vm_pu) / (b.max_vm_pu - b.min_vm_pu + 1e-4))
        })
        .collect()
}

fn normalized_currents(grid: &GridSample) -> Vec<(String, f64)> {
    grid.branches()
        .map(|b| (b.name.clone(), b.loading_percent() / 100.0))
        .collect()
}

fn normalized_reactive(grid: &GridSample) -> Vec<(String, f64)> {
    machines(grid)
        .map(|g| {
            let q = g.reactive_power();
            (g.name.clone(), (q - g.min_q_mvar) / (g.max_q_mvar - g.min_q_mvar))
        })
        .collect()
}

fn outside_band(values: Vec<(String, f64)>, eps: f64) -> Vec<(String, bool)> {
    values
        .into_iter()
        .map(|(name, v)| (name, v < eps || v > 1.0 - eps))
        .collect()
}

fn above(values: Vec<(String, f64)>, limit: f64) -> Vec<(String, bool)> {
    values.into_iter().map(|(name, v)| (name, v > limit)).collect()
}

fn illicit_voltage(grid: &GridSample, eps: f64) -> Vec<(String, bool)> {
    outside_band(normalized_voltages(grid), eps)
}

fn illicit_current(grid: &GridSample, eps: f64) -> Vec<(String, bool)> {
    above(normalized_currents(grid), 1.0 - eps)
}

fn illicit_reactive(grid: &GridSample, eps: f64) -> Vec<(String, bool)> {
    outside_band(normalized_reactive(grid), eps)
}

fn any_flag(flags: &[(String, bool)]) -> bool {
    flags.iter().any(|(_, f)| *f)
}

fn count_flags(flags: &[(String, bool)]) -> f64 {
    flags.iter().filter(|(_, f)| *f).count() as f64
}

fn bus_illicit_voltage_band(grid: &GridSample, eps: f64) -> MetricValues {
    MetricValues::flags(illicit_voltage(grid, eps))
}

fn snapshots_illicit_voltage_band(grid: &GridSample, eps: f64) -> MetricValues {
    MetricValues::scalar_flag(any_flag(&illicit_voltage(grid, eps)))
}

fn branch_illicit_current_band(grid: &GridSample, eps: f64) -> MetricValues {
    MetricValues::flags(illicit_current(grid, eps))
}

fn snapshots_illicit_current_band(grid: &GridSample, eps: f64) -> MetricValues {
    MetricValues::scalar_flag(any_flag(&illicit_current(grid, eps)))
}

fn generator_illicit_reactive_band(grid: &GridSample, eps: f64) -> MetricValues {
    MetricValues::flags(illicit_reactive(grid, eps))
}

fn snapshots_illicit_reactive_band(grid: &GridSample, eps: f64) -> MetricValues {
    MetricValues::scalar_flag(any_flag(&illicit_reactive(grid, eps)))
}

fn snapshots_illicit_values_band(grid: &GridSample, eps: f64) -> MetricValues {
    let illicit = any_flag(&illicit_voltage(grid, eps))
        || any_flag(&illicit_current(grid, eps))
        || any_flag(&illicit_reactive(grid, eps));
    MetricValues::scalar_flag(illicit)
}

macro_rules! banded {
    ($($name:ident => $body:ident($eps:expr);)*) => {
        $(
            fn $name(grid: &GridSample) -> MetricValues {
                $body(grid, $eps)
            }
        )*
    };
}

banded! {
    bus_illicit_voltage => bus_illicit_voltage_band(0.0);
    bus_illicit_voltage_005 => bus_illicit_voltage_band(0.05);
    bus_illicit_voltage_01 => bus_illicit_voltage_band(0.1);
    bus_illicit_voltage_025 => bus_illicit_voltage_band(0.25);
    bus_illicit_voltage_m005 => bus_illicit_voltage_band(-0.05);
    bus_illicit_voltage_m01 => bus_illicit_voltage_band(-0.1);
    snapshots_illicit_voltage => snapshots_illicit_voltage_band(0.0);
    snapshots_illicit_voltage_005 => snapshots_illicit_voltage_band(0.05);
    snapshots_illicit_voltage_01 => snapshots_illicit_voltage_band(0.1);
    snapshots_illicit_voltage_025 => snapshots_illicit_voltage_band(0.25);
    snapshots_illicit_voltage_m005 => snapshots_illicit_voltage_band(-0.05);
    snapshots_illicit_voltage_m01 => snapshots_illicit_voltage_band(-0.1);
    branch_illicit_current => branch_illicit_current_band(0.0);
    branch_illicit_current_005 => branch_illicit_current_band(0.05);
    branch_illicit_current_01 => branch_illicit_current_band(0.1);
    branch_illicit_current_m005 => branch_illicit_current_band(-0.05);
    branch_illicit_current_m01 => branch_illicit_current_band(-0.1);
    snapshots_illicit_current => snapshots_illicit_current_band(0.0);
    snapshots_illicit_current_005 => snapshots_illicit_current_band(0.05);
    snapshots_illicit_current_01 => snapshots_illicit_current_band(0.1);
    snapshots_illicit_current_m005 => snapshots_illicit_current_band(-0.05);
    snapshots_illicit_current_m01 => snapshots_illicit_current_band(-0.1);
    generator_illicit_reactive => generator_illicit_reactive_band(0.0);
    generator_illicit_reactive_005 => generator_illicit_reactive_band(0.05);
    generator_illicit_reactive_01 => generator_illicit_reactive_band(0.1);
    generator_illicit_reactive_m005 => generator_illicit_reactive_band(-0.05);
    generator_illicit_reactive_m01 => generator_illicit_reactive_band(-0.1);
    snapshots_illicit_reactive => snapshots_illicit_reactive_band(0.0);
    snapshots_illicit_reactive_005 => snapshots_illicit_reactive_band(0.05);
    snapshots_illicit_reactive_01 => snapshots_illicit_reactive_band(0.1);
    snapshots_illicit_values => snapshots_illicit_values_band(0.0);
    snapshots_illicit_values_005 => snapshots_illicit_values_band(0.05);
    snapshots_illicit_values_01 => snapshots_illicit_values_band(0.1);
    snapshots_illicit_values_m005 => snapshots_illicit_values_band(-0.05);
    snapshots_illicit_values_m01 => snapshots_illicit_values_band(-0.1);
}

fn generation_voltage_setpoint(grid: &GridSample) -> MetricValues {
    MetricValues::floats(
        machines(grid)
            .filter(|g| g.in_service)
            .map(|g| (g.name.as_str(), g.vm_pu)),
    )
}

fn branch_losses<'a>(branches: impl Iterator<Item = &'a Branch>) -> MetricValues {
    MetricValues::floats(branches.map(|b| (b.name.as_str(), b.losses_mw())))
}

fn line_joule_losses(grid: &GridSample) -> MetricValues {
    branch_losses(grid.lines.iter())
}

fn trafo_joule_losses(grid: &GridSample) -> MetricValues {
    branch_losses(grid.transformers.iter())
}

fn total_losses(grid: &GridSample) -> f64 {
    grid.branches().map(Branch::losses_mw).sum()
}

fn total_joule_losses(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(total_losses(grid))
}

fn normalized_joule_losses(grid: &GridSample) -> MetricValues {
    let load: f64 = grid.loads.iter().map(|l| l.p_mw).sum();
    MetricValues::scalar(total_losses(grid) / load)
}

fn shunt_steps(grid: &GridSample) -> MetricValues {
    MetricValues::floats(grid.shunts.iter().map(|s| (s.name.as_str(), s.step)))
}

fn shunt_steps_normalized(grid: &GridSample) -> MetricValues {
    MetricValues::floats(grid.shunts.iter().map(|s| (s.name.as_str(), s.step / s.max_step)))
}

fn load_active_power(grid: &GridSample) -> MetricValues {
    MetricValues::floats(grid.loads.iter().map(|l| (l.name.as_str(), l.p_mw)))
}

fn load_total_active_power(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(nansum(grid.loads.iter().map(|l| l.p_mw)))
}

fn load_reactive_power(grid: &GridSample) -> MetricValues {
    MetricValues::floats(grid.loads.iter().map(|l| (l.name.as_str(), l.q_mvar)))
}

fn load_total_reactive_power(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(nansum(grid.loads.iter().map(|l| l.q_mvar)))
}

fn load_power_factor(grid: &GridSample) -> MetricValues {
    MetricValues::floats(
        grid.loads
            .iter()
            .map(|l| (l.name.as_str(), l.p_mw / l.p_mw.hypot(l.q_mvar))),
    )
}

fn bus_voltage(grid: &GridSample) -> MetricValues {
    MetricValues::floats(bus_vm(grid))
}

fn bus_normalized_voltage(grid: &GridSample) -> MetricValues {
    MetricValues::floats(normalized_voltages(grid))
}

fn bus_over_voltage(grid: &GridSample) -> MetricValues {
    MetricValues::flags(above(normalized_voltages(grid), 1.0))
}

fn bus_under_voltage(grid: &GridSample) -> MetricValues {
    MetricValues::flags(
        normalized_voltages(grid)
            .into_iter()
            .map(|(name, v)| (name, v < 0.0)),
    )
}

fn voltage_violation_count(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(count_flags(&illicit_voltage(grid, 0.0)))
}

fn line_loading_percent(grid: &GridSample) -> MetricValues {
    MetricValues::floats(grid.lines.iter().map(|b| (b.name.as_str(), b.loading_percent())))
}

fn trafo_loading_percent(grid: &GridSample) -> MetricValues {
    MetricValues::floats(
        grid.transformers
            .iter()
            .map(|b| (b.name.as_str(), b.loading_percent())),
    )
}

fn branch_normalized_current(grid: &GridSample) -> MetricValues {
    MetricValues::floats(normalized_currents(grid))
}

fn current_violation_count(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(count_flags(&illicit_current(grid, 0.0)))
}

fn generator_active_power(grid: &GridSample) -> MetricValues {
    MetricValues::floats(machines(grid).map(|g| (g.name.as_str(), g.active_power())))
}

fn generator_total_active_power(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(nansum(machines(grid).map(Generator::active_power)))
}

fn generator_reactive_power(grid: &GridSample) -> MetricValues {
    MetricValues::floats(machines(grid).map(|g| (g.name.as_str(), g.reactive_power())))
}

fn generator_total_reactive_power(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(nansum(machines(grid).map(Generator::reactive_power)))
}

fn generator_normalized_reactive_power(grid: &GridSample) -> MetricValues {
    MetricValues::floats(normalized_reactive(grid))
}

fn generator_over_reactive_power(grid: &GridSample) -> MetricValues {
    MetricValues::flags(above(normalized_reactive(grid), 1.0))
}

fn generator_under_reactive_power(grid: &GridSample) -> MetricValues {
    MetricValues::flags(
        normalized_reactive(grid)
            .into_iter()
            .map(|(name, q)| (name, q < 0.0)),
    )
}

fn reactive_violation_count(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(count_flags(&illicit_reactive(grid, 0.0)))
}

fn violation_count(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(
        count_flags(&illicit_current(grid, 0.0))
            + count_flags(&illicit_voltage(grid, 0.0))
            + count_flags(&illicit_reactive(grid, 0.0)),
    )
}

fn current_cost_value(grid: &GridSample) -> f64 {
    let penalties: Vec<f64> = grid
        .branches()
        .filter(|b| b.in_service)
        .map(|b| positive_part(b.loading_percent() / 100.0 - 1.0 + 2.0 * CURRENT_COST_EPS).powi(2))
        .collect();
    mean(&penalties)
}

fn voltage_cost_value(grid: &GridSample) -> f64 {
    let penalties: Vec<f64> = grid
        .buses
        .iter()
        .filter(|b| b.in_service)
        .map(|b| {
            let v = b.res_vm_pu.unwrap_or(f64::NAN);
            let vn = (v - b.min_vm_pu) / (b.max_vm_pu - b.min_vm_pu);
            positive_part(vn - 1.0 + VOLTAGE_COST_EPS).powi(2)
                + positive_part(VOLTAGE_COST_EPS - vn).powi(2)
        })
        .collect();
    mean(&penalties)
}

fn reactive_cost_value(grid: &GridSample) -> f64 {
    let penalties: Vec<f64> = regular_machines(grid)
        .filter(|g| g.in_service)
        .map(|g| {
            let qn = (g.reactive_power() - g.min_q_mvar) / (g.max_q_mvar - g.min_q_mvar);
            positive_part(qn - 1.0 + REACTIVE_COST_EPS).powi(2)
                + positive_part(REACTIVE_COST_EPS - qn).powi(2)
        })
        .collect();
    mean(&penalties)
}

fn joule_cost_value(grid: &GridSample) -> f64 {
    let losses: f64 = grid
        .branches()
        .filter(|b| b.in_service)
        .map(Branch::losses_mw)
        .sum();
    let load: f64 = grid.loads.iter().filter(|l| l.in_service).map(|l| l.p_mw).sum();
    losses / load
}

fn current_cost(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(current_cost_value(grid))
}

fn voltage_cost(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(voltage_cost_value(grid))
}

fn reactive_cost(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(reactive_cost_value(grid))
}

fn joule_cost(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(joule_cost_value(grid))
}

/// Joule + reactive + current + voltage costs, unit weights.
fn cost(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(
        joule_cost_value(grid)
            + reactive_cost_value(grid)
            + current_cost_value(grid)
            + voltage_cost_value(grid),
    )
}

fn outages<'a>(in_service: impl Iterator<Item = &'a bool>) -> usize {
    in_service.filter(|on| !**on).count()
}

fn line_n1(grid: &GridSample) -> MetricValues {
    MetricValues::scalar_flag(outages(grid.lines.iter().map(|l| &l.in_service)) == 1)
}

fn line_n2(grid: &GridSample) -> MetricValues {
    MetricValues::scalar_flag(outages(grid.lines.iter().map(|l| &l.in_service)) == 2)
}

fn branch_in_service_count(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(grid.branches().filter(|b| b.in_service).count() as f64)
}

fn gen_n1(grid: &GridSample) -> MetricValues {
    MetricValues::scalar_flag(outages(regular_machines(grid).map(|g| &g.in_service)) == 1)
}

fn gen_n2(grid: &GridSample) -> MetricValues {
    MetricValues::scalar_flag(outages(regular_machines(grid).map(|g| &g.in_service)) == 2)
}

fn generator_in_service_count(grid: &GridSample) -> MetricValues {
    MetricValues::scalar(regular_machines(grid).filter(|g| g.in_service).count() as f64)
}

fn line_in_service(grid: &GridSample) -> MetricValues {
    MetricValues::flags(grid.lines.iter().map(|l| (l.name.as_str(), l.in_service)))
}

fn trafo_in_service(grid: &GridSample) -> MetricValues {
    MetricValues::flags(grid.transformers.iter().map(|t| (t.name.as_str(), t.in_service)))
}

fn gen_in_service(grid: &GridSample) -> MetricValues {
    MetricValues::flags(regular_machines(grid).map(|g| (g.name.as_str(), g.in_service)))
}

/// Every standard metric with its persisted name, in report order.
pub fn standard_metrics() -> Vec<MetricDef> {
    macro_rules! defs {
        ($($name:literal => $formula:ident,)*) => {
            vec![$(MetricDef { name: $name, formula: $formula },)*]
        };
    }
    defs![
        "Generation Voltage Set Points (p.u.)" => generation_voltage_setpoint,
        "Line Joule Losses (MW)" => line_joule_losses,
        "Transformer Joule Losses (MW)" => trafo_joule_losses,
        "Total Joule Losses (MW)" => total_joule_losses,
        "Normalized Joule Losses" => normalized_joule_losses,
        "Shunt Steps" => shunt_steps,
        "Shunt Steps Normalized" => shunt_steps_normalized,
        "Load Active Power (MW)" => load_active_power,
        "Load Total Active Power (MW)" => load_total_active_power,
        "Load Reactive Power (MVAr)" => load_reactive_power,
        "Load Total Reactive Power (MVAr)" => load_total_reactive_power,
        "Load Power Factor" => load_power_factor,
        "Bus Voltage (p.u.)" => bus_voltage,
        "Bus Normalized Voltage" => bus_normalized_voltage,
        "Buses with Over Voltage" => bus_over_voltage,
        "Buses with Under Voltage" => bus_under_voltage,
        "Buses with Illicit Voltage" => bus_illicit_voltage,
        "Buses with Illicit Voltage, eps=0.05" => bus_illicit_voltage_005,
        "Buses with Illicit Voltage, eps=0.1" => bus_illicit_voltage_01,
        "Buses with Illicit Voltage, eps=0.25" => bus_illicit_voltage_025,
        "Buses with Illicit Voltage, eps=-0.05" => bus_illicit_voltage_m005,
        "Buses with Illicit Voltage, eps=-0.1" => bus_illicit_voltage_m01,
        "Snapshots with Illicit Voltage" => snapshots_illicit_voltage,
        "Snapshots with Illicit Voltage, eps=0.05" => snapshots_illicit_voltage_005,
        "Snapshots with Illicit Voltage, eps=0.1" => snapshots_illicit_voltage_01,
        "Snapshots with Illicit Voltage, eps=0.25" => snapshots_illicit_voltage_025,
        "Snapshots with Illicit Voltage, eps=-0.05" => snapshots_illicit_voltage_m005,
        "Snapshots with Illicit Voltage, eps=-0.1" => snapshots_illicit_voltage_m01,
        "Voltage Violation Count per Snapshot" => voltage_violation_count,
        "Line Loading Percent (%)" => line_loading_percent,
        "Transformer Loading Percent (%)" => trafo_loading_percent,
        "Branch Normalized Current" => branch_normalized_current,
        "Branches with Illicit Current" => branch_illicit_current,
        "Branches with Illicit Current, eps=0.05" => branch_illicit_current_005,
        "Branches with Illicit Current, eps=0.1" => branch_illicit_current_01,
        "Branches with Illicit Current, eps=-0.05" => branch_illicit_current_m005,
        "Branches with Illicit Current, eps=-0.1" => branch_illicit_current_m01,
        "Snapshots with Illicit Current" => snapshots_illicit_current,
        "Snapshots with Illicit Current, eps=0.05" => snapshots_illicit_current_005,
        "Snapshots with Illicit Current, eps=0.1" => snapshots_illicit_current_01,
        "Snapshots with Illicit Current, eps=-0.05" => snapshots_illicit_current_m005,
        "Snapshots with Illicit Current, eps=-0.1" => snapshots_illicit_current_m01,
        "Current Violation Count per Snapshot" => current_violation_count,
        "Generator Active Power (MW)" => generator_active_power,
        "Generator Total Active Power (MW)" => generator_total_active_power,
        "Generator Reactive Power (MVAr)" => generator_reactive_power,
        "Generator Total Reactive Power (MVAr)" => generator_total_reactive_power,
        "Generator Normalized Reactive Power" => generator_normalized_reactive_power,
        "Generators with Over Reactive Power" => generator_over_reactive_power,
        "Generators with Under Reactive Power" => generator_under_reactive_power,
        "Generators with Illicit Reactive Power" => generator_illicit_reactive,
        "Generators with Illicit Reactive Power, eps=0.05" => generator_illicit_reactive_005,
        "Generators with Illicit Reactive Power, eps=0.1" => generator_illicit_reactive_01,
        "Generators with Illicit Reactive Power, eps=-0.05" => generator_illicit_reactive_m005,
        "Generators with Illicit Reactive Power, eps=-0.1" => generator_illicit_reactive_m01,
        "Snapshots with Illicit Reactive Power" => snapshots_illicit_reactive,
        "Snapshots with Illicit Reactive Power, eps=0.05" => snapshots_illicit_reactive_005,
        "Snapshots with Illicit Reactive Power, eps=0.1" => snapshots_illicit_reactive_01,
        "Reactive Violation Count per Snapshot" => reactive_violation_count,
        "Snapshots with Illicit Values" => snapshots_illicit_values,
        "Snapshots with Illicit Values, eps=0.05" => snapshots_illicit_values_005,
        "Snapshots with Illicit Values, eps=0.1" => snapshots_illicit_values_01,
        "Snapshots with Illicit Values, eps=-0.05" => snapshots_illicit_values_m005,
        "Snapshots with Illicit Values, eps=-0.1" => snapshots_illicit_values_m01,
        "Violation Count per Snapshot" => violation_count,
        "Current Cost" => current_cost,
        "Voltage Cost" => voltage_cost,
        "Reactive Cost" => reactive_cost,
        "Joule Cost" => joule_cost,
        "Cost" => cost,
        "Line N-1" => line_n1,
        "Line N-2" => line_n2,
        "Branch In Service Count" => branch_in_service_count,
        "Generators N-1" => gen_n1,
        "Generators N-2" => gen_n2,
        "Generators In Service Count" => generator_in_service_count,
        "Line in Service" => line_in_service,
        "Transformer in Service" => trafo_in_service,
        "Gen in Service" => gen_in_service,
    ]
}

pub fn standard_registry() -> PdvResult<MetricRegistry> {
    MetricRegistry::new(standard_metrics())
}
