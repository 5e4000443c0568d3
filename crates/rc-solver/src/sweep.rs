//! Parallel parameter sweeps.

use rayon::prelude::*;
use rc_core::CompId;
use rc_core::units::{kgps, pa};
use rc_fluids::{EquilibriumEngine, PropertyAdapter, PropertyEngine};
use tracing::debug;

use crate::cycle::CycleGraph;
use crate::error::{SolverError, SolverResult};
use crate::solver::{CycleSolution, CycleSolver, SolverConfig};

/// Component parameter varied by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepParameter {
    /// Chamber pressure [Pa] of a chamber.
    ChamberPressure,
    /// Delivered mass flow [kg/s] of a tank.
    MassFlow,
}

impl SweepParameter {
    pub fn name(self) -> &'static str {
        match self {
            SweepParameter::ChamberPressure => "chamber-pressure",
            SweepParameter::MassFlow => "mass-flow",
        }
    }

    fn apply(self, cycle: &CycleGraph, component: CompId, value: f64) -> SolverResult<CycleGraph> {
        match self {
            SweepParameter::ChamberPressure => cycle.with_chamber_pressure(component, pa(value)),
            SweepParameter::MassFlow => cycle.with_mass_flow(component, kgps(value)),
        }
    }
}

/// Outcome at one sweep value.
#[derive(Debug)]
pub struct SweepPoint {
    pub value: f64,
    pub result: SolverResult<(CycleGraph, CycleSolution)>,
}

/// `steps` evenly spaced values from `from` to `to` inclusive.
pub fn linspace(from: f64, to: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![from],
        n => (0..n)
            .map(|i| from + (to - from) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Solve the cycle at each value, in parallel.
///
/// Points are independent: each builds its own cycle copy and
/// `PropertyAdapter`, so caches are never shared across threads. Results
/// come back in the order of `values`.
pub fn sweep(
    cycle: &CycleGraph,
    component: CompId,
    parameter: SweepParameter,
    values: &[f64],
    properties: &dyn PropertyEngine,
    equilibrium: &dyn EquilibriumEngine,
    config: SolverConfig,
) -> SolverResult<Vec<SweepPoint>> {
    if cycle.spec(component).is_none() {
        return Err(SolverError::setup(format!("no component #{component} to sweep")));
    }
    debug!(
        parameter = parameter.name(),
        component = cycle.component_name(component),
        points = values.len(),
        "starting sweep"
    );

    Ok(values
        .par_iter()
        .map(|&value| {
            let result = parameter.apply(cycle, component, value).and_then(|point| {
                let adapter = PropertyAdapter::new(properties, equilibrium);
                let solution = CycleSolver::new(&point, config).solve(&adapter, None)?;
                Ok((point, solution))
            });
            SweepPoint { value, result }
        })
        .collect())
}
