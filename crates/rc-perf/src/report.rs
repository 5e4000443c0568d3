//! Serializable result records.
//!
//! Field names carry their SI unit so JSON output is self-describing.

use rc_fluids::{FlowState, Phase};
use rc_solver::{CycleGraph, CycleSolution};
use serde::{Deserialize, Serialize};

use crate::evaluate::EnginePerformance;

/// One stream at the converged point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub name: String,
    pub fluid: String,
    pub phase: String,
    pub mdot_kg_s: f64,
    pub p_pa: f64,
    pub t_k: f64,
    pub h_j_per_kg: f64,
}

impl StreamSnapshot {
    pub fn new(name: impl Into<String>, state: &FlowState) -> Self {
        Self {
            name: name.into(),
            fluid: state.fluid.to_string(),
            phase: match state.phase {
                Phase::Liquid => "liquid",
                Phase::Gas => "gas",
            }
            .to_string(),
            mdot_kg_s: state.mass_flow.value,
            p_pa: state.pressure.value,
            t_k: state.temperature.value,
            h_j_per_kg: state.enthalpy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakVariableSnapshot {
    pub name: String,
    pub value: f64,
    pub residual: f64,
}

/// Chamber operating point and margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChamberSnapshot {
    pub component: String,
    pub pair: String,
    pub pc_pa: f64,
    pub mixture_ratio: f64,
    pub t_k: f64,
    pub c_star_m_s: f64,
    pub required_feed_p_pa: f64,
    /// Feed pressure minus requirement, per inlet.
    pub feed_margins_pa: Vec<f64>,
    /// Limit minus flame temperature, when a limit is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_margin_k: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NozzleSnapshot {
    pub component: String,
    pub thrust_n: f64,
    pub isp_s: f64,
    pub mdot_kg_s: f64,
    pub exit_p_pa: f64,
    pub area_ratio: f64,
    pub choked: bool,
}

/// Shaft power of a pump (absorbed, positive) or turbine (delivered,
/// positive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub component: String,
    pub kind: String,
    pub power_w: f64,
}

/// Coolant side of a cooling channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoolingSnapshot {
    pub component: String,
    pub heat_load_w: f64,
    pub outlet_t_k: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_outlet_t_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_coolant_mdot_kg_s: Option<f64>,
}

/// Hot-gas side of a wall-cooled chamber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSnapshot {
    pub chamber: String,
    pub channel: String,
    pub convective_flux_w_m2: f64,
    pub throat_flux_w_m2: f64,
    pub radiative_flux_w_m2: f64,
    pub throat_diameter_m: f64,
    pub chamber_diameter_m: f64,
    pub heat_load_w: f64,
}

/// Power chain and masses of an electric pump drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricDriveSnapshot {
    pub shaft: String,
    /// Pump draw plus mechanical losses.
    pub shaft_power_w: f64,
    pub battery_output_w: f64,
    pub battery_heat_w: f64,
    pub energy_j: f64,
    pub battery_efficiency: f64,
    pub motor_mass_kg: f64,
    pub inverter_mass_kg: f64,
    pub battery_mass_kg: f64,
}

impl ElectricDriveSnapshot {
    pub fn mass_kg(&self) -> f64 {
        self.motor_mass_kg + self.inverter_mass_kg + self.battery_mass_kg
    }
}

/// Full record of a converged cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub iterations: usize,
    pub max_residual: f64,
    pub break_variables: Vec<BreakVariableSnapshot>,
    pub streams: Vec<StreamSnapshot>,
    pub performance: EnginePerformance,
}

impl CycleReport {
    pub fn new(cycle: &CycleGraph, solution: &CycleSolution, performance: EnginePerformance) -> Self {
        let break_variables = cycle
            .break_variables()
            .iter()
            .zip(solution.state.values.iter().zip(&solution.state.residuals))
            .map(|(var, (value, residual))| BreakVariableSnapshot {
                name: var.name.clone(),
                value: *value,
                residual: *residual,
            })
            .collect();
        let streams = cycle
            .graph()
            .streams()
            .iter()
            .filter_map(|s| solution.stream(s.id).map(|state| StreamSnapshot::new(&s.name, state)))
            .collect();
        Self {
            iterations: solution.iterations,
            max_residual: solution.max_residual(),
            break_variables,
            streams,
            performance,
        }
    }
}
