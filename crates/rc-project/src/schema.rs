//! Engine definition schema.

use rc_solver::SolverConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineDef {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub properties: PropertiesDef,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub shafts: Vec<ShaftDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub electric_shafts: Vec<ElectricShaftDef>,
    #[serde(default)]
    pub heat_links: Vec<HeatLinkDef>,
    #[serde(default)]
    pub seeds: Vec<SeedDef>,
    #[serde(default)]
    pub break_variables: Vec<BreakVariableDef>,
    /// Stage mass closure for a Δv estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetDef>,
}

/// Thermophysical property backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertiesDef {
    #[default]
    Perfect,
    Coolprop,
}

/// Solver settings; omitted fields take the solver defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverDef {
    pub tolerance: f64,
    pub consecutive: usize,
    pub divergence_window: usize,
    pub max_iterations: usize,
    pub fd_step: f64,
    pub max_step_fraction: f64,
    pub line_search_factor: f64,
    pub line_search_iterations: usize,
}

impl Default for SolverDef {
    fn default() -> Self {
        SolverConfig::default().into()
    }
}

impl From<SolverConfig> for SolverDef {
    fn from(c: SolverConfig) -> Self {
        Self {
            tolerance: c.tolerance,
            consecutive: c.consecutive,
            divergence_window: c.divergence_window,
            max_iterations: c.max_iterations,
            fd_step: c.fd_step,
            max_step_fraction: c.max_step_fraction,
            line_search_factor: c.line_search_factor,
            line_search_iterations: c.line_search_iterations,
        }
    }
}

impl From<SolverDef> for SolverConfig {
    fn from(d: SolverDef) -> Self {
        Self {
            tolerance: d.tolerance,
            consecutive: d.consecutive,
            divergence_window: d.divergence_window,
            max_iterations: d.max_iterations,
            fd_step: d.fd_step,
            max_step_fraction: d.max_step_fraction,
            line_search_factor: d.line_search_factor,
            line_search_iterations: d.line_search_iterations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub id: String,
    pub kind: ComponentKindDef,
    #[serde(default)]
    pub inlets: Vec<String>,
    #[serde(default)]
    pub outlets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ComponentKindDef {
    Tank {
        propellant: String,
        pressure_pa: f64,
        /// Storage temperature of the propellant when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature_k: Option<f64>,
        mass_flow_kg_s: f64,
    },
    Pump {
        efficiency: f64,
        target: PumpTargetDef,
    },
    Turbine {
        efficiency: f64,
        mode: TurbineModeDef,
    },
    Chamber {
        /// Written as `OX/FUEL`, e.g. `LOX/RP1`.
        pair: String,
        chamber_pressure_pa: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        injector_drop: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mixture_ratio_target: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature_limit_k: Option<f64>,
    },
    CoolingChannel {
        /// Fixed heat load; heat links supply it when omitted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        heat_load_w: Option<f64>,
        #[serde(default)]
        pressure_drop: PressureDropDef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_outlet_temperature_k: Option<f64>,
    },
    HeatExchanger {
        mode: HeatExchangerModeDef,
        #[serde(default)]
        hot_drop: PressureDropDef,
        #[serde(default)]
        cold_drop: PressureDropDef,
    },
    Nozzle {
        expansion: ExpansionDef,
        ambient_pressure_pa: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quality_factor: Option<f64>,
    },
    Splitter {
        rule: SplitRuleDef,
    },
    Merger,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PumpTargetDef {
    DischargePressure { pressure_pa: f64 },
    PressureRatio { ratio: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TurbineModeDef {
    PressureRatio { ratio: f64 },
    OutletPressure { pressure_pa: f64 },
    MatchDemand { min_outlet_pressure_pa: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PressureDropDef {
    Absolute { delta_p_pa: f64 },
    Fraction { fraction: f64 },
}

impl Default for PressureDropDef {
    fn default() -> Self {
        PressureDropDef::Absolute { delta_p_pa: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum HeatExchangerModeDef {
    Conductance { ua_w_per_k: f64 },
    ColdOutletTemperature { temperature_k: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ExpansionDef {
    ExitPressure { pressure_pa: f64 },
    AreaRatio { ratio: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SplitRuleDef {
    /// One fraction per outlet, summing to 1.
    Fractions { fractions: Vec<f64> },
    /// Fixed flows for all outlets but the last, which takes the remainder.
    FixedFlows { mass_flows_kg_s: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShaftDef {
    pub id: String,
    pub turbine: String,
    pub pumps: Vec<String>,
    #[serde(default = "default_mechanical_efficiency")]
    pub mechanical_efficiency: f64,
}

fn default_mechanical_efficiency() -> f64 {
    1.0
}

/// Pumps on a battery-fed motor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElectricShaftDef {
    pub id: String,
    pub pumps: Vec<String>,
    #[serde(default = "default_mechanical_efficiency")]
    pub mechanical_efficiency: f64,
    /// Sets battery discharge efficiency and stored energy.
    pub burn_time_s: f64,
    #[serde(default)]
    pub drive: ElectricDriveDef,
}

/// Motor, inverter and battery technology; defaults are a brushless DC
/// motor on a lithium-polymer pack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ElectricDriveDef {
    pub motor_efficiency: f64,
    pub motor_specific_power_w_per_kg: f64,
    pub inverter_efficiency: f64,
    pub inverter_specific_power_w_per_kg: f64,
    pub battery_specific_energy_j_per_kg: f64,
    pub battery_specific_power_w_per_kg: f64,
    pub battery_packing_factor: f64,
}

impl Default for ElectricDriveDef {
    fn default() -> Self {
        Self {
            motor_efficiency: 0.95,
            motor_specific_power_w_per_kg: 5.3e3,
            inverter_efficiency: 0.85,
            inverter_specific_power_w_per_kg: 60e3,
            battery_specific_energy_j_per_kg: 198.0 * 3600.0,
            battery_specific_power_w_per_kg: 6.95e3,
            battery_packing_factor: 1.2,
        }
    }
}

/// Heat path from a chamber into a cooling channel. Give either a fixed
/// `fraction` of the heat release or a `wall` flux model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatLinkDef {
    pub chamber: String,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall: Option<WallDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WallDef {
    pub cooled_area_m2: f64,
    pub max_wall_temperature_k: f64,
    /// Estimated from the throat area when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contraction_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_emissivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_emissivity: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BudgetDef {
    pub burn_time_s: f64,
    pub dry_mass_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propellant_margin: Option<f64>,
    /// Report the payload this Δv allows [m/s].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_delta_v_m_s: Option<f64>,
}

/// Starting state of a stream that closes a loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedDef {
    pub stream: String,
    pub propellant: String,
    pub mass_flow_kg_s: f64,
    pub pressure_pa: f64,
    pub temperature_k: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakVariableDef {
    pub name: String,
    pub unknown: UnknownDef,
    pub closure: ClosureDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum UnknownDef {
    TankMassFlow { component: String },
    PumpDischarge { component: String },
    TurbinePressureRatio { component: String },
    SplitterFlow { component: String, outlet: usize },
}

impl UnknownDef {
    pub fn component(&self) -> &str {
        match self {
            UnknownDef::TankMassFlow { component }
            | UnknownDef::PumpDischarge { component }
            | UnknownDef::TurbinePressureRatio { component }
            | UnknownDef::SplitterFlow { component, .. } => component,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClosureDef {
    ShaftPower { component: String },
    MixtureRatio { component: String },
    FeedPressure { component: String, inlet: usize },
    CoolantTemperature { component: String },
}

impl ClosureDef {
    pub fn component(&self) -> &str {
        match self {
            ClosureDef::ShaftPower { component }
            | ClosureDef::MixtureRatio { component }
            | ClosureDef::CoolantTemperature { component }
            | ClosureDef::FeedPressure { component, .. } => component,
        }
    }
}
