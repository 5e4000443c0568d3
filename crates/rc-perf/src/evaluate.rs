//! Engine-level performance from a converged cycle.

use rc_components::{ComponentKind, ComponentOutput};
use rc_core::CompId;
use rc_core::units::constants::G0_MPS2;
use rc_core::units::watts;
use rc_fluids::PropellantRole;
use rc_solver::{CycleGraph, CycleSolution, HeatSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PerfError, PerfResult};
use crate::report::{
    ChamberSnapshot, CoolingSnapshot, CycleReport, ElectricDriveSnapshot, MachineSnapshot,
    NozzleSnapshot, WallSnapshot,
};

/// Whole-engine figures.
///
/// Thrust is the sum over every nozzle, turbine exhaust included. The
/// delivered Isp divides it by everything drawn from the tanks, so bleed
/// and gas-generator flow count against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnginePerformance {
    pub thrust_n: f64,
    /// Total flow leaving the tanks.
    pub tank_mdot_kg_s: f64,
    pub isp_s: f64,
    /// Oxidizer over fuel tank flow; absent without both.
    pub mixture_ratio: Option<f64>,
    pub pump_power_w: f64,
    pub turbine_power_w: f64,
    pub chambers: Vec<ChamberSnapshot>,
    pub nozzles: Vec<NozzleSnapshot>,
    pub machines: Vec<MachineSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cooling: Vec<CoolingSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub walls: Vec<WallSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub electric_drives: Vec<ElectricDriveSnapshot>,
}

impl EnginePerformance {
    /// Smallest feed-pressure margin over all chambers [Pa].
    pub fn min_feed_margin(&self) -> Option<f64> {
        self.chambers
            .iter()
            .flat_map(|c| c.feed_margins_pa.iter().copied())
            .reduce(f64::min)
    }

    /// Motor, inverter and battery mass over all electric drives [kg].
    pub fn electric_mass_kg(&self) -> f64 {
        self.electric_drives.iter().map(ElectricDriveSnapshot::mass_kg).sum()
    }
}

/// Converged solution plus its performance summary.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub solution: CycleSolution,
    pub performance: EnginePerformance,
}

impl CycleResult {
    pub fn report(&self, cycle: &CycleGraph) -> CycleReport {
        CycleReport::new(cycle, &self.solution, self.performance.clone())
    }
}

#[derive(Default)]
struct Tally {
    thrust: f64,
    tank_flow: f64,
    oxidizer: f64,
    fuel: f64,
    pump_power: f64,
    turbine_power: f64,
}

fn finite(value: f64, what: &str) -> PerfResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PerfError::invalid(format!("{what} is {value}")))
    }
}

fn output<'s>(solution: &'s CycleSolution, id: CompId, name: &str) -> PerfResult<&'s ComponentOutput> {
    solution.output(id).ok_or_else(|| PerfError::MissingOutput {
        component: name.to_string(),
        what: "output",
    })
}

/// Aggregate thrust, flow, Isp, mixture ratio, turbomachine power and
/// chamber margins.
///
/// Fails with [`PerfError::InvalidResult`] on negative thrust, zero tank
/// flow or any non-finite figure.
pub fn evaluate(cycle: &CycleGraph, solution: CycleSolution) -> PerfResult<CycleResult> {
    let mut tally = Tally::default();
    let mut chambers = Vec::new();
    let mut nozzles = Vec::new();
    let mut machines = Vec::new();
    let mut cooling = Vec::new();

    for component in cycle.graph().components() {
        let id = component.id;
        let name = component.name.as_str();
        let Some(spec) = cycle.spec(id) else {
            continue;
        };
        let out = output(&solution, id, name)?;

        match spec.kind() {
            ComponentKind::Tank => {
                let m = out.outlets.iter().map(|s| s.mass_flow.value).sum::<f64>();
                let m = finite(m, &format!("'{name}' mass flow"))?;
                tally.tank_flow += m;
                match spec.as_tank().map(|t| t.propellant().role()) {
                    Some(PropellantRole::Oxidizer) => tally.oxidizer += m,
                    Some(PropellantRole::Fuel) => tally.fuel += m,
                    _ => {}
                }
            }
            ComponentKind::Pump => {
                let power = finite(out.shaft_power.value, &format!("'{name}' shaft power"))?;
                tally.pump_power += power;
                machines.push(MachineSnapshot {
                    component: name.to_string(),
                    kind: ComponentKind::Pump.to_string(),
                    power_w: power,
                });
            }
            ComponentKind::Turbine => {
                let power = finite(-out.shaft_power.value, &format!("'{name}' shaft power"))?;
                tally.turbine_power += power;
                machines.push(MachineSnapshot {
                    component: name.to_string(),
                    kind: ComponentKind::Turbine.to_string(),
                    power_w: power,
                });
            }
            ComponentKind::Chamber => {
                let report = out.chamber.as_ref().ok_or_else(|| PerfError::MissingOutput {
                    component: name.to_string(),
                    what: "chamber report",
                })?;
                let t = finite(report.flame_temperature.value, &format!("'{name}' flame temperature"))?;
                let temperature_margin_k = spec
                    .as_chamber()
                    .and_then(|c| c.temperature_limit())
                    .map(|limit| limit.value - t);
                chambers.push(ChamberSnapshot {
                    component: name.to_string(),
                    pair: report.pair.to_string(),
                    pc_pa: report.chamber_pressure.value,
                    mixture_ratio: report.mixture_ratio,
                    t_k: t,
                    c_star_m_s: report.c_star.value,
                    required_feed_p_pa: report.required_feed_pressure.value,
                    feed_margins_pa: report.feed_margins(),
                    temperature_margin_k,
                });
            }
            ComponentKind::Nozzle => {
                let perf = out.nozzle.as_ref().ok_or_else(|| PerfError::MissingOutput {
                    component: name.to_string(),
                    what: "nozzle performance",
                })?;
                let thrust = finite(perf.thrust.value, &format!("'{name}' thrust"))?;
                tally.thrust += thrust;
                nozzles.push(NozzleSnapshot {
                    component: name.to_string(),
                    thrust_n: thrust,
                    isp_s: perf.specific_impulse.value,
                    mdot_kg_s: perf.mass_flow.value,
                    exit_p_pa: perf.exit_pressure.value,
                    area_ratio: perf.area_ratio,
                    choked: perf.choked,
                });
            }
            ComponentKind::CoolingChannel => {
                let report = out.cooling.as_ref().ok_or_else(|| PerfError::MissingOutput {
                    component: name.to_string(),
                    what: "cooling report",
                })?;
                cooling.push(CoolingSnapshot {
                    component: name.to_string(),
                    heat_load_w: finite(report.heat_load.value, &format!("'{name}' heat load"))?,
                    outlet_t_k: report.outlet_temperature.value,
                    max_outlet_t_k: spec
                        .as_cooling_channel()
                        .and_then(|c| c.max_outlet_temperature())
                        .map(|t| t.value),
                    min_coolant_mdot_kg_s: report.min_coolant_flow.map(|m| m.value),
                });
            }
            ComponentKind::HeatExchanger
            | ComponentKind::Splitter
            | ComponentKind::Merger => {}
        }
    }

    let walls = wall_fluxes(cycle, &solution)?;
    let electric_drives = electric_drives(cycle, &solution)?;

    let thrust = finite(tally.thrust, "total thrust")?;
    if thrust < 0.0 {
        return Err(PerfError::invalid(format!("negative thrust {thrust:.3} N")));
    }
    if !(tally.tank_flow > 0.0) {
        return Err(PerfError::invalid("no propellant leaves the tanks"));
    }
    let isp = finite(thrust / (tally.tank_flow * G0_MPS2), "specific impulse")?;
    let mixture_ratio = (tally.oxidizer > 0.0 && tally.fuel > 0.0).then(|| tally.oxidizer / tally.fuel);
    debug!(thrust, isp, tank_flow = tally.tank_flow, "engine performance");

    let performance = EnginePerformance {
        thrust_n: thrust,
        tank_mdot_kg_s: tally.tank_flow,
        isp_s: isp,
        mixture_ratio,
        pump_power_w: tally.pump_power,
        turbine_power_w: tally.turbine_power,
        chambers,
        nozzles,
        machines,
        cooling,
        walls,
        electric_drives,
    };
    Ok(CycleResult {
        solution,
        performance,
    })
}

fn wall_fluxes(cycle: &CycleGraph, solution: &CycleSolution) -> PerfResult<Vec<WallSnapshot>> {
    let mut walls = Vec::new();
    for link in cycle.heat_links() {
        let HeatSource::Wall(wall) = link.source else {
            continue;
        };
        let chamber = cycle.component_name(link.chamber);
        let out = output(solution, link.chamber, chamber)?;
        let (Some(report), Some(products)) = (out.chamber.as_ref(), out.outlets.first()) else {
            return Err(PerfError::MissingOutput {
                component: chamber.to_string(),
                what: "chamber report",
            });
        };
        let load = wall
            .evaluate(report, products)
            .map_err(|e| PerfError::invalid(format!("'{chamber}' wall heat flux: {e}")))?;
        walls.push(WallSnapshot {
            chamber: chamber.to_string(),
            channel: cycle.component_name(link.channel).to_string(),
            convective_flux_w_m2: load.convective_flux,
            throat_flux_w_m2: load.throat_flux,
            radiative_flux_w_m2: load.radiative_flux,
            throat_diameter_m: load.throat_diameter,
            chamber_diameter_m: load.chamber_diameter,
            heat_load_w: load.heat_load.value,
        });
    }
    Ok(walls)
}

/// Size each electric drive for the power its pumps drew.
fn electric_drives(cycle: &CycleGraph, solution: &CycleSolution) -> PerfResult<Vec<ElectricDriveSnapshot>> {
    let mut drives = Vec::new();
    for shaft in cycle.electric_shafts() {
        let mut draw = 0.0;
        for &pump in &shaft.pumps {
            let name = cycle.component_name(pump);
            draw += finite(output(solution, pump, name)?.shaft_power.value, &format!("'{name}' shaft power"))?;
        }
        let shaft_power = draw / shaft.mechanical_efficiency;
        let sized = shaft
            .drive
            .size(watts(shaft_power))
            .map_err(|e| PerfError::invalid(format!("electric drive '{}': {e}", shaft.name)))?;
        debug!(shaft = %shaft.name, shaft_power, battery_mass = sized.battery_mass_kg, "electric drive");
        drives.push(ElectricDriveSnapshot {
            shaft: shaft.name.clone(),
            shaft_power_w: shaft_power,
            battery_output_w: sized.battery_output_w,
            battery_heat_w: sized.battery_heat_w,
            energy_j: sized.energy_j,
            battery_efficiency: sized.battery_efficiency,
            motor_mass_kg: sized.motor_mass_kg,
            inverter_mass_kg: sized.inverter_mass_kg,
            battery_mass_kg: sized.battery_mass_kg,
        });
    }
    Ok(drives)
}
