//! Compilation of an engine definition into a solvable cycle.

use std::collections::BTreeMap;

use rc_components::{
    BalanceKind, Battery, Chamber, ComponentError, ComponentResult, ComponentSpec, CoolingChannel,
    ElectricDrive, HeatExchanger, HeatExchangerMode, Merger, Nozzle, NozzleExpansion, PressureDrop,
    Pump, PumpTarget, SplitRule, Splitter, Tank, Turbine, TurbineMode, WallHeatFlux,
};
use rc_core::units::{k, kgps, m2, pa, s, watts};
use rc_core::{CompId, StreamId};
use rc_fluids::{
    CoolPropEngine, CurveFitEquilibrium, EquilibriumEngine, FlowState, PerfectFluidEngine,
    Propellant, PropellantPair, PropertyAdapter, PropertyEngine,
};
use rc_solver::{Closure, CycleBuilder, CycleGraph, SolverConfig, Unknown};
use tracing::debug;

use crate::schema::{
    ClosureDef, ComponentDef, ComponentKindDef, ElectricShaftDef, EngineDef, ExpansionDef,
    HeatExchangerModeDef, PressureDropDef, PropertiesDef, PumpTargetDef, SplitRuleDef,
    TurbineModeDef, UnknownDef, WallDef,
};
use crate::validate::ValidationError;
use crate::{ProjectError, ProjectResult};

/// Property and equilibrium engines selected by a definition.
pub struct Backends {
    properties: Box<dyn PropertyEngine>,
    equilibrium: CurveFitEquilibrium,
}

impl Backends {
    pub fn new(kind: PropertiesDef) -> Self {
        let properties: Box<dyn PropertyEngine> = match kind {
            PropertiesDef::Perfect => Box::new(PerfectFluidEngine::new()),
            PropertiesDef::Coolprop => Box::new(CoolPropEngine::new()),
        };
        Self {
            properties,
            equilibrium: CurveFitEquilibrium::new(),
        }
    }

    pub fn properties(&self) -> &dyn PropertyEngine {
        self.properties.as_ref()
    }

    pub fn equilibrium(&self) -> &dyn EquilibriumEngine {
        &self.equilibrium
    }

    /// Fresh adapter with empty caches.
    pub fn adapter(&self) -> PropertyAdapter<'_> {
        PropertyAdapter::new(self.properties(), self.equilibrium())
    }
}

/// A built cycle with its name tables and solver settings.
#[derive(Debug, Clone)]
pub struct CompiledEngine {
    pub name: String,
    pub cycle: CycleGraph,
    pub config: SolverConfig,
    pub properties: PropertiesDef,
    pub components: BTreeMap<String, CompId>,
    pub streams: BTreeMap<String, StreamId>,
}

impl CompiledEngine {
    pub fn component(&self, id: &str) -> ProjectResult<CompId> {
        self.components.get(id).copied().ok_or_else(|| {
            ValidationError::MissingReference {
                id: id.to_string(),
                context: "components".to_string(),
            }
            .into()
        })
    }
}

fn lookup<T: Copy>(map: &BTreeMap<String, T>, id: &str, context: &str) -> ProjectResult<T> {
    map.get(id).copied().ok_or_else(|| {
        ValidationError::MissingReference {
            id: id.to_string(),
            context: context.to_string(),
        }
        .into()
    })
}

fn pressure_drop(def: PressureDropDef) -> PressureDrop {
    match def {
        PressureDropDef::Absolute { delta_p_pa } => PressureDrop::Absolute(pa(delta_p_pa)),
        PressureDropDef::Fraction { fraction } => PressureDrop::Fraction(fraction),
    }
}

fn build_spec(def: &ComponentDef) -> ProjectResult<ComponentSpec> {
    let component = |source: ComponentError| ProjectError::Component {
        component: def.id.clone(),
        source,
    };

    let spec: ComponentSpec = match &def.kind {
        ComponentKindDef::Tank {
            propellant,
            pressure_pa,
            temperature_k,
            mass_flow_kg_s,
        } => {
            let prop: Propellant = propellant.parse()?;
            let tank = match temperature_k {
                Some(t) => Tank::new(prop, pa(*pressure_pa), k(*t), kgps(*mass_flow_kg_s)),
                None => Tank::at_storage(prop, pa(*pressure_pa), kgps(*mass_flow_kg_s)),
            };
            tank.map_err(component)?.into()
        }
        ComponentKindDef::Pump { efficiency, target } => {
            let target = match *target {
                PumpTargetDef::DischargePressure { pressure_pa } => {
                    PumpTarget::DischargePressure(pa(pressure_pa))
                }
                PumpTargetDef::PressureRatio { ratio } => PumpTarget::PressureRatio(ratio),
            };
            Pump::new(*efficiency, target).map_err(component)?.into()
        }
        ComponentKindDef::Turbine { efficiency, mode } => {
            let mode = match *mode {
                TurbineModeDef::PressureRatio { ratio } => TurbineMode::PressureRatio(ratio),
                TurbineModeDef::OutletPressure { pressure_pa } => {
                    TurbineMode::OutletPressure(pa(pressure_pa))
                }
                TurbineModeDef::MatchDemand {
                    min_outlet_pressure_pa,
                } => TurbineMode::MatchDemand {
                    min_outlet_pressure: pa(min_outlet_pressure_pa),
                },
            };
            Turbine::new(*efficiency, mode).map_err(component)?.into()
        }
        ComponentKindDef::Chamber {
            pair,
            chamber_pressure_pa,
            injector_drop,
            mixture_ratio_target,
            temperature_limit_k,
        } => {
            let pair: PropellantPair = pair.parse()?;
            let mut chamber = Chamber::new(pair, pa(*chamber_pressure_pa)).map_err(component)?;
            if let Some(drop) = injector_drop {
                chamber = chamber.with_injector_drop(*drop).map_err(component)?;
            }
            if let Some(mr) = mixture_ratio_target {
                chamber = chamber.with_mixture_ratio_target(*mr).map_err(component)?;
            }
            if let Some(limit) = temperature_limit_k {
                chamber = chamber.with_temperature_limit(k(*limit)).map_err(component)?;
            }
            chamber.into()
        }
        ComponentKindDef::CoolingChannel {
            heat_load_w,
            pressure_drop: drop,
            max_outlet_temperature_k,
        } => {
            let mut channel =
                CoolingChannel::new(heat_load_w.map(watts), pressure_drop(*drop)).map_err(component)?;
            if let Some(limit) = max_outlet_temperature_k {
                channel = channel.with_max_outlet_temperature(k(*limit)).map_err(component)?;
            }
            channel.into()
        }
        ComponentKindDef::HeatExchanger {
            mode,
            hot_drop,
            cold_drop,
        } => {
            let mode = match *mode {
                HeatExchangerModeDef::Conductance { ua_w_per_k } => {
                    HeatExchangerMode::Conductance(ua_w_per_k)
                }
                HeatExchangerModeDef::ColdOutletTemperature { temperature_k } => {
                    HeatExchangerMode::ColdOutletTemperature(k(temperature_k))
                }
            };
            HeatExchanger::new(mode, pressure_drop(*hot_drop), pressure_drop(*cold_drop))
                .map_err(component)?
                .into()
        }
        ComponentKindDef::Nozzle {
            expansion,
            ambient_pressure_pa,
            quality_factor,
        } => {
            let expansion = match *expansion {
                ExpansionDef::ExitPressure { pressure_pa } => {
                    NozzleExpansion::ExitPressure(pa(pressure_pa))
                }
                ExpansionDef::AreaRatio { ratio } => NozzleExpansion::AreaRatio(ratio),
            };
            let mut nozzle = Nozzle::new(expansion, pa(*ambient_pressure_pa)).map_err(component)?;
            if let Some(q) = quality_factor {
                nozzle = nozzle.with_quality_factor(*q).map_err(component)?;
            }
            nozzle.into()
        }
        ComponentKindDef::Splitter { rule } => {
            let rule = match rule {
                SplitRuleDef::Fractions { fractions } => SplitRule::Fractions(fractions.clone()),
                SplitRuleDef::FixedFlows { mass_flows_kg_s } => {
                    SplitRule::FixedFlows(mass_flows_kg_s.iter().copied().map(kgps).collect())
                }
            };
            Splitter::new(rule).map_err(component)?.into()
        }
        ComponentKindDef::Merger => Merger::new(def.inlets.len()).map_err(component)?.into(),
    };
    Ok(spec)
}

fn wall_flux(def: &WallDef) -> ComponentResult<WallHeatFlux> {
    let mut wall = WallHeatFlux::new(m2(def.cooled_area_m2), k(def.max_wall_temperature_k))?;
    if let Some(ratio) = def.contraction_ratio {
        wall = wall.with_contraction_ratio(ratio)?;
    }
    if def.gas_emissivity.is_some() || def.wall_emissivity.is_some() {
        let (gas, surface) = wall.emissivities();
        wall = wall.with_emissivities(
            def.gas_emissivity.unwrap_or(gas),
            def.wall_emissivity.unwrap_or(surface),
        )?;
    }
    Ok(wall)
}

fn electric_drive(def: &ElectricShaftDef) -> ComponentResult<ElectricDrive> {
    let d = &def.drive;
    let battery = Battery::new(
        d.battery_specific_energy_j_per_kg,
        d.battery_specific_power_w_per_kg,
        d.battery_packing_factor,
        s(def.burn_time_s),
    )?;
    ElectricDrive::new(
        d.motor_efficiency,
        d.motor_specific_power_w_per_kg,
        d.inverter_efficiency,
        d.inverter_specific_power_w_per_kg,
        battery,
    )
}

/// Build the cycle described by `engine`.
///
/// `adapter` evaluates the seed states of loop-closing streams.
pub fn build_cycle(engine: &EngineDef, adapter: &PropertyAdapter<'_>) -> ProjectResult<CompiledEngine> {
    let mut builder = CycleBuilder::new();

    let mut streams = BTreeMap::new();
    for id in &engine.streams {
        streams.insert(id.clone(), builder.add_stream(id));
    }

    let mut components = BTreeMap::new();
    for def in &engine.components {
        let inlets = def
            .inlets
            .iter()
            .map(|s| lookup(&streams, s, "component inlets"))
            .collect::<ProjectResult<Vec<_>>>()?;
        let outlets = def
            .outlets
            .iter()
            .map(|s| lookup(&streams, s, "component outlets"))
            .collect::<ProjectResult<Vec<_>>>()?;
        let id = builder.add_component(&def.id, build_spec(def)?, &inlets, &outlets);
        components.insert(def.id.clone(), id);
    }

    for shaft in &engine.shafts {
        let turbine = lookup(&components, &shaft.turbine, "shaft turbine")?;
        let pumps = shaft
            .pumps
            .iter()
            .map(|p| lookup(&components, p, "shaft pumps"))
            .collect::<ProjectResult<Vec<_>>>()?;
        builder.add_shaft(&shaft.id, &pumps, turbine, shaft.mechanical_efficiency);
    }

    for shaft in &engine.electric_shafts {
        let pumps = shaft
            .pumps
            .iter()
            .map(|p| lookup(&components, p, "shaft pumps"))
            .collect::<ProjectResult<Vec<_>>>()?;
        let drive = electric_drive(shaft).map_err(|source| ProjectError::Component {
            component: shaft.id.clone(),
            source,
        })?;
        builder.add_electric_shaft(&shaft.id, &pumps, drive, shaft.mechanical_efficiency);
    }

    for link in &engine.heat_links {
        let chamber = lookup(&components, &link.chamber, "heat link chamber")?;
        let channel = lookup(&components, &link.channel, "heat link channel")?;
        match (&link.wall, link.fraction) {
            (Some(wall), _) => {
                let wall = wall_flux(wall).map_err(|source| ProjectError::Component {
                    component: link.channel.clone(),
                    source,
                })?;
                builder.add_wall_heat_link(chamber, channel, wall);
            }
            (None, Some(fraction)) => {
                builder.add_heat_link(chamber, channel, fraction);
            }
            (None, None) => {
                return Err(ValidationError::InvalidValue {
                    field: format!("heat link '{}' -> '{}'", link.chamber, link.channel),
                    value: "none".to_string(),
                    reason: "give exactly one of fraction or wall".to_string(),
                }
                .into());
            }
        }
    }

    for seed in &engine.seeds {
        let stream = lookup(&streams, &seed.stream, "seeds")?;
        let state = FlowState::propellant(
            adapter,
            seed.propellant.parse()?,
            kgps(seed.mass_flow_kg_s),
            pa(seed.pressure_pa),
            k(seed.temperature_k),
        )?;
        builder.seed_stream(stream, state);
    }

    for var in &engine.break_variables {
        let target = lookup(&components, var.unknown.component(), "break variable unknown")?;
        let unknown = match var.unknown {
            UnknownDef::TankMassFlow { .. } => Unknown::TankMassFlow(target),
            UnknownDef::PumpDischarge { .. } => Unknown::PumpDischarge(target),
            UnknownDef::TurbinePressureRatio { .. } => Unknown::TurbinePressureRatio(target),
            UnknownDef::SplitterFlow { outlet, .. } => Unknown::SplitterFlow {
                splitter: target,
                outlet,
            },
        };
        let component = lookup(&components, var.closure.component(), "break variable closure")?;
        let kind = match var.closure {
            ClosureDef::ShaftPower { .. } => BalanceKind::ShaftPower,
            ClosureDef::MixtureRatio { .. } => BalanceKind::MixtureRatio,
            ClosureDef::FeedPressure { inlet, .. } => BalanceKind::FeedPressure { inlet },
            ClosureDef::CoolantTemperature { .. } => BalanceKind::CoolantTemperature,
        };

        let mut def = rc_solver::BreakVariableDef::new(
            &var.name,
            unknown,
            Closure::Balance { component, kind },
        );
        if let Some(initial) = var.initial {
            def = def.with_initial(initial);
        }
        if let Some((lo, hi)) = var.bounds {
            def = def.with_bounds(lo, hi);
        }
        if let Some(scale) = var.scale {
            def = def.with_scale(scale);
        }
        builder.add_break_variable(def);
    }

    let cycle = builder.build()?;
    debug!(
        engine = %engine.name,
        components = components.len(),
        unknowns = cycle.break_variables().len(),
        "compiled engine"
    );

    Ok(CompiledEngine {
        name: engine.name.clone(),
        cycle,
        config: engine.solver.into(),
        properties: engine.properties,
        components,
        streams,
    })
}
