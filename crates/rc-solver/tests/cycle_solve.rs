//! End-to-end cycle solves with the analytic property engine.

use rc_components::{
    BalanceKind, Battery, Chamber, CoolingChannel, ElectricDrive, Merger, Nozzle, NozzleExpansion,
    PressureDrop, Pump, PumpTarget, SplitRule, Splitter, Tank, Turbine, TurbineMode, WallHeatFlux,
};
use rc_core::units::constants::R_UNIVERSAL;
use rc_core::units::{Pressure, bar, k, kgps, m2};
use rc_core::{CompId, StreamId};
use rc_fluids::{
    CacheStats, CombustionProducts, Composition, CurveFitEquilibrium, EquilibriumEngine,
    FlowState, FluidResult, PerfectFluidEngine, Propellant, PropellantPair, PropertyAdapter,
    Species,
};
use rc_solver::{
    BreakVariableDef, Closure, CycleBuilder, CycleGraph, CycleSolver, DivergenceReason,
    SolverConfig, SolverError, SolverPhase, SolverState, SweepParameter, Unknown, sweep,
};

/// Fixed products: 3500 K (plus `slope` K per bar above 60 bar), M = 22.5
/// g/mol, γ = 1.22.
struct FixedEquilibrium {
    slope: f64,
}

impl EquilibriumEngine for FixedEquilibrium {
    fn name(&self) -> &str {
        "fixed"
    }

    fn combust(
        &self,
        chamber_pressure: Pressure,
        _mixture_ratio: f64,
        _pair: PropellantPair,
    ) -> FluidResult<CombustionProducts> {
        let gamma = 1.22;
        let molar_mass = 0.0225;
        Ok(CombustionProducts {
            flame_temperature: k(3500.0 + self.slope * (chamber_pressure.value - 60e5) / 1e5),
            molar_mass,
            gamma,
            cp: gamma / (gamma - 1.0) * R_UNIVERSAL / molar_mass,
            composition: Composition::pure(Species::H2O),
        })
    }
}

struct GasGenerator {
    cycle: CycleGraph,
    ox_tank: CompId,
    fuel_tank: CompId,
    turbine: CompId,
    chamber: CompId,
    main_nozzle: CompId,
    exhaust_nozzle: CompId,
}

/// Gas-generator cycle: both pumps on one shaft driven by a fuel-rich
/// generator, main chamber at 60 bar burning MR 2.3. Pump discharges are
/// break variables closed by the main injector feed pressures.
fn gas_generator(quality: Option<f64>, turbine_floor: Pressure) -> GasGenerator {
    let mut b = CycleBuilder::new();
    let ox = b.add_stream("ox");
    let ox_hi = b.add_stream("ox_hi");
    let ox_main = b.add_stream("ox_main");
    let ox_gg = b.add_stream("ox_gg");
    let fuel = b.add_stream("fuel");
    let fuel_hi = b.add_stream("fuel_hi");
    let fuel_main = b.add_stream("fuel_main");
    let fuel_gg = b.add_stream("fuel_gg");
    let gg_gas = b.add_stream("gg_gas");
    let exhaust = b.add_stream("exhaust");
    let gas = b.add_stream("gas");

    let ox_tank = b.add_component(
        "ox_tank",
        Tank::at_storage(Propellant::Lox, bar(2.0), kgps(2.328)).unwrap(),
        &[],
        &[ox],
    );
    let fuel_tank = b.add_component(
        "fuel_tank",
        Tank::at_storage(Propellant::Rp1, bar(2.0), kgps(1.08)).unwrap(),
        &[],
        &[fuel],
    );
    let ox_pump = b.add_component(
        "ox_pump",
        Pump::new(0.7, PumpTarget::DischargePressure(bar(50.0))).unwrap(),
        &[ox],
        &[ox_hi],
    );
    let fuel_pump = b.add_component(
        "fuel_pump",
        Pump::new(0.7, PumpTarget::DischargePressure(bar(50.0))).unwrap(),
        &[fuel],
        &[fuel_hi],
    );
    b.add_component(
        "ox_split",
        Splitter::new(SplitRule::FixedFlows(vec![kgps(0.028)])).unwrap(),
        &[ox_hi],
        &[ox_gg, ox_main],
    );
    b.add_component(
        "fuel_split",
        Splitter::new(SplitRule::FixedFlows(vec![kgps(0.08)])).unwrap(),
        &[fuel_hi],
        &[fuel_gg, fuel_main],
    );
    b.add_component(
        "gas_generator",
        Chamber::new(PropellantPair::LoxRp1, bar(50.0)).unwrap(),
        &[ox_gg, fuel_gg],
        &[gg_gas],
    );
    let turbine = b.add_component(
        "turbine",
        Turbine::new(
            0.6,
            TurbineMode::MatchDemand {
                min_outlet_pressure: turbine_floor,
            },
        )
        .unwrap(),
        &[gg_gas],
        &[exhaust],
    );
    let exhaust_nozzle = b.add_component(
        "exhaust_nozzle",
        Nozzle::new(NozzleExpansion::ExitPressure(bar(1.0)), bar(1.0)).unwrap(),
        &[exhaust],
        &[],
    );
    let chamber = b.add_component(
        "chamber",
        Chamber::new(PropellantPair::LoxRp1, bar(60.0)).unwrap(),
        &[ox_main, fuel_main],
        &[gas],
    );
    let mut nozzle = Nozzle::new(NozzleExpansion::ExitPressure(bar(1.0)), bar(1.0)).unwrap();
    if let Some(q) = quality {
        nozzle = nozzle.with_quality_factor(q).unwrap();
    }
    let main_nozzle = b.add_component("nozzle", nozzle, &[gas], &[]);

    b.add_shaft("turbopump", &[ox_pump, fuel_pump], turbine, 0.95);
    for (name, pump, inlet) in [("ox_discharge", ox_pump, 0), ("fuel_discharge", fuel_pump, 1)] {
        b.add_break_variable(BreakVariableDef::new(
            name,
            Unknown::PumpDischarge(pump),
            Closure::Balance {
                component: chamber,
                kind: BalanceKind::FeedPressure { inlet },
            },
        ));
    }

    GasGenerator {
        cycle: b.build().unwrap(),
        ox_tank,
        fuel_tank,
        turbine,
        chamber,
        main_nozzle,
        exhaust_nozzle,
    }
}

fn main_isp(gg: &GasGenerator, solution: &rc_solver::CycleSolution) -> f64 {
    solution
        .output(gg.main_nozzle)
        .and_then(|o| o.nozzle.as_ref())
        .unwrap()
        .specific_impulse
        .value
}

/// Pressure-fed style feed with pumps but no turbine: tanks at 2 bar,
/// pumps to 70 bar, chamber at 60 bar burning MR 2.3.
fn pumped_feed() -> (CycleGraph, CompId) {
    let mut b = CycleBuilder::new();
    let ox = b.add_stream("ox");
    let ox_hi = b.add_stream("ox_hi");
    let fuel = b.add_stream("fuel");
    let fuel_hi = b.add_stream("fuel_hi");
    let gas = b.add_stream("gas");
    b.add_component(
        "ox_tank",
        Tank::at_storage(Propellant::Lox, bar(2.0), kgps(2.3)).unwrap(),
        &[],
        &[ox],
    );
    b.add_component(
        "fuel_tank",
        Tank::at_storage(Propellant::Rp1, bar(2.0), kgps(1.0)).unwrap(),
        &[],
        &[fuel],
    );
    for (name, inlet, outlet) in [("ox_pump", ox, ox_hi), ("fuel_pump", fuel, fuel_hi)] {
        b.add_component(
            name,
            Pump::new(0.7, PumpTarget::DischargePressure(bar(70.0))).unwrap(),
            &[inlet],
            &[outlet],
        );
    }
    b.add_component(
        "chamber",
        Chamber::new(PropellantPair::LoxRp1, bar(60.0)).unwrap(),
        &[ox_hi, fuel_hi],
        &[gas],
    );
    let nozzle = b.add_component(
        "nozzle",
        Nozzle::new(NozzleExpansion::ExitPressure(bar(1.0)), bar(1.0)).unwrap(),
        &[gas],
        &[],
    );
    (b.build().unwrap(), nozzle)
}

#[test]
fn turbineless_feed_solves_with_both_equilibrium_engines() {
    let (cycle, nozzle) = pumped_feed();
    let props = PerfectFluidEngine::new();
    let stub = FixedEquilibrium { slope: 0.0 };
    let fit = CurveFitEquilibrium::new();
    let engines: [&dyn EquilibriumEngine; 2] = [&stub, &fit];
    for eq in engines {
        let adapter = PropertyAdapter::new(&props, eq);
        let solution = CycleSolver::new(&cycle, SolverConfig::default())
            .solve(&adapter, None)
            .unwrap();
        let report = solution.output(nozzle).and_then(|o| o.nozzle.as_ref()).unwrap();
        let isp = report.specific_impulse.value;
        assert!(isp > 250.0 && isp < 330.0, "{} Isp {isp}", eq.name());
        assert!((report.mass_flow.value - 3.3).abs() < 1e-9);
    }
}

/// Pumped feed whose fuel cools the chamber wall on its way to the
/// injector.
/// With `size_fuel` the fuel tank flow is a break variable closed on the
/// jacket outlet temperature.
fn regenerative_feed(
    wall: WallHeatFlux,
    max_coolant: Option<f64>,
    size_fuel: bool,
) -> (CycleGraph, CompId, CompId) {
    let mut b = CycleBuilder::new();
    let ox = b.add_stream("ox");
    let ox_hi = b.add_stream("ox_hi");
    let fuel = b.add_stream("fuel");
    let fuel_hi = b.add_stream("fuel_hi");
    let fuel_warm = b.add_stream("fuel_warm");
    let gas = b.add_stream("gas");
    b.add_component("ox_tank", Tank::at_storage(Propellant::Lox, bar(2.0), kgps(2.3)).unwrap(), &[], &[ox]);
    let fuel_tank = b.add_component(
        "fuel_tank",
        Tank::at_storage(Propellant::Rp1, bar(2.0), kgps(1.0)).unwrap(),
        &[],
        &[fuel],
    );
    let ox_pump = b.add_component(
        "ox_pump",
        Pump::new(0.7, PumpTarget::DischargePressure(bar(70.0))).unwrap(),
        &[ox],
        &[ox_hi],
    );
    let fuel_pump = b.add_component(
        "fuel_pump",
        Pump::new(0.7, PumpTarget::DischargePressure(bar(75.0))).unwrap(),
        &[fuel],
        &[fuel_hi],
    );
    let mut channel = CoolingChannel::new(None, PressureDrop::Fraction(0.05)).unwrap();
    if let Some(t) = max_coolant {
        channel = channel.with_max_outlet_temperature(k(t)).unwrap();
    }
    let jacket = b.add_component("jacket", channel, &[fuel_hi], &[fuel_warm]);
    let chamber = b.add_component(
        "chamber",
        Chamber::new(PropellantPair::LoxRp1, bar(60.0)).unwrap(),
        &[ox_hi, fuel_warm],
        &[gas],
    );
    b.add_component(
        "nozzle",
        Nozzle::new(NozzleExpansion::ExitPressure(bar(1.0)), bar(1.0)).unwrap(),
        &[gas],
        &[],
    );
    b.add_wall_heat_link(chamber, jacket, wall);
    let drive = ElectricDrive::with_battery(Battery::default()).unwrap();
    b.add_electric_shaft("e_shaft", &[ox_pump, fuel_pump], drive, 0.98);
    if size_fuel {
        b.add_break_variable(BreakVariableDef::new(
            "fuel_flow",
            Unknown::TankMassFlow(fuel_tank),
            Closure::Balance {
                component: jacket,
                kind: BalanceKind::CoolantTemperature,
            },
        ));
    }
    (b.build().unwrap(), chamber, jacket)
}

#[test]
fn wall_flux_sets_the_regenerative_heat_load() {
    let wall = WallHeatFlux::new(m2(0.02), k(850.0)).unwrap();
    let (cycle, chamber, jacket) = regenerative_feed(wall, Some(550.0), false);
    assert_eq!(cycle.electric_shafts().len(), 1);
    assert_eq!(cycle.break_variables().len(), 1);

    let props = PerfectFluidEngine::new();
    let eq = FixedEquilibrium { slope: 0.0 };
    let adapter = PropertyAdapter::new(&props, &eq);
    let solution = CycleSolver::new(&cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap();

    let chamber_out = solution.output(chamber).unwrap();
    let expected = wall
        .evaluate(chamber_out.chamber.as_ref().unwrap(), &chamber_out.outlets[0])
        .unwrap()
        .heat_load;
    let cooling = solution.output(jacket).and_then(|o| o.cooling).unwrap();
    assert!((cooling.heat_load.value - expected.value).abs() < 1e-3 * expected.value);
    // Roughly 200 kW into 1 kg/s of kerosene: about 100 K of heating.
    assert!(cooling.heat_load.value > 5e4 && cooling.heat_load.value < 1e6);
    assert!(cooling.outlet_temperature > k(300.0));
    assert!(cooling.outlet_temperature < k(550.0));
    assert!(cooling.min_coolant_flow.unwrap() < kgps(1.0));
    assert!(solution.output(jacket).unwrap().warnings.is_empty());
}

#[test]
fn coolant_temperature_limit_sizes_fuel_flow() {
    let wall = WallHeatFlux::new(m2(0.02), k(850.0)).unwrap();
    let props = PerfectFluidEngine::new();
    let eq = FixedEquilibrium { slope: 0.0 };
    let adapter = PropertyAdapter::new(&props, &eq);

    // At 1 kg/s the jacket overheats.
    let (cycle, _, jacket) = regenerative_feed(wall, Some(330.0), false);
    let hot = CycleSolver::new(&cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap();
    let hot_out = hot.output(jacket).unwrap();
    assert!(hot_out.residual(BalanceKind::CoolantTemperature).unwrap() > 0.0);
    assert_eq!(hot_out.warnings.len(), 1);

    let (cycle, _, jacket) = regenerative_feed(wall, Some(330.0), true);
    let solution = CycleSolver::new(&cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap();
    let out = solution.output(jacket).unwrap();
    let t = out.cooling.unwrap().outlet_temperature.value;
    assert!((t - 330.0).abs() < 0.1, "coolant outlet {t} K");
    let fuel_flow = solution.state.values[0];
    assert!(fuel_flow > 1.0, "fuel flow {fuel_flow} kg/s");
}

#[test]
fn gas_generator_cycle_with_fixed_products() {
    let gg = gas_generator(Some(1.0), bar(1.5));
    let props = PerfectFluidEngine::new();
    let eq = FixedEquilibrium { slope: 0.0 };
    let adapter = PropertyAdapter::new(&props, &eq);

    let solution = CycleSolver::new(&gg.cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap();
    assert!(solution.max_residual() < 1e-4);
    for value in &solution.state.values {
        assert!((value - bar(69.0).value).abs() < 1e-3 * bar(69.0).value);
    }

    let report = solution.output(gg.chamber).and_then(|o| o.chamber.clone()).unwrap();
    assert!((report.mixture_ratio - 2.3).abs() < 1e-9);

    let isp = main_isp(&gg, &solution);
    assert!(isp > 250.0 && isp < 330.0, "Isp {isp}");
}

#[test]
fn gas_generator_cycle_with_curve_fit() {
    let gg = gas_generator(None, bar(1.5));
    let props = PerfectFluidEngine::new();
    let eq = CurveFitEquilibrium::new();
    let adapter = PropertyAdapter::new(&props, &eq);

    let solution = CycleSolver::new(&gg.cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap();
    let isp = main_isp(&gg, &solution);
    assert!(isp > 250.0 && isp < 330.0, "Isp {isp}");
    assert_eq!(adapter.stats(), CacheStats::default());
}

#[test]
fn turbine_matches_pump_demand() {
    let gg = gas_generator(None, bar(1.5));
    let props = PerfectFluidEngine::new();
    let eq = CurveFitEquilibrium::new();
    let adapter = PropertyAdapter::new(&props, &eq);
    let solution = CycleSolver::new(&gg.cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap();

    let shaft = &gg.cycle.shafts()[0];
    let demand: f64 = shaft
        .pumps
        .iter()
        .map(|(pump, _)| solution.output(*pump).unwrap().shaft_power.value)
        .sum::<f64>()
        / shaft.mechanical_efficiency;
    let delivered = -solution.output(gg.turbine).unwrap().shaft_power.value;
    assert!(demand > 0.0);
    assert!((delivered - demand).abs() < 1e-6 * demand);
}

#[test]
fn mass_is_conserved_through_splits() {
    let gg = gas_generator(None, bar(1.5));
    let props = PerfectFluidEngine::new();
    let eq = CurveFitEquilibrium::new();
    let adapter = PropertyAdapter::new(&props, &eq);
    let solution = CycleSolver::new(&gg.cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap();

    let supplied: f64 = [gg.ox_tank, gg.fuel_tank]
        .iter()
        .map(|t| solution.output(*t).unwrap().outlets[0].mass_flow.value)
        .sum();
    let expelled: f64 = [gg.main_nozzle, gg.exhaust_nozzle]
        .iter()
        .map(|n| solution.output(*n).and_then(|o| o.nozzle.as_ref()).unwrap().mass_flow.value)
        .sum();
    assert!((supplied - expelled).abs() < 1e-9);
    assert!((supplied - 3.408).abs() < 1e-9);
}

#[test]
fn re_solving_from_converged_state_is_immediate() {
    let gg = gas_generator(None, bar(1.5));
    let props = PerfectFluidEngine::new();
    let eq = CurveFitEquilibrium::new();
    let adapter = PropertyAdapter::new(&props, &eq);
    let solver = CycleSolver::new(&gg.cycle, SolverConfig::default());

    let first = solver.solve(&adapter, None).unwrap();
    let second = solver.solve(&adapter, Some(&first.state)).unwrap();
    assert!(second.iterations <= 1);
    assert_eq!(second.state.values, first.state.values);
}

#[test]
fn chamber_temperature_rises_with_pressure() {
    let gg = gas_generator(None, bar(1.5));
    let props = PerfectFluidEngine::new();
    let values: Vec<f64> = [50.0, 60.0, 70.0, 80.0].iter().map(|b| bar(*b).value).collect();

    let stub = FixedEquilibrium { slope: 2.0 };
    let fit = CurveFitEquilibrium::new();
    let engines: [&dyn EquilibriumEngine; 2] = [&stub, &fit];
    for eq in engines {
        let points = sweep(
            &gg.cycle,
            gg.chamber,
            SweepParameter::ChamberPressure,
            &values,
            &props,
            eq,
            SolverConfig::default(),
        )
        .unwrap();
        let temperatures: Vec<f64> = points
            .iter()
            .map(|p| {
                let (_, solution) = p.result.as_ref().unwrap();
                solution
                    .output(gg.chamber)
                    .and_then(|o| o.chamber.as_ref())
                    .unwrap()
                    .flame_temperature
                    .value
            })
            .collect();
        assert!(
            temperatures.windows(2).all(|w| w[1] > w[0]),
            "{} temperatures {temperatures:?}",
            eq.name()
        );
    }
}

#[test]
fn iteration_cap_keeps_last_state() {
    let gg = gas_generator(None, bar(1.5));
    let props = PerfectFluidEngine::new();
    let eq = CurveFitEquilibrium::new();
    let adapter = PropertyAdapter::new(&props, &eq);
    let config = SolverConfig {
        max_iterations: 0,
        ..SolverConfig::default()
    };

    let err = CycleSolver::new(&gg.cycle, config).solve(&adapter, None).unwrap_err();
    assert_eq!(err.phase(), SolverPhase::Diverged);
    let SolverError::Diverged {
        reason,
        iterations,
        last_state,
    } = err
    else {
        panic!("expected divergence");
    };
    assert_eq!(reason, DivergenceReason::IterationCap);
    assert_eq!(iterations, 0);
    assert_eq!(last_state.unwrap().values, gg.cycle.initial_values());
}

#[test]
fn infeasible_turbine_fails_with_component_name() {
    // Expansion stops at 45 bar: too little power for the pumps.
    let gg = gas_generator(None, bar(45.0));
    let props = PerfectFluidEngine::new();
    let eq = FixedEquilibrium { slope: 0.0 };
    let adapter = PropertyAdapter::new(&props, &eq);

    let err = CycleSolver::new(&gg.cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap_err();
    assert_eq!(err.phase(), SolverPhase::Failed);
    assert_eq!(err.component(), Some("turbine"));
    assert!(matches!(
        err,
        SolverError::Component {
            source: rc_components::ComponentError::InfeasiblePressureRatio { .. },
            ..
        }
    ));
    // The start point already fails, so there is no accepted iterate.
    assert!(err.last_state().is_none());
}

#[test]
fn turbine_failure_after_first_step_keeps_last_iterate() {
    // A 35 bar floor covers the pumps at the 50 bar start (about 24 kW) but
    // not at the 69 bar the main injectors need (about 34 kW).
    let gg = gas_generator(None, bar(35.0));
    let props = PerfectFluidEngine::new();
    let eq = FixedEquilibrium { slope: 0.0 };
    let adapter = PropertyAdapter::new(&props, &eq);

    let err = CycleSolver::new(&gg.cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap_err();
    assert_eq!(err.phase(), SolverPhase::Failed);
    assert_eq!(err.component(), Some("turbine"));
    let last = err.last_state().expect("last accepted iterate");
    assert_eq!(last.iteration, 0);
    assert_eq!(last.values, gg.cycle.initial_values());
    assert!(last.residuals.iter().all(|r| r.abs() > 1e-4));
}

struct Recirculation {
    cycle: CycleGraph,
    mixed: StreamId,
    nozzle: CompId,
}

/// Helium recirculation: a fifth of the merged flow returns to the merger.
fn recirculation() -> Recirculation {
    let props = PerfectFluidEngine::new();
    let eq = CurveFitEquilibrium::new();
    let adapter = PropertyAdapter::new(&props, &eq);

    let mut b = CycleBuilder::new();
    let feed = b.add_stream("feed");
    let mixed = b.add_stream("mixed");
    let out = b.add_stream("out");
    let recirc = b.add_stream("recirc");
    b.add_component(
        "he_tank",
        Tank::new(Propellant::Helium, bar(20.0), k(300.0), kgps(1.0)).unwrap(),
        &[],
        &[feed],
    );
    b.add_component("merger", Merger::new(2).unwrap(), &[feed, recirc], &[mixed]);
    b.add_component(
        "splitter",
        Splitter::new(SplitRule::Fractions(vec![0.8, 0.2])).unwrap(),
        &[mixed],
        &[out, recirc],
    );
    let nozzle = b.add_component(
        "nozzle",
        Nozzle::new(NozzleExpansion::ExitPressure(bar(1.0)), bar(1.0)).unwrap(),
        &[out],
        &[],
    );
    let seed =
        FlowState::propellant(&adapter, Propellant::Helium, kgps(0.1), bar(20.0), k(300.0)).unwrap();
    b.seed_stream(recirc, seed);

    Recirculation {
        cycle: b.build().unwrap(),
        mixed,
        nozzle,
    }
}

#[test]
fn recirculation_loop_is_torn_and_closed() {
    let rc = recirculation();
    assert_eq!(rc.cycle.break_variables().len(), 3);
    assert_eq!(rc.cycle.break_variables()[0].name, "recirc.mass_flow");

    let props = PerfectFluidEngine::new();
    let eq = CurveFitEquilibrium::new();
    let adapter = PropertyAdapter::new(&props, &eq);
    let solution = CycleSolver::new(&rc.cycle, SolverConfig::default())
        .solve(&adapter, None)
        .unwrap();

    let mixed = solution.stream(rc.mixed).unwrap();
    assert!((mixed.mass_flow.value - 1.25).abs() < 1e-4);
    assert!((mixed.temperature.value - 300.0).abs() < 1e-3);
    let out = solution.output(rc.nozzle).and_then(|o| o.nozzle.as_ref()).unwrap();
    assert!((out.mass_flow.value - 1.0).abs() < 1e-4);
}

#[test]
fn non_physical_start_is_divergence() {
    let rc = recirculation();
    let props = PerfectFluidEngine::new();
    let eq = CurveFitEquilibrium::new();
    let adapter = PropertyAdapter::new(&props, &eq);

    let mut values = rc.cycle.initial_values();
    values[0] = -1.0;
    let start = SolverState {
        residuals: vec![0.0; values.len()],
        values,
        iteration: 0,
    };
    let err = CycleSolver::new(&rc.cycle, SolverConfig::default())
        .solve(&adapter, Some(&start))
        .unwrap_err();
    assert!(matches!(
        err,
        SolverError::Diverged {
            reason: DivergenceReason::NonPhysicalState,
            last_state: None,
            ..
        }
    ));
}
