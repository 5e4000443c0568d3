use std::path::PathBuf;

use rc_core::units::bar;
use rc_project::{
    Backends, EngineDef, ProjectError, build_cycle, from_yaml_str, load_yaml, save_yaml,
};
use rc_solver::CycleSolver;

fn projects_dir() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("projects")
}

fn load(name: &str) -> EngineDef {
    let path = projects_dir().join(name);
    load_yaml(&path).unwrap_or_else(|e| panic!("failed to load {}: {e}", path.display()))
}

fn solve(engine: &EngineDef) -> rc_perf::CycleResult {
    let backends = Backends::new(engine.properties);
    let adapter = backends.adapter();
    let compiled = build_cycle(engine, &adapter).unwrap();
    let solution = CycleSolver::new(&compiled.cycle, compiled.config)
        .solve(&adapter, None)
        .unwrap();
    rc_perf::evaluate(&compiled.cycle, solution).unwrap()
}

#[test]
fn projects_load_and_validate() {
    for name in [
        "01_pressure_fed.yaml",
        "02_gas_generator.yaml",
        "03_regen_gas_generator.yaml",
        "04_electric_pump_fed.yaml",
    ] {
        load(name);
    }
}

#[test]
fn saved_engine_loads_back_unchanged() {
    let engine = load("03_regen_gas_generator.yaml");
    let path = std::env::temp_dir().join(format!("rc_project_{}.yaml", std::process::id()));
    save_yaml(&path, &engine).unwrap();
    let reloaded = load_yaml(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(reloaded, engine);
}

#[test]
fn pressure_fed_engine_solves_without_unknowns() {
    let result = solve(&load("01_pressure_fed.yaml"));
    assert_eq!(result.solution.iterations, 0);
    assert!((result.performance.mixture_ratio.unwrap() - 2.3).abs() < 1e-9);
    let isp = result.performance.isp_s;
    assert!(isp > 250.0 && isp < 330.0, "Isp {isp}");
}

#[test]
fn gas_generator_engine_balances_feed_pressures() {
    let engine = load("02_gas_generator.yaml");
    let result = solve(&engine);
    for value in &result.solution.state.values {
        assert!((value - bar(69.0).value).abs() < 1e-3 * bar(69.0).value);
    }

    let perf = &result.performance;
    assert!((perf.tank_mdot_kg_s - 3.408).abs() < 1e-9);
    let main = perf.nozzles.iter().find(|n| n.component == "nozzle").unwrap();
    assert!(main.isp_s > 250.0 && main.isp_s < 330.0, "Isp {}", main.isp_s);
    assert!(perf.isp_s < main.isp_s);
    assert!((perf.pump_power_w - 0.95 * perf.turbine_power_w).abs() < 1e-6 * perf.pump_power_w);
}

#[test]
fn regenerative_jacket_heats_fuel() {
    let engine = load("03_regen_gas_generator.yaml");
    let backends = Backends::new(engine.properties);
    let adapter = backends.adapter();
    let compiled = build_cycle(&engine, &adapter).unwrap();
    assert!(
        compiled
            .cycle
            .break_variables()
            .iter()
            .any(|v| v.name == "chamber->jacket")
    );

    let solution = CycleSolver::new(&compiled.cycle, compiled.config)
        .solve(&adapter, None)
        .unwrap();
    let t_in = solution.stream(compiled.streams["fuel_main"]).unwrap().temperature;
    let t_out = solution.stream(compiled.streams["fuel_cooled"]).unwrap().temperature;
    assert!(t_out > t_in);

    // The pump overcomes the jacket loss on top of the injector drop.
    let fuel_pump = compiled.component("fuel_pump").unwrap();
    let discharge = solution.output(fuel_pump).unwrap().outlets[0].pressure.value;
    assert!((discharge - bar(69.0).value / 0.95).abs() < 1e-3 * discharge);
}

#[test]
fn electric_engine_sizes_its_drive_and_jacket() {
    let engine = load("04_electric_pump_fed.yaml");
    let result = solve(&engine);
    let perf = &result.performance;

    assert_eq!(perf.turbine_power_w, 0.0);
    assert_eq!(perf.electric_drives.len(), 1);
    assert!(perf.electric_drives[0].battery_mass_kg > 0.0);
    assert_eq!(perf.walls.len(), 1);
    let jacket = &perf.cooling[0];
    assert!((jacket.heat_load_w - perf.walls[0].heat_load_w).abs() < 1e-3 * jacket.heat_load_w);
    assert!(jacket.outlet_t_k < 550.0);

    let def = engine.budget.unwrap();
    let budget = rc_perf::MassBudget::new(def.burn_time_s, def.dry_mass_kg)
        .unwrap()
        .with_propellant_margin(def.propellant_margin.unwrap())
        .unwrap()
        .evaluate(perf)
        .unwrap();
    assert!(budget.final_mass_kg > def.dry_mass_kg);
    assert!(budget.ideal_delta_v_m_s > 0.0);
}

#[test]
fn wall_and_fraction_cannot_both_drive_a_heat_link() {
    let mut engine = load("04_electric_pump_fed.yaml");
    engine.heat_links[0].fraction = Some(0.01);
    assert!(matches!(
        rc_project::validate_engine(&engine),
        Err(rc_project::ValidationError::InvalidValue { .. })
    ));
    engine.heat_links[0].fraction = None;
    engine.heat_links[0].wall = None;
    assert!(rc_project::validate_engine(&engine).is_err());
}

#[test]
fn unknown_propellant_is_a_fluid_error() {
    let yaml = r#"
version: 1
name: Bad tank
streams: [s]
components:
  - id: tank
    kind:
      type: Tank
      propellant: hydrazine
      pressure_pa: 1.0e6
      mass_flow_kg_s: 1.0
    outlets: [s]
"#;
    let engine = from_yaml_str(yaml).unwrap();
    let backends = Backends::new(engine.properties);
    let err = build_cycle(&engine, &backends.adapter()).unwrap_err();
    assert!(matches!(err, ProjectError::Fluid(_)));
}

#[test]
fn component_errors_carry_the_component_id() {
    let yaml = r#"
version: 1
name: Bad pump
streams: [a, b]
components:
  - id: tank
    kind:
      type: Tank
      propellant: LOX
      pressure_pa: 2.0e5
      mass_flow_kg_s: 1.0
    outlets: [a]
  - id: pump
    kind:
      type: Pump
      efficiency: 1.5
      target:
        type: PressureRatio
        ratio: 10.0
    inlets: [a]
    outlets: [b]
"#;
    let engine = from_yaml_str(yaml).unwrap();
    let backends = Backends::new(engine.properties);
    let err = build_cycle(&engine, &backends.adapter()).unwrap_err();
    assert!(matches!(err, ProjectError::Component { component, .. } if component == "pump"));
}

#[test]
fn dangling_stream_fails_graph_validation() {
    let yaml = r#"
version: 1
name: Dangling
streams: [a]
components:
  - id: tank
    kind:
      type: Tank
      propellant: He
      pressure_pa: 2.0e6
      temperature_k: 300.0
      mass_flow_kg_s: 1.0
    outlets: [a]
"#;
    let engine = from_yaml_str(yaml).unwrap();
    let backends = Backends::new(engine.properties);
    let err = build_cycle(&engine, &backends.adapter()).unwrap_err();
    assert!(matches!(err, ProjectError::Solver(_)), "{err}");
}
