use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rc_perf::{CycleResult, MassBudget, PerfError};
use rc_project::{
    Backends, BudgetDef, CompiledEngine, EngineDef, ProjectError, build_cycle, load_yaml,
};
use rc_solver::{CycleSolver, SolverError, SweepParameter, linspace, sweep};
use tracing::info;

#[derive(Parser)]
#[command(name = "rc-cli")]
#[command(about = "Rocket engine cycle solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an engine file and build its cycle without solving
    Validate {
        /// Path to the engine YAML file
        engine_path: PathBuf,
    },
    /// Solve the cycle and print its performance
    Run {
        /// Path to the engine YAML file
        engine_path: PathBuf,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Solve the cycle over a range of one component parameter
    Sweep {
        /// Path to the engine YAML file
        engine_path: PathBuf,
        /// Component ID to vary
        #[arg(long)]
        component: String,
        /// Parameter to vary
        #[arg(long, value_enum)]
        parameter: ParameterArg,
        /// First value (SI units)
        #[arg(long)]
        from: f64,
        /// Last value (SI units)
        #[arg(long)]
        to: f64,
        /// Number of points, end points included
        #[arg(long, default_value_t = 5)]
        steps: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ParameterArg {
    /// Chamber pressure [Pa]
    ChamberPressure,
    /// Tank mass flow [kg/s]
    MassFlow,
}

impl From<ParameterArg> for SweepParameter {
    fn from(arg: ParameterArg) -> Self {
        match arg {
            ParameterArg::ChamberPressure => SweepParameter::ChamberPressure,
            ParameterArg::MassFlow => SweepParameter::MassFlow,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Perf(#[from] PerfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Validate { engine_path } => cmd_validate(&engine_path),
        Commands::Run { engine_path, json } => cmd_run(&engine_path, json),
        Commands::Sweep {
            engine_path,
            component,
            parameter,
            from,
            to,
            steps,
        } => cmd_sweep(&engine_path, &component, parameter.into(), from, to, steps),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if let CliError::Solver(solver) = &e {
                eprintln!("  phase: {}", solver.phase());
                if let Some(component) = solver.component() {
                    eprintln!("  failing component: {component}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn load(engine_path: &Path) -> CliResult<(EngineDef, Backends)> {
    let engine = load_yaml(engine_path)?;
    let backends = Backends::new(engine.properties);
    Ok((engine, backends))
}

fn cmd_validate(engine_path: &Path) -> CliResult<()> {
    println!("Validating engine: {}", engine_path.display());
    let (engine, backends) = load(engine_path)?;
    let compiled = build_cycle(&engine, &backends.adapter())?;

    println!("✓ Engine '{}' is valid", compiled.name);
    println!("  Properties: {:?}", compiled.properties);
    println!("  Streams: {}", compiled.streams.len());
    println!("  Components: {}", compiled.components.len());
    println!("  Shafts: {}", compiled.cycle.shafts().len());
    if !compiled.cycle.electric_shafts().is_empty() {
        println!("  Electric shafts: {}", compiled.cycle.electric_shafts().len());
    }
    println!("  Unknowns: {}", compiled.cycle.break_variables().len());
    for var in compiled.cycle.break_variables() {
        println!("    {}", var.name);
    }
    Ok(())
}

fn cmd_run(engine_path: &Path, json: bool) -> CliResult<()> {
    let (engine, backends) = load(engine_path)?;
    let adapter = backends.adapter();
    let compiled = build_cycle(&engine, &adapter)?;

    let solution = CycleSolver::new(&compiled.cycle, compiled.config).solve(&adapter, None)?;
    let result = rc_perf::evaluate(&compiled.cycle, solution)?;
    info!(engine = %compiled.name, iterations = result.solution.iterations, "cycle solved");

    if json {
        let report = result.report(&compiled.cycle);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&compiled, &result);
        if let Some(budget) = &engine.budget {
            print_budget(budget, &result)?;
        }
    }
    Ok(())
}

fn print_budget(def: &BudgetDef, result: &CycleResult) -> CliResult<()> {
    let mut budget = MassBudget::new(def.burn_time_s, def.dry_mass_kg)?;
    if let Some(margin) = def.propellant_margin {
        budget = budget.with_propellant_margin(margin)?;
    }
    let report = budget.evaluate(&result.performance)?;
    println!();
    println!("  Propellant mass: {:>12.1} kg", report.propellant_mass_kg);
    println!("  Burnout mass:    {:>12.1} kg", report.final_mass_kg);
    println!("  Ideal Δv:        {:>12.1} m/s", report.ideal_delta_v_m_s);
    if let Some(dv) = def.target_delta_v_m_s {
        match report.payload_for_delta_v(dv) {
            Some(payload) => println!("  Payload at Δv:   {:>12.1} kg", payload),
            None => println!("  Payload at Δv:   {:>12} (Δv {dv:.0} m/s out of reach)", "-"),
        }
    }
    Ok(())
}

fn print_summary(compiled: &CompiledEngine, result: &CycleResult) {
    let perf = &result.performance;
    println!("✓ Converged '{}' in {} iterations", compiled.name, result.solution.iterations);
    println!("  Thrust:          {:>12.1} N", perf.thrust_n);
    println!("  Isp:             {:>12.1} s", perf.isp_s);
    println!("  Tank flow:       {:>12.4} kg/s", perf.tank_mdot_kg_s);
    if let Some(mr) = perf.mixture_ratio {
        println!("  Mixture ratio:   {:>12.3}", mr);
    }
    if perf.pump_power_w > 0.0 {
        println!("  Pump power:      {:>12.1} kW", perf.pump_power_w / 1e3);
        println!("  Turbine power:   {:>12.1} kW", perf.turbine_power_w / 1e3);
    }

    if !perf.chambers.is_empty() {
        println!();
        println!("  {:<16} {:>10} {:>8} {:>9} {:>12}", "chamber", "pc [bar]", "MR", "T [K]", "margin [bar]");
        for c in &perf.chambers {
            let margin = c.feed_margins_pa.iter().copied().reduce(f64::min).unwrap_or(0.0);
            println!(
                "  {:<16} {:>10.2} {:>8.3} {:>9.1} {:>12.2}",
                c.component,
                c.pc_pa / 1e5,
                c.mixture_ratio,
                c.t_k,
                margin / 1e5
            );
        }
    }

    if !perf.cooling.is_empty() {
        println!();
        println!("  {:<16} {:>10} {:>9} {:>12}", "cooling", "Q [kW]", "T [K]", "min mdot");
        for c in &perf.cooling {
            let min_flow = c
                .min_coolant_mdot_kg_s
                .map_or_else(|| "-".to_string(), |m| format!("{m:.4}"));
            println!(
                "  {:<16} {:>10.1} {:>9.1} {:>12}",
                c.component,
                c.heat_load_w / 1e3,
                c.outlet_t_k,
                min_flow
            );
        }
        for w in &perf.walls {
            println!(
                "  {} wall: {:.2} MW/m² chamber, {:.2} MW/m² throat",
                w.chamber,
                (w.convective_flux_w_m2 + w.radiative_flux_w_m2) / 1e6,
                w.throat_flux_w_m2 / 1e6
            );
        }
    }

    for d in &perf.electric_drives {
        println!();
        println!("  Electric drive '{}'", d.shaft);
        println!("    Shaft power:   {:>12.1} kW", d.shaft_power_w / 1e3);
        println!("    Battery out:   {:>12.1} kW", d.battery_output_w / 1e3);
        println!("    Drive mass:    {:>12.1} kg", d.mass_kg());
    }

    if !perf.nozzles.is_empty() {
        println!();
        println!("  {:<16} {:>12} {:>9} {:>10} {:>8}", "nozzle", "thrust [N]", "Isp [s]", "mdot", "eps");
        for n in &perf.nozzles {
            println!(
                "  {:<16} {:>12.1} {:>9.1} {:>10.4} {:>8.2}",
                n.component, n.thrust_n, n.isp_s, n.mdot_kg_s, n.area_ratio
            );
        }
    }
}

fn cmd_sweep(
    engine_path: &Path,
    component: &str,
    parameter: SweepParameter,
    from: f64,
    to: f64,
    steps: usize,
) -> CliResult<()> {
    let (engine, backends) = load(engine_path)?;
    let compiled = build_cycle(&engine, &backends.adapter())?;
    let target = compiled.component(component)?;

    println!(
        "Sweeping {} of '{}' from {} to {} ({} points)",
        parameter.name(),
        component,
        from,
        to,
        steps
    );
    let values = linspace(from, to, steps);
    let points = sweep(
        &compiled.cycle,
        target,
        parameter,
        &values,
        backends.properties(),
        backends.equilibrium(),
        compiled.config,
    )?;

    println!("  {:>14} {:>10} {:>12} {:>9} {:>6}", "value", "phase", "thrust [N]", "Isp [s]", "iters");
    let mut failures = 0usize;
    for point in points {
        let evaluated = point
            .result
            .map_err(CliError::from)
            .and_then(|(cycle, solution)| Ok(rc_perf::evaluate(&cycle, solution)?));
        match evaluated {
            Ok(result) => println!(
                "  {:>14.6e} {:>10} {:>12.1} {:>9.1} {:>6}",
                point.value,
                "converged",
                result.performance.thrust_n,
                result.performance.isp_s,
                result.solution.iterations
            ),
            Err(e) => {
                failures += 1;
                let phase = match &e {
                    CliError::Solver(s) => s.phase().to_string(),
                    _ => "invalid".to_string(),
                };
                println!("  {:>14.6e} {:>10}  {}", point.value, phase, e);
            }
        }
    }

    if failures > 0 {
        println!("{failures} of {} points did not converge", values.len());
    }
    Ok(())
}
