//! Cycle solver state machine.

use std::fmt;

use rc_components::ComponentOutput;
use rc_core::numeric::max_abs;
use rc_core::{CompId, StreamId};
use rc_fluids::{FlowState, PropertyAdapter};
use tracing::{debug, info, warn};

use crate::cycle::{Closure, CycleGraph};
use crate::error::{SolverError, SolverResult};
use crate::evaluate::{Pass, forward_pass};
use crate::newton::{self, Outcome, Trial, Variables};

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Convergence threshold on max |residual|.
    pub tolerance: f64,
    /// Evaluations in a row that must meet the tolerance.
    pub consecutive: usize,
    /// Consecutive residual increases that count as divergence.
    pub divergence_window: usize,
    pub max_iterations: usize,
    /// Relative forward-difference step.
    pub fd_step: f64,
    /// Largest Newton step per variable, as a fraction of max(|x|, scale).
    pub max_step_fraction: f64,
    /// Backtracking factor
    pub line_search_factor: f64,
    /// Maximum backtracking steps
    pub line_search_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            consecutive: 1,
            divergence_window: 4,
            max_iterations: 50,
            fd_step: 1e-6,
            max_step_fraction: 0.5,
            line_search_factor: 0.5,
            line_search_iterations: 20,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> SolverResult<()> {
        let ok = self.tolerance > 0.0
            && self.fd_step > 0.0
            && self.max_step_fraction > 0.0
            && self.line_search_factor > 0.0
            && self.line_search_factor < 1.0
            && self.divergence_window > 0;
        if ok {
            Ok(())
        } else {
            Err(SolverError::setup(
                "solver tolerance, step sizes and divergence window must be positive (line-search factor below 1)",
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverPhase {
    Initialized,
    Iterating,
    Converged,
    Diverged,
    Failed,
}

impl fmt::Display for SolverPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverPhase::Initialized => "initialized",
            SolverPhase::Iterating => "iterating",
            SolverPhase::Converged => "converged",
            SolverPhase::Diverged => "diverged",
            SolverPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Break-variable values with their residuals.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverState {
    pub values: Vec<f64>,
    pub residuals: Vec<f64>,
    pub iteration: usize,
}

/// Converged cycle.
#[derive(Debug, Clone)]
pub struct CycleSolution {
    pub state: SolverState,
    /// Indexed by stream id.
    pub streams: Vec<FlowState>,
    /// Indexed by component id.
    pub outputs: Vec<ComponentOutput>,
    pub iterations: usize,
}

impl CycleSolution {
    pub fn stream(&self, id: StreamId) -> Option<&FlowState> {
        self.streams.get(id.slot())
    }

    pub fn output(&self, id: CompId) -> Option<&ComponentOutput> {
        self.outputs.get(id.slot())
    }

    pub fn max_residual(&self) -> f64 {
        max_abs(&self.state.residuals)
    }
}

/// Damped Newton solver over a cycle's break variables.
///
/// Each solve runs inside [`PropertyAdapter::begin_solve`], so caches never
/// outlive one solve.
pub struct CycleSolver<'c> {
    cycle: &'c CycleGraph,
    config: SolverConfig,
}

impl<'c> CycleSolver<'c> {
    pub fn new(cycle: &'c CycleGraph, config: SolverConfig) -> Self {
        Self { cycle, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve from `initial`, or from the break-variable defaults.
    pub fn solve(
        &self,
        adapter: &PropertyAdapter<'_>,
        initial: Option<&SolverState>,
    ) -> SolverResult<CycleSolution> {
        let _scope = adapter.begin_solve();
        let result = self.run(adapter, initial);
        match &result {
            Ok(solution) => info!(
                phase = %SolverPhase::Converged,
                iterations = solution.iterations,
                residual = solution.max_residual(),
                "cycle converged"
            ),
            Err(SolverError::Diverged {
                reason, iterations, ..
            }) => warn!(
                phase = %SolverPhase::Diverged,
                %reason,
                iterations,
                "cycle diverged"
            ),
            Err(e) => warn!(phase = %SolverPhase::Failed, error = %e, "cycle solve failed"),
        }
        let stats = adapter.stats();
        debug!(
            property_hits = stats.property_hits,
            property_misses = stats.property_misses,
            combustion_hits = stats.combustion_hits,
            combustion_misses = stats.combustion_misses,
            "property cache"
        );
        result
    }

    fn run(
        &self,
        adapter: &PropertyAdapter<'_>,
        initial: Option<&SolverState>,
    ) -> SolverResult<CycleSolution> {
        self.config.validate()?;
        let vars = self.cycle.break_variables();
        debug!(
            phase = %SolverPhase::Initialized,
            unknowns = vars.len(),
            "cycle solve"
        );

        let x0 = match initial {
            Some(state) if state.values.len() != vars.len() => {
                return Err(SolverError::setup(format!(
                    "initial state has {} values for {} break variables",
                    state.values.len(),
                    vars.len()
                )));
            }
            Some(state) => state.values.clone(),
            None => self.default_values(adapter)?,
        };

        let bounds: Vec<(f64, f64)> = vars.iter().map(|v| v.bounds).collect();
        let scales: Vec<f64> = vars.iter().map(|v| v.scale).collect();
        let variables = Variables {
            bounds: &bounds,
            scales: &scales,
        };

        debug!(phase = %SolverPhase::Iterating, "cycle solve");
        let outcome = newton::solve(x0, &variables, &self.config, |x| {
            Ok(match forward_pass(self.cycle, adapter, x)? {
                Pass::Complete(pass) => Trial::Point {
                    residuals: pass.residuals.clone(),
                    payload: pass,
                },
                Pass::NonPhysical { stream, reason } => {
                    Trial::NonPhysical(format!("stream '{stream}': {reason}"))
                }
            })
        })?;

        match outcome {
            Outcome::Converged {
                x,
                residuals,
                payload,
                iterations,
            } => {
                for (id, output) in payload.outputs.iter().enumerate() {
                    for warning in &output.warnings {
                        let component = self.cycle.component_name(CompId::from_index(id as u32));
                        warn!(component, "{warning}");
                    }
                }
                let pass = *payload;
                Ok(CycleSolution {
                    state: SolverState {
                        values: x,
                        residuals,
                        iteration: iterations,
                    },
                    streams: pass.streams,
                    outputs: pass.outputs,
                    iterations,
                })
            }
            Outcome::Diverged {
                reason,
                iterations,
                last,
            } => Err(SolverError::Diverged {
                reason,
                iterations,
                last_state: last.map(|(values, residuals)| {
                    Box::new(SolverState {
                        values,
                        residuals,
                        iteration: iterations,
                    })
                }),
            }),
        }
    }

    /// Break-variable defaults, with torn edges warmed by one substitution
    /// pass.
    fn default_values(&self, adapter: &PropertyAdapter<'_>) -> SolverResult<Vec<f64>> {
        let mut values = self.cycle.initial_values();
        let torn = self
            .cycle
            .break_variables()
            .iter()
            .any(|v| !matches!(v.closure, Closure::Balance { .. }));
        if !torn {
            return Ok(values);
        }

        let Pass::Complete(pass) = forward_pass(self.cycle, adapter, &values)? else {
            return Ok(values);
        };
        for (value, var) in values.iter_mut().zip(self.cycle.break_variables()) {
            let computed = match var.closure {
                Closure::Balance { .. } => continue,
                Closure::Link(link) => pass.link_values.get(link.slot()).copied(),
                Closure::Stream { stream, quantity } => {
                    pass.streams.get(stream.slot()).map(|s| quantity.of(s))
                }
            };
            if let Some(v) = computed
                && v.is_finite()
            {
                *value = v.clamp(var.bounds.0, var.bounds.1);
            }
        }
        debug!(?values, "warmed torn-edge guesses");
        Ok(values)
    }
}
