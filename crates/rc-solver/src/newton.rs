//! Damped Newton iteration with bounds, step limits and divergence
//! monitoring.

use nalgebra::{DMatrix, DVector};
use rc_core::numeric::max_abs;
use tracing::debug;

use crate::error::{DivergenceReason, SolverError, SolverResult};
use crate::jacobian::forward_difference;
use crate::solver::{SolverConfig, SolverState};

/// Pivot ratio below which the Jacobian counts as singular.
const SINGULAR_PIVOT_RATIO: f64 = 1e-12;

/// Residual evaluation at one iterate.
pub(crate) enum Trial<T> {
    Point { residuals: Vec<f64>, payload: T },
    /// The iterate produced a state outside its physical envelope.
    NonPhysical(String),
}

pub(crate) enum Outcome<T> {
    Converged {
        x: Vec<f64>,
        residuals: Vec<f64>,
        payload: T,
        iterations: usize,
    },
    Diverged {
        reason: DivergenceReason,
        iterations: usize,
        /// Last accepted (values, residuals).
        last: Option<(Vec<f64>, Vec<f64>)>,
    },
}

/// Variable bounds and scales, one entry per unknown.
pub(crate) struct Variables<'a> {
    pub bounds: &'a [(f64, f64)],
    pub scales: &'a [f64],
}

impl Variables<'_> {
    fn contains(&self, x: &[f64]) -> bool {
        x.iter()
            .zip(self.bounds)
            .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }

    /// Largest multiple (≤ 1) of `dx` keeping every component within
    /// `fraction·max(|x|, scale)`.
    fn step_limit(&self, x: &[f64], dx: &[f64], fraction: f64) -> f64 {
        x.iter()
            .zip(dx)
            .zip(self.scales)
            .fold(1.0_f64, |limit, ((xi, di), s)| {
                let allowed = fraction * xi.abs().max(*s);
                if di.abs() > allowed {
                    limit.min(allowed / di.abs())
                } else {
                    limit
                }
            })
    }
}

/// Solve J·dx = −r; `None` when J is singular.
fn newton_step(jac: DMatrix<f64>, r: &[f64]) -> Option<Vec<f64>> {
    let lu = jac.lu();
    let u = lu.u();
    let diag = u.diagonal();
    let largest = diag.iter().fold(0.0_f64, |a, d| a.max(d.abs()));
    let smallest = diag.iter().fold(f64::INFINITY, |a, d| a.min(d.abs()));
    if !(largest > 0.0) || smallest <= SINGULAR_PIVOT_RATIO * largest {
        return None;
    }
    let rhs = DVector::from_iterator(r.len(), r.iter().map(|v| -v));
    let dx = lu.solve(&rhs)?;
    dx.iter()
        .all(|v| v.is_finite())
        .then(|| dx.iter().copied().collect())
}

/// Iterate from `x0` until the residual norm (max-abs) stays below the
/// tolerance for `config.consecutive` evaluations.
///
/// Any error from `eval` aborts the iteration. Past the start point the
/// error carries the last accepted iterate. Non-physical or out-of-bounds
/// line-search trials only reject the step.
pub(crate) fn solve<T, F>(
    x0: Vec<f64>,
    vars: &Variables<'_>,
    config: &SolverConfig,
    mut eval: F,
) -> SolverResult<Outcome<T>>
where
    F: FnMut(&[f64]) -> SolverResult<Trial<T>>,
{
    let (mut r, mut payload) = match eval(&x0)? {
        Trial::Point { residuals, payload } => (residuals, payload),
        Trial::NonPhysical(reason) => {
            debug!(%reason, "start point is non-physical");
            return Ok(Outcome::Diverged {
                reason: DivergenceReason::NonPhysicalState,
                iterations: 0,
                last: None,
            });
        }
    };
    let mut x = x0;
    let mut norm = max_abs(&r);
    let mut iteration = 0;
    let mut below_tolerance = 0;
    let mut growth = 0;

    loop {
        debug!(iteration, residual = norm, "newton iterate");
        if norm < config.tolerance {
            below_tolerance += 1;
            if below_tolerance >= config.consecutive.max(1) {
                return Ok(Outcome::Converged {
                    x,
                    residuals: r,
                    payload,
                    iterations: iteration,
                });
            }
        } else {
            below_tolerance = 0;
        }

        let diverged = |reason, x: Vec<f64>, r: Vec<f64>| {
            Ok(Outcome::Diverged {
                reason,
                iterations: iteration,
                last: Some((x, r)),
            })
        };
        if growth >= config.divergence_window {
            return diverged(DivergenceReason::ResidualGrowth, x, r);
        }
        if iteration >= config.max_iterations {
            return diverged(DivergenceReason::IterationCap, x, r);
        }

        let failed = |e: SolverError, x: &[f64], r: &[f64]| {
            e.with_last_state(SolverState {
                values: x.to_vec(),
                residuals: r.to_vec(),
                iteration,
            })
        };

        let jac = forward_difference(&x, &r, vars.bounds, vars.scales, config.fd_step, |xp| {
            Ok(match eval(xp)? {
                Trial::Point { residuals, .. } => Some(residuals),
                Trial::NonPhysical(_) => None,
            })
        })
        .map_err(|e| failed(e, &x, &r))?;
        let Some(jac) = jac else {
            return diverged(DivergenceReason::NonPhysicalState, x, r);
        };
        let Some(dx) = newton_step(jac, &r) else {
            return diverged(DivergenceReason::SingularJacobian, x, r);
        };

        let mut alpha = vars.step_limit(&x, &dx, config.max_step_fraction);
        let mut accepted = None;
        let mut fallback = None;
        let mut any_in_bounds = false;
        for _ in 0..=config.line_search_iterations {
            let trial: Vec<f64> = x.iter().zip(&dx).map(|(xi, di)| xi + alpha * di).collect();
            if vars.contains(&trial) {
                any_in_bounds = true;
                match eval(&trial).map_err(|e| failed(e, &x, &r))? {
                    Trial::Point { residuals, payload } => {
                        let trial_norm = max_abs(&residuals);
                        if trial_norm < norm {
                            accepted = Some((trial, residuals, payload));
                            break;
                        }
                        if fallback.is_none() {
                            fallback = Some((trial, residuals, payload));
                        }
                    }
                    Trial::NonPhysical(reason) => {
                        debug!(alpha, %reason, "line search rejected non-physical step");
                    }
                }
            }
            alpha *= config.line_search_factor;
        }

        let Some((x_new, r_new, payload_new)) = accepted.or(fallback) else {
            let reason = if any_in_bounds {
                DivergenceReason::NonPhysicalState
            } else {
                DivergenceReason::LeftBounds
            };
            return diverged(reason, x, r);
        };

        let new_norm = max_abs(&r_new);
        if new_norm > norm {
            growth += 1;
        } else {
            growth = 0;
        }
        x = x_new;
        r = r_new;
        payload = payload_new;
        norm = new_norm;
        iteration += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;

    const UNBOUNDED: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);

    fn run<F>(x0: Vec<f64>, bounds: &[(f64, f64)], config: &SolverConfig, f: F) -> Outcome<()>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let scales = vec![1.0; x0.len()];
        let vars = Variables {
            bounds,
            scales: &scales,
        };
        solve(x0, &vars, config, |x| {
            Ok(Trial::Point {
                residuals: f(x),
                payload: (),
            })
        })
        .unwrap()
    }

    fn reason(outcome: &Outcome<()>) -> Option<DivergenceReason> {
        match outcome {
            Outcome::Diverged { reason, .. } => Some(*reason),
            Outcome::Converged { .. } => None,
        }
    }

    #[test]
    fn converges_on_coupled_quadratics() {
        // x^2 + y^2 = 4, x = y
        let config = SolverConfig::default();
        let outcome = run(vec![1.0, 2.0], &[UNBOUNDED; 2], &config, |x| {
            vec![(x[0] * x[0] + x[1] * x[1] - 4.0) / 4.0, x[0] - x[1]]
        });
        let Outcome::Converged { x, iterations, .. } = outcome else {
            panic!("expected convergence");
        };
        assert!((x[0] - 2.0_f64.sqrt()).abs() < 1e-3);
        assert!((x[1] - 2.0_f64.sqrt()).abs() < 1e-3);
        assert!(iterations > 0 && iterations < 20);
    }

    #[test]
    fn already_converged_start_takes_no_iterations() {
        let outcome = run(vec![3.0], &[UNBOUNDED], &SolverConfig::default(), |x| vec![x[0] - 3.0]);
        assert!(matches!(outcome, Outcome::Converged { iterations: 0, .. }));
    }

    #[test]
    fn no_unknowns_converges_immediately() {
        let outcome = run(Vec::new(), &[], &SolverConfig::default(), |_| Vec::new());
        assert!(matches!(outcome, Outcome::Converged { iterations: 0, .. }));
    }

    #[test]
    fn growing_residual_is_divergence() {
        // Plain Newton on atan overshoots further each step from x0 = 2.
        let config = SolverConfig {
            line_search_iterations: 0,
            max_step_fraction: 1e9,
            ..SolverConfig::default()
        };
        let outcome = run(vec![2.0], &[UNBOUNDED], &config, |x| vec![x[0].atan()]);
        assert_eq!(reason(&outcome), Some(DivergenceReason::ResidualGrowth));
        if let Outcome::Diverged { iterations, last, .. } = outcome {
            assert_eq!(iterations, config.divergence_window);
            assert!(last.is_some());
        }
    }

    #[test]
    fn step_outside_bounds_is_divergence() {
        let config = SolverConfig {
            line_search_iterations: 0,
            max_step_fraction: 1e9,
            ..SolverConfig::default()
        };
        let outcome = run(vec![1.0], &[(0.0, 10.0)], &config, |x| vec![x[0] + 5.0]);
        assert_eq!(reason(&outcome), Some(DivergenceReason::LeftBounds));
    }

    #[test]
    fn iteration_cap_is_divergence() {
        let config = SolverConfig {
            max_iterations: 3,
            ..SolverConfig::default()
        };
        let outcome = run(vec![100.0], &[UNBOUNDED], &config, |x| vec![x[0] * x[0] - 4.0]);
        assert_eq!(reason(&outcome), Some(DivergenceReason::IterationCap));
    }

    #[test]
    fn singular_jacobian_is_divergence() {
        // Second unknown never enters the residual.
        let outcome = run(vec![0.0, 0.0], &[UNBOUNDED; 2], &SolverConfig::default(), |x| {
            vec![x[0] - 1.0, 2.0 * (x[0] - 1.0)]
        });
        assert_eq!(reason(&outcome), Some(DivergenceReason::SingularJacobian));
    }

    #[test]
    fn non_physical_start_has_no_last_state() {
        let vars = Variables {
            bounds: &[UNBOUNDED],
            scales: &[1.0],
        };
        let outcome = solve(vec![-1.0], &vars, &SolverConfig::default(), |_| {
            Ok(Trial::<()>::NonPhysical("negative flow".into()))
        })
        .unwrap();
        assert!(matches!(
            outcome,
            Outcome::Diverged {
                reason: DivergenceReason::NonPhysicalState,
                iterations: 0,
                last: None
            }
        ));
    }

    #[test]
    fn line_search_errors_end_the_solve() {
        // The full Newton step from -1 lands beyond 3, where evaluation fails;
        // a shorter step would converge.
        let vars = Variables {
            bounds: &[UNBOUNDED],
            scales: &[1.0],
        };
        let config = SolverConfig {
            max_step_fraction: 1e9,
            ..SolverConfig::default()
        };
        let result = solve(vec![-1.0], &vars, &config, |x| {
            if x[0] > 3.0 {
                return Err(SolverError::Numeric {
                    what: "outside the table".into(),
                });
            }
            Ok(Trial::Point {
                residuals: vec![(x[0] - 1.0).atan()],
                payload: (),
            })
        });
        let err = match result {
            Err(e) => e,
            Ok(_) => panic!("expected the evaluation error"),
        };
        assert!(matches!(err, SolverError::Numeric { .. }));
    }

    #[test]
    fn component_failure_keeps_last_iterate() {
        let vars = Variables {
            bounds: &[UNBOUNDED],
            scales: &[1.0],
        };
        let config = SolverConfig {
            max_step_fraction: 1e9,
            ..SolverConfig::default()
        };
        let result = solve(vec![-1.0], &vars, &config, |x| {
            if x[0] > 3.0 {
                return Err(SolverError::Component {
                    component: "turbine".into(),
                    source: rc_components::ComponentError::InvalidArg { what: "ratio" },
                    last_state: None,
                });
            }
            Ok(Trial::Point {
                residuals: vec![(x[0] - 1.0).atan()],
                payload: (),
            })
        });
        let Err(err) = result else {
            panic!("expected a component failure");
        };
        let state = err.last_state().expect("last iterate");
        assert_eq!(state.values, vec![-1.0]);
        assert_eq!(state.iteration, 0);
        assert!((state.residuals[0] - (-2.0_f64).atan()).abs() < 1e-12);
    }

    #[test]
    fn start_point_errors_propagate() {
        let vars = Variables {
            bounds: &[UNBOUNDED],
            scales: &[1.0],
        };
        let result = solve(vec![1.0], &vars, &SolverConfig::default(), |_| {
            Err::<Trial<()>, _>(SolverError::Numeric { what: "boom".into() })
        });
        assert!(matches!(result, Err(SolverError::Numeric { .. })));
    }
}
