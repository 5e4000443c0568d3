//! Error types for cycle solving.

use std::fmt;

use rc_components::ComponentError;
use rc_core::error::RcError;
use rc_fluids::FluidError;
use rc_graph::GraphError;
use thiserror::Error;

use crate::solver::{SolverPhase, SolverState};

/// Why an iteration was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceReason {
    /// Residual norm grew for the configured number of consecutive iterations.
    ResidualGrowth,
    /// No step along the Newton direction stays inside the variable bounds.
    LeftBounds,
    /// The iterate produced a stream outside its physical envelope.
    NonPhysicalState,
    SingularJacobian,
    IterationCap,
}

impl fmt::Display for DivergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DivergenceReason::ResidualGrowth => "residual kept growing",
            DivergenceReason::LeftBounds => "iterate left the variable bounds",
            DivergenceReason::NonPhysicalState => "non-physical stream state",
            DivergenceReason::SingularJacobian => "singular Jacobian",
            DivergenceReason::IterationCap => "iteration cap reached",
        };
        f.write_str(text)
    }
}

/// Errors that can occur while assembling or solving a cycle.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Component '{component}' failed: {source}")]
    Component {
        component: String,
        #[source]
        source: ComponentError,
        /// Last accepted iterate before the failure; `None` at the start point.
        last_state: Option<Box<SolverState>>,
    },

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Diverged after {iterations} iterations: {reason}")]
    Diverged {
        reason: DivergenceReason,
        iterations: usize,
        /// Last accepted iterate, if the start point was usable.
        last_state: Option<Box<SolverState>>,
    },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    /// Terminal phase of the solve that produced this error.
    pub fn phase(&self) -> SolverPhase {
        match self {
            SolverError::Diverged { .. } => SolverPhase::Diverged,
            _ => SolverPhase::Failed,
        }
    }

    /// Name of the failing component, for component failures.
    pub fn component(&self) -> Option<&str> {
        match self {
            SolverError::Component { component, .. } => Some(component),
            _ => None,
        }
    }

    /// Last accepted iterate carried by divergence and component failures.
    pub fn last_state(&self) -> Option<&SolverState> {
        match self {
            SolverError::Component { last_state, .. } | SolverError::Diverged { last_state, .. } => {
                last_state.as_deref()
            }
            _ => None,
        }
    }

    pub(crate) fn with_last_state(mut self, state: SolverState) -> Self {
        if let SolverError::Component { last_state, .. } = &mut self {
            *last_state = Some(Box::new(state));
        }
        self
    }

    pub(crate) fn setup(what: impl Into<String>) -> Self {
        SolverError::ProblemSetup { what: what.into() }
    }
}

impl From<SolverError> for RcError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { .. } => RcError::InvalidArg {
                what: "problem setup",
            },
            SolverError::Component { source, .. } => source.into(),
            SolverError::Fluid(e) => e.into(),
            SolverError::Graph(e) => e.into(),
            other => RcError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
