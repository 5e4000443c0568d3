//! Error types for component evaluation.

use rc_core::RcError;
use rc_fluids::FluidError;
use thiserror::Error;

/// Errors that can occur during component calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Operating point cannot be reached with the given inlets.
    #[error("Infeasible: {what}")]
    Infeasible { what: String },

    /// No turbine outlet pressure delivers the shaft demand.
    #[error(
        "turbine cannot deliver {demand_w:.1} W; at most {available_w:.1} W down to {min_outlet_pressure:.0} Pa"
    )]
    InfeasiblePressureRatio {
        demand_w: f64,
        available_w: f64,
        min_outlet_pressure: f64,
    },

    /// Summerfield criterion violated: the exit flow would separate.
    #[error("flow separation: exit pressure {exit_pressure:.0} Pa below 0.35 x ambient {ambient:.0} Pa")]
    FlowSeparation { exit_pressure: f64, ambient: f64 },

    #[error(transparent)]
    Fluid(#[from] FluidError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<ComponentError> for RcError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::InvalidArg { what } => RcError::InvalidArg { what },
            other => RcError::Invariant {
                what: format!("component: {other}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComponentError::NonPhysical { what: "density" };
        assert!(err.to_string().contains("density"));

        let err = ComponentError::InfeasiblePressureRatio {
            demand_w: 2.0e6,
            available_w: 1.5e6,
            min_outlet_pressure: 1.0e5,
        };
        assert!(err.to_string().contains("2000000.0"));
    }

    #[test]
    fn fluid_errors_stay_typed() {
        let err: ComponentError = FluidError::ConvergenceFailed {
            what: "equilibrium".into(),
        }
        .into();
        assert!(matches!(
            err,
            ComponentError::Fluid(FluidError::ConvergenceFailed { .. })
        ));
        let rc: RcError = ComponentError::InvalidArg { what: "test" }.into();
        assert!(matches!(rc, RcError::InvalidArg { .. }));
    }
}
