//! Fluid property errors.

use rc_core::RcError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during property and combustion calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Query outside the validity envelope of the fluid.
    #[error("{fluid}: {what} = {value} outside envelope [{min}, {max}]")]
    OutOfRange {
        fluid: String,
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Operation not supported by the selected engine.
    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    /// Backend (CoolProp) error.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// The equilibrium or inversion solver did not converge.
    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },
}

impl From<FluidError> for RcError {
    fn from(err: FluidError) -> Self {
        match err {
            FluidError::InvalidArg { what } => RcError::InvalidArg { what },
            other => RcError::Invariant {
                what: format!("fluid: {}", other),
            },
        }
    }
}
