//! Common helpers for component calculations.

use crate::error::{ComponentError, ComponentResult};
use rc_core::numeric::ensure_finite;
use rc_core::units::{Pressure, pa};
use rc_fluids::FlowState;

/// Small epsilon for mass flow rate (kg/s)
pub const EPSILON_MDOT: f64 = 1e-9;

/// Ensure a value is finite, returning ComponentError if not.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<()> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })?;
    Ok(())
}

/// Ensure an efficiency is in (0, 1].
pub fn check_efficiency(eta: f64, what: &'static str) -> ComponentResult<()> {
    if !(eta > 0.0 && eta <= 1.0) {
        return Err(ComponentError::InvalidArg { what });
    }
    Ok(())
}

/// Exactly `n` inlet states.
pub fn expect_inlets(inlets: &[FlowState], n: usize) -> ComponentResult<()> {
    if inlets.len() != n {
        return Err(ComponentError::InvalidArg {
            what: "wrong number of inlet states",
        });
    }
    Ok(())
}

/// Positive, finite mass flow through a component.
pub fn require_flow(state: &FlowState, what: &'static str) -> ComponentResult<f64> {
    let m = state.mass_flow.value;
    check_finite(m, what)?;
    if m <= EPSILON_MDOT {
        return Err(ComponentError::NonPhysical { what });
    }
    Ok(m)
}

/// Pressure loss across a passive element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressureDrop {
    /// Fixed loss.
    Absolute(Pressure),
    /// Fraction of the inlet pressure, in [0, 1).
    Fraction(f64),
}

impl PressureDrop {
    pub fn none() -> Self {
        PressureDrop::Absolute(pa(0.0))
    }

    pub fn validate(&self) -> ComponentResult<()> {
        match *self {
            PressureDrop::Absolute(dp) if dp.value.is_finite() && dp.value >= 0.0 => Ok(()),
            PressureDrop::Fraction(f) if (0.0..1.0).contains(&f) => Ok(()),
            _ => Err(ComponentError::InvalidArg {
                what: "pressure drop must be non-negative (fraction below 1)",
            }),
        }
    }

    /// Outlet pressure for an inlet pressure; fails if nothing is left.
    pub fn outlet_pressure(&self, inlet: Pressure) -> ComponentResult<Pressure> {
        let p = match *self {
            PressureDrop::Absolute(dp) => inlet.value - dp.value,
            PressureDrop::Fraction(f) => inlet.value * (1.0 - f),
        };
        if !p.is_finite() || p <= 0.0 {
            return Err(ComponentError::NonPhysical {
                what: "pressure drop exceeds inlet pressure",
            });
        }
        Ok(pa(p))
    }
}
