//! Property query inputs and results.

use rc_core::units::{Density, DynVisc, Pressure, Temperature, Velocity};

/// Specific enthalpy [J/kg].
///
/// Not part of uom's standard set, so we use f64 with clear documentation.
pub type SpecEnthalpy = f64;

/// Specific entropy [J/(kg·K)].
pub type SpecEntropy = f64;

/// Specific heat capacity [J/(kg·K)].
pub type SpecHeatCapacity = f64;

/// Independent property pair for a lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateInput {
    /// Pressure and temperature.
    PT { p: Pressure, t: Temperature },
    /// Pressure and specific enthalpy.
    PH { p: Pressure, h: SpecEnthalpy },
    /// Pressure and specific entropy.
    PS { p: Pressure, s: SpecEntropy },
}

impl StateInput {
    pub fn pressure(&self) -> Pressure {
        match *self {
            StateInput::PT { p, .. } | StateInput::PH { p, .. } | StateInput::PS { p, .. } => p,
        }
    }

    /// Bit patterns of both inputs plus a tag, for memoization.
    pub(crate) fn key_bits(&self) -> (u8, u64, u64) {
        match *self {
            StateInput::PT { p, t } => (0, p.value.to_bits(), t.value.to_bits()),
            StateInput::PH { p, h } => (1, p.value.to_bits(), h.to_bits()),
            StateInput::PS { p, s } => (2, p.value.to_bits(), s.to_bits()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Liquid,
    Gas,
}

/// Thermodynamic and transport properties at one state.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidProperties {
    pub p: Pressure,
    pub t: Temperature,
    pub rho: Density,
    pub h: SpecEnthalpy,
    pub s: SpecEntropy,
    pub cp: SpecHeatCapacity,
    /// cp/cv
    pub gamma: f64,
    pub a: Velocity,
    pub viscosity: Option<DynVisc>,
    /// Thermal conductivity [W/(m·K)]
    pub conductivity: Option<f64>,
    pub phase: Phase,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_core::units::{bar, k};

    #[test]
    fn key_bits_distinguish_input_kinds() {
        let pt = StateInput::PT {
            p: bar(1.0),
            t: k(300.0),
        };
        let ph = StateInput::PH {
            p: bar(1.0),
            h: 300.0,
        };
        assert_ne!(pt.key_bits(), ph.key_bits());
        assert_eq!(pt.pressure(), ph.pressure());
    }
}
