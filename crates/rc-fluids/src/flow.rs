//! Flow state carried on cycle streams.

use crate::adapter::PropertyAdapter;
use crate::composition::Composition;
use crate::equilibrium::CombustionProducts;
use crate::error::{FluidError, FluidResult};
use crate::propellant::{Propellant, PropellantPair};
use crate::state::{Phase, SpecEnthalpy, SpecHeatCapacity, StateInput};
use rc_core::units::constants::{R_UNIVERSAL, T_REFERENCE_K};
use rc_core::units::{MassRate, Pressure, Temperature, k};
use std::fmt;

/// Frozen combustion gas leaving a chamber or gas generator.
#[derive(Debug, Clone, PartialEq)]
pub struct CombustionGas {
    pub pair: PropellantPair,
    pub mixture_ratio: f64,
    /// [kg/mol]
    pub molar_mass: f64,
    pub gamma: f64,
    pub cp: SpecHeatCapacity,
    pub composition: Composition,
}

impl CombustionGas {
    pub fn from_products(pair: PropellantPair, mixture_ratio: f64, products: &CombustionProducts) -> Self {
        Self {
            pair,
            mixture_ratio,
            molar_mass: products.molar_mass,
            gamma: products.gamma,
            cp: products.cp,
            composition: products.composition.clone(),
        }
    }

    /// R/M [J/(kg·K)]
    pub fn specific_gas_constant(&self) -> f64 {
        R_UNIVERSAL / self.molar_mass
    }
}

/// Identity of the fluid on a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowFluid {
    Propellant(Propellant),
    Combustion(CombustionGas),
}

impl FlowFluid {
    pub fn propellant(&self) -> Option<Propellant> {
        match self {
            FlowFluid::Propellant(p) => Some(*p),
            FlowFluid::Combustion(_) => None,
        }
    }

    pub fn combustion(&self) -> Option<&CombustionGas> {
        match self {
            FlowFluid::Propellant(_) => None,
            FlowFluid::Combustion(gas) => Some(gas),
        }
    }

    /// Same chemical identity (combustion gases match on pair and mixture
    /// ratio).
    pub fn same_fluid(&self, other: &FlowFluid) -> bool {
        match (self, other) {
            (FlowFluid::Propellant(a), FlowFluid::Propellant(b)) => a == b,
            (FlowFluid::Combustion(a), FlowFluid::Combustion(b)) => {
                a.pair == b.pair && (a.mixture_ratio - b.mixture_ratio).abs() < 1e-9
            }
            _ => false,
        }
    }
}

impl fmt::Display for FlowFluid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowFluid::Propellant(p) => write!(f, "{p}"),
            FlowFluid::Combustion(gas) => write!(f, "{} products (MR {:.3})", gas.pair, gas.mixture_ratio),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validity {
    Valid,
    Invalid(String),
}

/// Ideal-gas expansion properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasProperties {
    pub cp: SpecHeatCapacity,
    pub gamma: f64,
    /// [kg/mol]
    pub molar_mass: f64,
}

impl GasProperties {
    pub fn specific_gas_constant(&self) -> f64 {
        R_UNIVERSAL / self.molar_mass
    }
}

/// State of the fluid on one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    pub fluid: FlowFluid,
    pub mass_flow: MassRate,
    pub pressure: Pressure,
    pub temperature: Temperature,
    pub enthalpy: SpecEnthalpy,
    pub phase: Phase,
    pub validity: Validity,
}

impl FlowState {
    /// Propellant at pressure and temperature.
    pub fn propellant(
        adapter: &PropertyAdapter<'_>,
        propellant: Propellant,
        mass_flow: MassRate,
        p: Pressure,
        t: Temperature,
    ) -> FluidResult<Self> {
        let props = adapter.property_lookup(propellant, StateInput::PT { p, t })?;
        Ok(Self {
            fluid: FlowFluid::Propellant(propellant),
            mass_flow,
            pressure: p,
            temperature: t,
            enthalpy: props.h,
            phase: props.phase,
            validity: Validity::Valid,
        })
    }

    /// Propellant at pressure and specific enthalpy.
    pub fn propellant_ph(
        adapter: &PropertyAdapter<'_>,
        propellant: Propellant,
        mass_flow: MassRate,
        p: Pressure,
        h: SpecEnthalpy,
    ) -> FluidResult<Self> {
        let props = adapter.property_lookup(propellant, StateInput::PH { p, h })?;
        Ok(Self {
            fluid: FlowFluid::Propellant(propellant),
            mass_flow,
            pressure: p,
            temperature: props.t,
            enthalpy: props.h,
            phase: props.phase,
            validity: Validity::Valid,
        })
    }

    /// Combustion gas; enthalpy is sensible heat above 298.15 K.
    pub fn combustion(gas: CombustionGas, mass_flow: MassRate, p: Pressure, t: Temperature) -> Self {
        let enthalpy = gas.cp * (t.value - T_REFERENCE_K);
        Self {
            fluid: FlowFluid::Combustion(gas),
            mass_flow,
            pressure: p,
            temperature: t,
            enthalpy,
            phase: Phase::Gas,
            validity: Validity::Valid,
        }
    }

    /// Same fluid and mass flow at a new pressure and temperature.
    pub fn at_pt(&self, adapter: &PropertyAdapter<'_>, p: Pressure, t: Temperature) -> FluidResult<Self> {
        match &self.fluid {
            FlowFluid::Propellant(prop) => Self::propellant(adapter, *prop, self.mass_flow, p, t),
            FlowFluid::Combustion(gas) => Ok(Self::combustion(gas.clone(), self.mass_flow, p, t)),
        }
    }

    /// Same fluid and mass flow at a new pressure and specific enthalpy.
    pub fn at_ph(&self, adapter: &PropertyAdapter<'_>, p: Pressure, h: SpecEnthalpy) -> FluidResult<Self> {
        match &self.fluid {
            FlowFluid::Propellant(prop) => Self::propellant_ph(adapter, *prop, self.mass_flow, p, h),
            FlowFluid::Combustion(gas) => {
                let t = T_REFERENCE_K + h / gas.cp;
                if !t.is_finite() || t <= 0.0 {
                    return Err(FluidError::NonPhysical {
                        what: "combustion gas temperature",
                    });
                }
                Ok(Self::combustion(gas.clone(), self.mass_flow, p, k(t)))
            }
        }
    }

    pub fn with_mass_flow(&self, mass_flow: MassRate) -> Self {
        Self {
            mass_flow,
            ..self.clone()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    /// Enthalpy flow ṁ·h [W].
    pub fn enthalpy_flow(&self) -> f64 {
        self.mass_flow.value * self.enthalpy
    }

    /// cp, γ and M for ideal-gas expansion.
    ///
    /// Liquids cannot be expanded as a gas and are rejected.
    pub fn gas_properties(&self, adapter: &PropertyAdapter<'_>) -> FluidResult<GasProperties> {
        match &self.fluid {
            FlowFluid::Combustion(gas) => Ok(GasProperties {
                cp: gas.cp,
                gamma: gas.gamma,
                molar_mass: gas.molar_mass,
            }),
            FlowFluid::Propellant(prop) => {
                let props = adapter.property_lookup(
                    *prop,
                    StateInput::PT {
                        p: self.pressure,
                        t: self.temperature,
                    },
                )?;
                if props.phase == Phase::Liquid {
                    return Err(FluidError::NonPhysical {
                        what: "liquid cannot be expanded as an ideal gas",
                    });
                }
                Ok(GasProperties {
                    cp: props.cp,
                    gamma: props.gamma,
                    molar_mass: prop.molar_mass(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equilibrium::{CurveFitEquilibrium, EquilibriumEngine};
    use crate::perfect::PerfectFluidEngine;
    use rc_core::units::{bar, kgps};

    #[test]
    fn combustion_enthalpy_round_trips() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let products = eq.combust(bar(60.0), 2.3, PropellantPair::LoxRp1).unwrap();
        let gas = CombustionGas::from_products(PropellantPair::LoxRp1, 2.3, &products);
        let state = FlowState::combustion(gas, kgps(3.3), bar(60.0), products.flame_temperature);
        let again = state.at_ph(&adapter, bar(60.0), state.enthalpy).unwrap();
        assert!((again.temperature.value - state.temperature.value).abs() < 1e-6);
        assert!(state.fluid.same_fluid(&again.fluid));
    }

    #[test]
    fn liquid_has_no_gas_properties() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let lox = FlowState::propellant(&adapter, Propellant::Lox, kgps(1.0), bar(2.0), k(90.19)).unwrap();
        assert!(lox.gas_properties(&adapter).is_err());
        assert!(lox.is_valid());

        let he = FlowState::propellant(&adapter, Propellant::Helium, kgps(0.1), bar(50.0), k(300.0)).unwrap();
        let gas = he.gas_properties(&adapter).unwrap();
        assert!((gas.gamma - 5.0 / 3.0).abs() < 0.01);
    }
}
