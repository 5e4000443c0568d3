//! Propellant tank (cycle source).

use crate::common::check_finite;
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentOutput, EvalInputs, UnitModel};
use rc_core::units::{MassRate, Pressure, Temperature};
use rc_fluids::{FlowState, Propellant, PropertyAdapter};
use rc_graph::Arity;

/// Delivers propellant at storage conditions.
///
/// The delivered mass flow may be overridden by a break variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    propellant: Propellant,
    pressure: Pressure,
    temperature: Temperature,
    mass_flow: MassRate,
}

impl Tank {
    pub fn new(
        propellant: Propellant,
        pressure: Pressure,
        temperature: Temperature,
        mass_flow: MassRate,
    ) -> ComponentResult<Self> {
        check_finite(pressure.value, "tank pressure")?;
        check_finite(temperature.value, "tank temperature")?;
        check_finite(mass_flow.value, "tank mass flow")?;
        if pressure.value <= 0.0 || temperature.value <= 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "tank pressure and temperature must be positive",
            });
        }
        if mass_flow.value < 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "tank mass flow cannot be negative",
            });
        }
        Ok(Self {
            propellant,
            pressure,
            temperature,
            mass_flow,
        })
    }

    /// Tank at the propellant's default storage temperature.
    pub fn at_storage(propellant: Propellant, pressure: Pressure, mass_flow: MassRate) -> ComponentResult<Self> {
        Self::new(propellant, pressure, propellant.storage_temperature(), mass_flow)
    }

    pub fn propellant(&self) -> Propellant {
        self.propellant
    }

    pub fn pressure(&self) -> Pressure {
        self.pressure
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    pub fn mass_flow(&self) -> MassRate {
        self.mass_flow
    }

    pub fn with_mass_flow(&self, mass_flow: MassRate) -> ComponentResult<Self> {
        Self::new(self.propellant, self.pressure, self.temperature, mass_flow)
    }
}

impl UnitModel for Tank {
    fn arity(&self) -> Arity {
        Arity::SOURCE
    }

    fn evaluate(
        &self,
        adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput> {
        let mass_flow = inputs.mass_flow().unwrap_or(self.mass_flow);
        let outlet = FlowState::propellant(
            adapter,
            self.propellant,
            mass_flow,
            self.pressure,
            self.temperature,
        )?;
        Ok(ComponentOutput::new(vec![outlet]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Adjustment;
    use rc_core::units::{bar, k, kgps};
    use rc_fluids::{CurveFitEquilibrium, PerfectFluidEngine, Phase};

    #[test]
    fn rejects_bad_parameters() {
        assert!(Tank::new(Propellant::Lox, bar(-1.0), k(90.0), kgps(1.0)).is_err());
        assert!(Tank::new(Propellant::Lox, bar(2.0), k(90.0), kgps(-1.0)).is_err());
    }

    #[test]
    fn delivers_storage_state() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let tank = Tank::at_storage(Propellant::Lox, bar(2.0), kgps(2.3)).unwrap();

        let out = tank.evaluate(&adapter, &EvalInputs::new(&[])).unwrap();
        assert_eq!(out.outlets.len(), 1);
        assert_eq!(out.outlets[0].mass_flow, kgps(2.3));
        assert_eq!(out.outlets[0].phase, Phase::Liquid);

        let adj = [Adjustment::MassFlow(kgps(3.0))];
        let out = tank
            .evaluate(&adapter, &EvalInputs::new(&[]).with_adjustments(&adj))
            .unwrap();
        assert_eq!(out.outlets[0].mass_flow, kgps(3.0));
    }
}
