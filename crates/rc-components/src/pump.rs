//! Turbopump stage.

use crate::common::{check_efficiency, check_finite, expect_inlets};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentOutput, EvalInputs, UnitModel};
use rc_core::units::{Pressure, pa, watts};
use rc_fluids::{FlowFluid, Phase, PropertyAdapter, StateInput};
use rc_graph::Arity;

/// How the pump outlet pressure is fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpTarget {
    /// p_out = p_in · ratio
    PressureRatio(f64),
    DischargePressure(Pressure),
}

/// Liquid pump.
///
/// ## Model
///
/// ```text
/// s_in      = s(p_in, T_in)
/// h_out,s   = h(p_out, s_in)
/// Δh        = (h_out,s − h_in) / η
/// P_shaft   = ṁ · Δh          (consumed, positive)
/// ```
///
/// For an incompressible liquid this reduces to Δh = Δp / (ρ·η).
#[derive(Debug, Clone, PartialEq)]
pub struct Pump {
    efficiency: f64,
    target: PumpTarget,
}

impl Pump {
    pub fn new(efficiency: f64, target: PumpTarget) -> ComponentResult<Self> {
        check_efficiency(efficiency, "pump efficiency must be in (0,1]")?;
        match target {
            PumpTarget::PressureRatio(r) if r.is_finite() && r >= 1.0 => {}
            PumpTarget::DischargePressure(p) if p.value.is_finite() && p.value > 0.0 => {}
            _ => {
                return Err(ComponentError::InvalidArg {
                    what: "pump target must be a ratio >= 1 or a positive discharge pressure",
                });
            }
        }
        Ok(Self { efficiency, target })
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn target(&self) -> PumpTarget {
        self.target
    }
}

impl UnitModel for Pump {
    fn arity(&self) -> Arity {
        Arity::TWO_PORT
    }

    fn evaluate(
        &self,
        adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput> {
        expect_inlets(inputs.inlets, 1)?;
        let inlet = &inputs.inlets[0];
        let propellant = match inlet.fluid {
            FlowFluid::Propellant(p) => p,
            FlowFluid::Combustion(_) => {
                return Err(ComponentError::NotSupported {
                    what: "pump inlet carries combustion gas",
                });
            }
        };
        if inlet.phase == Phase::Gas {
            return Err(ComponentError::NotSupported {
                what: "pump inlet is gaseous",
            });
        }

        let p_in = inlet.pressure;
        let p_out = match (inputs.discharge_pressure(), self.target) {
            (Some(p), _) => p,
            (None, PumpTarget::DischargePressure(p)) => p,
            (None, PumpTarget::PressureRatio(r)) => pa(p_in.value * r),
        };
        check_finite(p_out.value, "pump discharge pressure")?;
        if p_out.value < p_in.value {
            return Err(ComponentError::Infeasible {
                what: format!(
                    "pump discharge {:.0} Pa below inlet {:.0} Pa",
                    p_out.value, p_in.value
                ),
            });
        }

        let at_inlet = adapter.property_lookup(
            propellant,
            StateInput::PT {
                p: p_in,
                t: inlet.temperature,
            },
        )?;
        let isentropic = adapter.property_lookup(propellant, StateInput::PS { p: p_out, s: at_inlet.s })?;
        let dh = (isentropic.h - at_inlet.h) / self.efficiency;
        check_finite(dh, "pump enthalpy rise")?;

        let outlet = inlet.at_ph(adapter, p_out, inlet.enthalpy + dh)?;
        let power = watts(inlet.mass_flow.value * dh);
        Ok(ComponentOutput::new(vec![outlet]).with_shaft_power(power))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Adjustment;
    use rc_core::units::{bar, k, kgps};
    use rc_fluids::{CurveFitEquilibrium, FlowState, PerfectFluidEngine, Propellant};

    fn lox(adapter: &PropertyAdapter<'_>) -> FlowState {
        FlowState::propellant(adapter, Propellant::Lox, kgps(2.0), bar(2.0), k(90.19)).unwrap()
    }

    #[test]
    fn pump_creation_validates() {
        assert!(Pump::new(0.0, PumpTarget::PressureRatio(10.0)).is_err());
        assert!(Pump::new(0.7, PumpTarget::PressureRatio(0.5)).is_err());
        assert!(Pump::new(0.7, PumpTarget::DischargePressure(bar(70.0))).is_ok());
    }

    #[test]
    fn incompressible_power() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let pump = Pump::new(0.7, PumpTarget::DischargePressure(bar(70.0))).unwrap();
        let inlet = [lox(&adapter)];

        let out = pump.evaluate(&adapter, &EvalInputs::new(&inlet)).unwrap();
        let expected = 2.0 * (bar(70.0).value - bar(2.0).value) / (1141.0 * 0.7);
        assert!((out.shaft_power.value - expected).abs() < 1e-6 * expected);
        assert_eq!(out.outlets[0].pressure, bar(70.0));
        // Losses heat the liquid
        assert!(out.outlets[0].temperature.value > 90.19);
    }

    #[test]
    fn discharge_adjustment_overrides_target() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let pump = Pump::new(0.7, PumpTarget::PressureRatio(10.0)).unwrap();
        let inlet = [lox(&adapter)];
        let adj = [Adjustment::DischargePressure(bar(50.0))];

        let out = pump
            .evaluate(&adapter, &EvalInputs::new(&inlet).with_adjustments(&adj))
            .unwrap();
        assert_eq!(out.outlets[0].pressure, bar(50.0));
    }

    #[test]
    fn rejects_gas_and_low_discharge() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let pump = Pump::new(0.7, PumpTarget::DischargePressure(bar(1.0))).unwrap();
        let inlet = [lox(&adapter)];
        assert!(matches!(
            pump.evaluate(&adapter, &EvalInputs::new(&inlet)),
            Err(ComponentError::Infeasible { .. })
        ));

        let he = [FlowState::propellant(&adapter, Propellant::Helium, kgps(0.1), bar(2.0), k(300.0)).unwrap()];
        let pump = Pump::new(0.7, PumpTarget::PressureRatio(5.0)).unwrap();
        assert!(matches!(
            pump.evaluate(&adapter, &EvalInputs::new(&he)),
            Err(ComponentError::NotSupported { .. })
        ));
    }
}
