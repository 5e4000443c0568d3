//! Two-stream heat exchanger.

use crate::common::{PressureDrop, expect_inlets, require_flow};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentOutput, EvalInputs, UnitModel};
use rc_core::units::Temperature;
use rc_fluids::{FlowFluid, FlowState, PropertyAdapter, StateInput};
use rc_graph::{Arity, PortCount};

/// How the duty is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeatExchangerMode {
    /// Overall conductance UA [W/K], counter-flow ε-NTU.
    Conductance(f64),
    /// Heat the cold side to this outlet temperature.
    ColdOutletTemperature(Temperature),
}

/// Port 0 is the hot side, port 1 the cold side, on both inlets and
/// outlets. Heat absorbed by the cold side equals heat rejected by the hot
/// side.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatExchanger {
    mode: HeatExchangerMode,
    hot_drop: PressureDrop,
    cold_drop: PressureDrop,
}

impl HeatExchanger {
    pub fn new(mode: HeatExchangerMode, hot_drop: PressureDrop, cold_drop: PressureDrop) -> ComponentResult<Self> {
        match mode {
            HeatExchangerMode::Conductance(ua) if ua.is_finite() && ua >= 0.0 => {}
            HeatExchangerMode::ColdOutletTemperature(t) if t.value.is_finite() && t.value > 0.0 => {}
            _ => {
                return Err(ComponentError::InvalidArg {
                    what: "heat exchanger conductance must be non-negative and target temperature positive",
                });
            }
        }
        hot_drop.validate()?;
        cold_drop.validate()?;
        Ok(Self {
            mode,
            hot_drop,
            cold_drop,
        })
    }

    pub fn mode(&self) -> HeatExchangerMode {
        self.mode
    }
}

fn heat_capacity(adapter: &PropertyAdapter<'_>, state: &FlowState) -> ComponentResult<f64> {
    let cp = match &state.fluid {
        FlowFluid::Combustion(gas) => gas.cp,
        FlowFluid::Propellant(prop) => {
            adapter
                .property_lookup(
                    *prop,
                    StateInput::PT {
                        p: state.pressure,
                        t: state.temperature,
                    },
                )?
                .cp
        }
    };
    Ok(state.mass_flow.value * cp)
}

/// Counter-flow effectiveness.
pub fn counterflow_effectiveness(ntu: f64, capacity_ratio: f64) -> f64 {
    if (1.0 - capacity_ratio).abs() < 1e-9 {
        return ntu / (1.0 + ntu);
    }
    let e = (-ntu * (1.0 - capacity_ratio)).exp();
    (1.0 - e) / (1.0 - capacity_ratio * e)
}

impl UnitModel for HeatExchanger {
    fn arity(&self) -> Arity {
        Arity::new(PortCount::Exactly(2), PortCount::Exactly(2))
    }

    fn evaluate(
        &self,
        adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput> {
        expect_inlets(inputs.inlets, 2)?;
        let (hot, cold) = (&inputs.inlets[0], &inputs.inlets[1]);
        let m_hot = require_flow(hot, "hot side mass flow must be positive")?;
        let m_cold = require_flow(cold, "cold side mass flow must be positive")?;
        let (t_hot, t_cold) = (hot.temperature.value, cold.temperature.value);
        if t_hot < t_cold {
            return Err(ComponentError::Infeasible {
                what: format!("hot inlet {t_hot:.1} K colder than cold inlet {t_cold:.1} K"),
            });
        }

        let p_hot = self.hot_drop.outlet_pressure(hot.pressure)?;
        let p_cold = self.cold_drop.outlet_pressure(cold.pressure)?;

        let (duty, cold_out) = match self.mode {
            HeatExchangerMode::Conductance(ua) => {
                let c_hot = heat_capacity(adapter, hot)?;
                let c_cold = heat_capacity(adapter, cold)?;
                let (c_min, c_max) = (c_hot.min(c_cold), c_hot.max(c_cold));
                let eps = counterflow_effectiveness(ua / c_min, c_min / c_max);
                let q = eps * c_min * (t_hot - t_cold);
                let out = cold.at_ph(adapter, p_cold, cold.enthalpy + q / m_cold)?;
                (q, out)
            }
            HeatExchangerMode::ColdOutletTemperature(target) => {
                if target.value < t_cold || target.value > t_hot {
                    return Err(ComponentError::Infeasible {
                        what: format!(
                            "cold outlet target {:.1} K outside [{t_cold:.1}, {t_hot:.1}] K",
                            target.value
                        ),
                    });
                }
                let out = cold.at_pt(adapter, p_cold, target)?;
                ((out.enthalpy - cold.enthalpy) * m_cold, out)
            }
        };

        // Second law: the hot side can at most be cooled to the cold inlet.
        let floor = hot.at_pt(adapter, p_hot, cold.temperature)?;
        let q_max = m_hot * (hot.enthalpy - floor.enthalpy);
        if duty > q_max * (1.0 + 1e-9) + 1e-9 {
            return Err(ComponentError::Infeasible {
                what: format!("duty {duty:.1} W exceeds {q_max:.1} W available from the hot side"),
            });
        }
        let hot_out = hot.at_ph(adapter, p_hot, hot.enthalpy - duty / m_hot)?;

        Ok(ComponentOutput::new(vec![hot_out, cold_out]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_core::units::{bar, k, kgps};
    use rc_fluids::{CurveFitEquilibrium, PerfectFluidEngine, Propellant};

    fn streams(adapter: &PropertyAdapter<'_>) -> [FlowState; 2] {
        [
            FlowState::propellant(adapter, Propellant::Helium, kgps(0.2), bar(30.0), k(800.0)).unwrap(),
            FlowState::propellant(adapter, Propellant::Helium, kgps(0.1), bar(30.0), k(300.0)).unwrap(),
        ]
    }

    #[test]
    fn effectiveness_limits() {
        assert!(counterflow_effectiveness(0.0, 0.5).abs() < 1e-12);
        assert!((counterflow_effectiveness(50.0, 0.5) - 1.0).abs() < 1e-9);
        assert!((counterflow_effectiveness(1.0, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn energy_is_conserved() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let inlets = streams(&adapter);
        let hx = HeatExchanger::new(
            HeatExchangerMode::Conductance(500.0),
            PressureDrop::none(),
            PressureDrop::Fraction(0.05),
        )
        .unwrap();

        let out = hx.evaluate(&adapter, &EvalInputs::new(&inlets)).unwrap();
        let rejected = inlets[0].enthalpy_flow() - out.outlets[0].enthalpy_flow();
        let absorbed = out.outlets[1].enthalpy_flow() - inlets[1].enthalpy_flow();
        assert!(rejected > 0.0);
        assert!((rejected - absorbed).abs() < 1e-6 * rejected);
        assert!(out.outlets[1].temperature > inlets[1].temperature);
    }

    #[test]
    fn cold_outlet_target() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let inlets = streams(&adapter);
        let hx = HeatExchanger::new(
            HeatExchangerMode::ColdOutletTemperature(k(500.0)),
            PressureDrop::none(),
            PressureDrop::none(),
        )
        .unwrap();

        let out = hx.evaluate(&adapter, &EvalInputs::new(&inlets)).unwrap();
        assert!((out.outlets[1].temperature.value - 500.0).abs() < 1e-9);
        // Hot side has twice the capacity rate: it cools by 100 K
        assert!((out.outlets[0].temperature.value - 700.0).abs() < 1e-6);
    }

    #[test]
    fn infeasible_target_fails() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let inlets = streams(&adapter);
        let hx = HeatExchanger::new(
            HeatExchangerMode::ColdOutletTemperature(k(900.0)),
            PressureDrop::none(),
            PressureDrop::none(),
        )
        .unwrap();
        assert!(matches!(
            hx.evaluate(&adapter, &EvalInputs::new(&inlets)),
            Err(ComponentError::Infeasible { .. })
        ));

        // Pinch: a small hot stream cannot heat a large cold one this far
        let inlets = [
            inlets[0].with_mass_flow(kgps(0.01)),
            inlets[1].clone(),
        ];
        let hx = HeatExchanger::new(
            HeatExchangerMode::ColdOutletTemperature(k(700.0)),
            PressureDrop::none(),
            PressureDrop::none(),
        )
        .unwrap();
        assert!(matches!(
            hx.evaluate(&adapter, &EvalInputs::new(&inlets)),
            Err(ComponentError::Infeasible { .. })
        ));
    }

    #[test]
    fn hot_side_outside_its_envelope_at_cold_inlet_fails() {
        // RP-1 cannot exist at the hydrogen inlet temperature, so the
        // second-law bound cannot be evaluated.
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let inlets = [
            FlowState::propellant(&adapter, Propellant::Rp1, kgps(1.0), bar(30.0), k(300.0)).unwrap(),
            FlowState::propellant(&adapter, Propellant::Lh2, kgps(0.1), bar(30.0), k(20.0)).unwrap(),
        ];
        let hx = HeatExchanger::new(
            HeatExchangerMode::Conductance(1.0),
            PressureDrop::none(),
            PressureDrop::none(),
        )
        .unwrap();
        assert!(matches!(
            hx.evaluate(&adapter, &EvalInputs::new(&inlets)),
            Err(ComponentError::Fluid(rc_fluids::FluidError::OutOfRange { .. }))
        ));
    }
}
