//! Combustion chamber and gas generator.

use crate::common::{check_finite, expect_inlets, require_flow};
use crate::error::{ComponentError, ComponentResult};
use crate::isentropic::characteristic_velocity;
use crate::traits::{BalanceKind, ComponentOutput, EvalInputs, UnitModel};
use rc_core::numeric::relative_residual;
use rc_core::units::constants::T_REFERENCE_K;
use rc_core::units::{Power, Pressure, Temperature, Velocity, kgps, mps, pa, watts};
use rc_fluids::{CombustionGas, FlowState, PropellantPair, PropertyAdapter};
use rc_graph::{Arity, PortCount};

/// Default injector pressure drop as a fraction of chamber pressure.
pub const DEFAULT_INJECTOR_DROP: f64 = 0.15;

/// Summary of one combustor evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChamberReport {
    pub pair: PropellantPair,
    pub chamber_pressure: Pressure,
    pub mixture_ratio: f64,
    pub flame_temperature: Temperature,
    pub c_star: Velocity,
    /// Sensible heat of the products above 298.15 K, ṁ·cp·(Tc − T_ref).
    pub heat_release: Power,
    /// Inlet pressure each feed must supply, pc·(1 + injector drop).
    pub required_feed_pressure: Pressure,
    /// Actual inlet pressures, in port order.
    pub feed_pressures: Vec<Pressure>,
}

impl ChamberReport {
    /// Feed pressure minus requirement for each inlet [Pa].
    pub fn feed_margins(&self) -> Vec<f64> {
        self.feed_pressures
            .iter()
            .map(|p| p.value - self.required_feed_pressure.value)
            .collect()
    }
}

/// Burns one oxidizer and one fuel stream at fixed chamber pressure.
///
/// Used both for main chambers and for gas generators / preburners; the
/// latter usually run far from stoichiometric and set a temperature limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Chamber {
    pair: PropellantPair,
    chamber_pressure: Pressure,
    injector_drop: f64,
    mixture_ratio_target: Option<f64>,
    temperature_limit: Option<Temperature>,
}

impl Chamber {
    pub fn new(pair: PropellantPair, chamber_pressure: Pressure) -> ComponentResult<Self> {
        check_finite(chamber_pressure.value, "chamber pressure")?;
        if chamber_pressure.value <= 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "chamber pressure must be positive",
            });
        }
        Ok(Self {
            pair,
            chamber_pressure,
            injector_drop: DEFAULT_INJECTOR_DROP,
            mixture_ratio_target: None,
            temperature_limit: None,
        })
    }

    pub fn with_injector_drop(mut self, fraction: f64) -> ComponentResult<Self> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(ComponentError::InvalidArg {
                what: "injector drop must be a fraction in [0, 1)",
            });
        }
        self.injector_drop = fraction;
        Ok(self)
    }

    pub fn with_mixture_ratio_target(mut self, mr: f64) -> ComponentResult<Self> {
        if !(mr.is_finite() && mr > 0.0) {
            return Err(ComponentError::InvalidArg {
                what: "target mixture ratio must be positive",
            });
        }
        self.mixture_ratio_target = Some(mr);
        Ok(self)
    }

    pub fn with_temperature_limit(mut self, limit: Temperature) -> ComponentResult<Self> {
        if !(limit.value.is_finite() && limit.value > 0.0) {
            return Err(ComponentError::InvalidArg {
                what: "temperature limit must be positive",
            });
        }
        self.temperature_limit = Some(limit);
        Ok(self)
    }

    pub fn with_chamber_pressure(&self, chamber_pressure: Pressure) -> ComponentResult<Self> {
        let mut next = Self::new(self.pair, chamber_pressure)?;
        next.injector_drop = self.injector_drop;
        next.mixture_ratio_target = self.mixture_ratio_target;
        next.temperature_limit = self.temperature_limit;
        Ok(next)
    }

    pub fn pair(&self) -> PropellantPair {
        self.pair
    }

    pub fn chamber_pressure(&self) -> Pressure {
        self.chamber_pressure
    }

    pub fn injector_drop(&self) -> f64 {
        self.injector_drop
    }

    pub fn mixture_ratio_target(&self) -> Option<f64> {
        self.mixture_ratio_target
    }

    pub fn temperature_limit(&self) -> Option<Temperature> {
        self.temperature_limit
    }

    /// pc·(1 + injector drop)
    pub fn required_feed_pressure(&self) -> Pressure {
        pa(self.chamber_pressure.value * (1.0 + self.injector_drop))
    }

    /// Split inlets into (oxidizer, fuel) by fluid identity.
    fn identify<'s>(&self, inlets: &'s [FlowState]) -> ComponentResult<(&'s FlowState, &'s FlowState)> {
        let is = |s: &FlowState, p| s.fluid.propellant() == Some(p);
        let (ox, fu) = (self.pair.oxidizer(), self.pair.fuel());
        match (&inlets[0], &inlets[1]) {
            (a, b) if is(a, ox) && is(b, fu) => Ok((a, b)),
            (a, b) if is(a, fu) && is(b, ox) => Ok((b, a)),
            _ => Err(ComponentError::InvalidArg {
                what: "chamber inlets must carry the oxidizer and fuel of its propellant pair",
            }),
        }
    }
}

impl UnitModel for Chamber {
    fn arity(&self) -> Arity {
        Arity::new(PortCount::Exactly(2), PortCount::Exactly(1))
    }

    fn evaluate(
        &self,
        adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput> {
        expect_inlets(inputs.inlets, 2)?;
        let (ox, fuel) = self.identify(inputs.inlets)?;
        let m_ox = ox.mass_flow.value;
        check_finite(m_ox, "oxidizer mass flow")?;
        if m_ox < 0.0 {
            return Err(ComponentError::NonPhysical {
                what: "negative oxidizer mass flow",
            });
        }
        let m_fuel = require_flow(fuel, "fuel mass flow must be positive")?;
        let mixture_ratio = m_ox / m_fuel;
        let m_total = m_ox + m_fuel;

        let pc = self.chamber_pressure;
        let products = adapter.equilibrium_combustion(pc, mixture_ratio, self.pair)?;
        let t_c = products.flame_temperature;
        let c_star = characteristic_velocity(products.gamma, products.specific_gas_constant(), t_c.value);
        let heat_release = m_total * products.cp * (t_c.value - T_REFERENCE_K);

        let gas = CombustionGas::from_products(self.pair, mixture_ratio, &products);
        let outlet = FlowState::combustion(gas, kgps(m_total), pc, t_c);

        let required = self.required_feed_pressure();
        let mut out = ComponentOutput::new(vec![outlet]);
        for (index, inlet) in inputs.inlets.iter().enumerate() {
            out.push_balance(
                BalanceKind::FeedPressure { inlet: index },
                relative_residual(inlet.pressure.value, required.value, 1.0),
            );
        }
        if let Some(target) = self.mixture_ratio_target {
            out.push_balance(BalanceKind::MixtureRatio, (mixture_ratio - target) / target);
        }
        if let Some(limit) = self.temperature_limit
            && t_c > limit
        {
            out.warnings.push(format!(
                "flame temperature {:.1} K exceeds limit {:.1} K",
                t_c.value, limit.value
            ));
        }

        out.chamber = Some(ChamberReport {
            pair: self.pair,
            chamber_pressure: pc,
            mixture_ratio,
            flame_temperature: t_c,
            c_star: mps(c_star),
            heat_release: watts(heat_release),
            required_feed_pressure: required,
            feed_pressures: inputs.inlets.iter().map(|s| s.pressure).collect(),
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_core::units::{bar, k};
    use rc_fluids::{CurveFitEquilibrium, FluidError, PerfectFluidEngine, Propellant};

    fn feeds(adapter: &PropertyAdapter<'_>, m_ox: f64, m_fuel: f64, p: Pressure) -> [FlowState; 2] {
        [
            FlowState::propellant(adapter, Propellant::Rp1, kgps(m_fuel), p, k(263.6)).unwrap(),
            FlowState::propellant(adapter, Propellant::Lox, kgps(m_ox), p, k(90.19)).unwrap(),
        ]
    }

    #[test]
    fn burns_at_inlet_mixture_ratio() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let chamber = Chamber::new(PropellantPair::LoxRp1, bar(60.0)).unwrap();
        let inlets = feeds(&adapter, 2.3, 1.0, bar(69.0));

        let out = chamber.evaluate(&adapter, &EvalInputs::new(&inlets)).unwrap();
        let report = out.chamber.as_ref().unwrap();
        assert!((report.mixture_ratio - 2.3).abs() < 1e-12);
        assert!((out.outlets[0].mass_flow.value - 3.3).abs() < 1e-12);
        assert!(report.c_star.value > 1600.0 && report.c_star.value < 1900.0);
        // Both feeds exactly at pc·1.15
        for i in 0..2 {
            let r = out.residual(BalanceKind::FeedPressure { inlet: i }).unwrap();
            assert!(r.abs() < 1e-12);
        }
        assert!(report.feed_margins().iter().all(|m| m.abs() < 1e-6));
    }

    #[test]
    fn reports_mixture_ratio_residual_and_limit() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let chamber = Chamber::new(PropellantPair::LoxRp1, bar(60.0))
            .unwrap()
            .with_mixture_ratio_target(2.0)
            .unwrap()
            .with_temperature_limit(k(1000.0))
            .unwrap();
        let inlets = feeds(&adapter, 2.3, 1.0, bar(60.0));

        let out = chamber.evaluate(&adapter, &EvalInputs::new(&inlets)).unwrap();
        let r = out.residual(BalanceKind::MixtureRatio).unwrap();
        assert!((r - 0.15).abs() < 1e-12);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.residual(BalanceKind::FeedPressure { inlet: 0 }).unwrap() < 0.0);
    }

    #[test]
    fn equilibrium_failure_propagates() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let chamber = Chamber::new(PropellantPair::LoxRp1, bar(60.0)).unwrap();
        let inlets = feeds(&adapter, 30.0, 1.0, bar(69.0));

        let res = chamber.evaluate(&adapter, &EvalInputs::new(&inlets));
        assert!(matches!(
            res,
            Err(ComponentError::Fluid(FluidError::ConvergenceFailed { .. }))
        ));
    }

    #[test]
    fn wrong_propellants_rejected() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let chamber = Chamber::new(PropellantPair::LoxLh2, bar(60.0)).unwrap();
        let inlets = feeds(&adapter, 2.3, 1.0, bar(69.0));
        assert!(matches!(
            chamber.evaluate(&adapter, &EvalInputs::new(&inlets)),
            Err(ComponentError::InvalidArg { .. })
        ));
    }
}
