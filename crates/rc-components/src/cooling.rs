//! Regenerative cooling channel.

use crate::common::{PressureDrop, check_finite, expect_inlets, require_flow};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{BalanceKind, ComponentOutput, EvalInputs, UnitModel};
use rc_core::units::{MassRate, Power, Temperature, kgps};
use rc_fluids::PropertyAdapter;
use rc_graph::Arity;
use uom::si::thermodynamic_temperature::kelvin;

/// Coolant side of one channel evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoolingReport {
    pub heat_load: Power,
    pub outlet_temperature: Temperature,
    /// Flow that would just reach the outlet temperature limit.
    pub min_coolant_flow: Option<MassRate>,
}

/// Coolant passage absorbing heat from a chamber wall.
///
/// The heat load comes from the evaluation inputs when the channel is
/// linked to a chamber (or driven by a break variable); otherwise the
/// configured fixed load applies. Δh = Q/ṁ.
///
/// With an outlet temperature limit the channel reports the smallest
/// coolant flow that stays under it and a
/// [`BalanceKind::CoolantTemperature`] residual, so a break variable can
/// size the coolant flow to the limit.
#[derive(Debug, Clone, PartialEq)]
pub struct CoolingChannel {
    heat_load: Option<Power>,
    pressure_drop: PressureDrop,
    max_outlet_temperature: Option<Temperature>,
}

impl CoolingChannel {
    pub fn new(heat_load: Option<Power>, pressure_drop: PressureDrop) -> ComponentResult<Self> {
        if let Some(q) = heat_load {
            check_finite(q.value, "cooling heat load")?;
            if q.value < 0.0 {
                return Err(ComponentError::InvalidArg {
                    what: "cooling heat load cannot be negative",
                });
            }
        }
        pressure_drop.validate()?;
        Ok(Self {
            heat_load,
            pressure_drop,
            max_outlet_temperature: None,
        })
    }

    pub fn with_max_outlet_temperature(mut self, limit: Temperature) -> ComponentResult<Self> {
        let t = limit.get::<kelvin>();
        if !(t.is_finite() && t > 0.0) {
            return Err(ComponentError::InvalidArg {
                what: "coolant temperature limit must be positive",
            });
        }
        self.max_outlet_temperature = Some(limit);
        Ok(self)
    }

    pub fn heat_load(&self) -> Option<Power> {
        self.heat_load
    }

    pub fn pressure_drop(&self) -> PressureDrop {
        self.pressure_drop
    }

    pub fn max_outlet_temperature(&self) -> Option<Temperature> {
        self.max_outlet_temperature
    }
}

impl UnitModel for CoolingChannel {
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
        let m = require_flow(inlet, "coolant mass flow must be positive")?;
        let q = inputs
            .heat_load
            .or(self.heat_load)
            .ok_or(ComponentError::InvalidArg {
                what: "cooling channel has neither a heat link nor a fixed load",
            })?;
        check_finite(q.value, "cooling heat load")?;

        let p_out = self.pressure_drop.outlet_pressure(inlet.pressure)?;
        let outlet = inlet.at_ph(adapter, p_out, inlet.enthalpy + q.value / m)?;
        let outlet_temperature = outlet.temperature;

        let mut out = ComponentOutput::new(vec![outlet]).with_heat_rate(q);
        let mut min_coolant_flow = None;
        if let Some(limit) = self.max_outlet_temperature {
            let h_limit = inlet.at_pt(adapter, p_out, limit)?.enthalpy;
            let dh = h_limit - inlet.enthalpy;
            if dh <= 0.0 {
                return Err(ComponentError::Infeasible {
                    what: format!(
                        "coolant enters at {:.1} K, above its {:.1} K limit",
                        inlet.temperature.get::<kelvin>(),
                        limit.get::<kelvin>()
                    ),
                });
            }
            min_coolant_flow = Some(kgps(q.value / dh));
            let (t_out, t_max) = (outlet_temperature.get::<kelvin>(), limit.get::<kelvin>());
            out.push_balance(BalanceKind::CoolantTemperature, (t_out - t_max) / t_max);
            if t_out > t_max {
                out.warnings.push(format!(
                    "coolant outlet {t_out:.1} K exceeds limit {t_max:.1} K"
                ));
            }
        }
        out.cooling = Some(CoolingReport {
            heat_load: q,
            outlet_temperature,
            min_coolant_flow,
        });
        Ok(out)
    }
}
