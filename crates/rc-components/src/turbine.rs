//! Turbine driving a turbopump shaft.

use crate::common::{check_efficiency, check_finite, expect_inlets, require_flow};
use crate::error::{ComponentError, ComponentResult};
use crate::isentropic::isentropic_enthalpy_drop;
use crate::traits::{BalanceKind, ComponentOutput, EvalInputs, UnitModel};
use rc_core::numeric::relative_residual;
use rc_core::units::{Pressure, pa, watts};
use rc_fluids::{FlowFluid, FlowState, PropertyAdapter, StateInput};
use rc_graph::Arity;
use uom::si::pressure::{bar, pascal};
use uom::si::thermodynamic_temperature::kelvin;

const MAX_ITER: usize = 100;

/// How the turbine outlet pressure is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurbineMode {
    /// Expansion ratio p_in/p_out ≥ 1.
    PressureRatio(f64),
    OutletPressure(Pressure),
    /// Outlet pressure solved so the turbine delivers the shaft demand,
    /// never below `min_outlet_pressure`.
    MatchDemand { min_outlet_pressure: Pressure },
}

/// Work-extracting turbine.
///
/// ## Model
///
/// Combustion gas expands as a calorically perfect gas:
///
/// ```text
/// Δh_s = cp·T_in·(1 − (p_out/p_in)^((γ−1)/γ))
/// ```
///
/// Propellant gases (expander cycles) use a constant-entropy lookup instead.
/// Actual drop Δh = η·Δh_s; delivered power ṁ·Δh is reported as negative
/// shaft power.
#[derive(Debug, Clone, PartialEq)]
pub struct Turbine {
    efficiency: f64,
    mode: TurbineMode,
}

impl Turbine {
    pub fn new(efficiency: f64, mode: TurbineMode) -> ComponentResult<Self> {
        check_efficiency(efficiency, "turbine efficiency must be in (0,1]")?;
        match mode {
            TurbineMode::PressureRatio(r) if r.is_finite() && r >= 1.0 => {}
            TurbineMode::OutletPressure(p) | TurbineMode::MatchDemand { min_outlet_pressure: p }
                if p.value.is_finite() && p.value > 0.0 => {}
            _ => {
                return Err(ComponentError::InvalidArg {
                    what: "turbine pressure ratio must be >= 1 and pressures positive",
                });
            }
        }
        Ok(Self { efficiency, mode })
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn mode(&self) -> TurbineMode {
        self.mode
    }

    /// Outlet state and specific work for expansion to `p_out`.
    fn expand(
        &self,
        adapter: &PropertyAdapter<'_>,
        inlet: &FlowState,
        p_out: Pressure,
    ) -> ComponentResult<(FlowState, f64)> {
        if p_out > inlet.pressure {
            return Err(ComponentError::Infeasible {
                what: format!(
                    "turbine outlet {:.2} bar above inlet {:.2} bar",
                    p_out.get::<bar>(),
                    inlet.pressure.get::<bar>()
                ),
            });
        }
        let p_in = inlet.pressure.get::<pascal>();

        let dh_s = match &inlet.fluid {
            FlowFluid::Combustion(gas) => isentropic_enthalpy_drop(
                gas.cp,
                gas.gamma,
                inlet.temperature.get::<kelvin>(),
                p_out.get::<pascal>() / p_in,
            ),
            FlowFluid::Propellant(prop) => {
                let at_inlet = adapter.property_lookup(
                    *prop,
                    StateInput::PT {
                        p: inlet.pressure,
                        t: inlet.temperature,
                    },
                )?;
                let isentropic =
                    adapter.property_lookup(*prop, StateInput::PS { p: p_out, s: at_inlet.s })?;
                at_inlet.h - isentropic.h
            }
        };
        let dh = self.efficiency * dh_s;
        check_finite(dh, "turbine enthalpy drop")?;

        let outlet = inlet.at_ph(adapter, p_out, inlet.enthalpy - dh)?;
        Ok((outlet, dh))
    }

    /// Outlet pressure whose delivered power equals `demand`.
    fn match_demand(
        &self,
        adapter: &PropertyAdapter<'_>,
        inlet: &FlowState,
        demand: f64,
        min_outlet: Pressure,
    ) -> ComponentResult<(FlowState, f64)> {
        let m = inlet.mass_flow.value;
        if demand <= 0.0 {
            return self.expand(adapter, inlet, inlet.pressure);
        }

        let floor = min_outlet.value.min(inlet.pressure.value);
        let (deepest, dh_max) = self.expand(adapter, inlet, pa(floor))?;
        let available = m * dh_max;
        if available < demand {
            return Err(ComponentError::InfeasiblePressureRatio {
                demand_w: demand,
                available_w: available,
                min_outlet_pressure: floor,
            });
        }
        if available == demand {
            return Ok((deepest, dh_max));
        }

        // Delivered power falls monotonically as the outlet pressure rises.
        let mut lo = floor;
        let mut hi = inlet.pressure.value;
        for _ in 0..MAX_ITER {
            let mid = 0.5 * (lo + hi);
            let (_, dh) = self.expand(adapter, inlet, pa(mid))?;
            if m * dh > demand {
                lo = mid;
            } else {
                hi = mid;
            }
            if (hi - lo) <= 1e-12 * inlet.pressure.value {
                break;
            }
        }
        self.expand(adapter, inlet, pa(0.5 * (lo + hi)))
    }
}

impl UnitModel for Turbine {
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
        let m = require_flow(inlet, "turbine mass flow must be positive")?;
        let p_in = inlet.pressure.value;

        let demand_mode = inputs.discharge_pressure().is_none()
            && inputs.pressure_ratio().is_none()
            && matches!(self.mode, TurbineMode::MatchDemand { .. });

        let (outlet, dh) = match (inputs.discharge_pressure(), inputs.pressure_ratio(), self.mode) {
            (Some(p_out), _, _) | (None, None, TurbineMode::OutletPressure(p_out)) => {
                self.expand(adapter, inlet, p_out)?
            }
            (None, Some(r), _) | (None, None, TurbineMode::PressureRatio(r)) => {
                if !(r >= 1.0) {
                    return Err(ComponentError::NonPhysical {
                        what: "turbine pressure ratio below 1",
                    });
                }
                self.expand(adapter, inlet, pa(p_in / r))?
            }
            (None, None, TurbineMode::MatchDemand { min_outlet_pressure }) => {
                let demand = inputs.shaft_demand.ok_or(ComponentError::InvalidArg {
                    what: "demand-matching turbine is not on a shaft",
                })?;
                self.match_demand(adapter, inlet, demand.value, min_outlet_pressure)?
            }
        };

        let delivered = m * dh;
        let mut out = ComponentOutput::new(vec![outlet]).with_shaft_power(watts(-delivered));
        if let (Some(demand), false) = (inputs.shaft_demand, demand_mode) {
            out.push_balance(
                BalanceKind::ShaftPower,
                relative_residual(delivered, demand.value, 1.0),
            );
        }
        Ok(out)
    }
}
