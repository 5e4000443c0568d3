//! Thrust nozzle (cycle sink).

use crate::common::{check_finite, expect_inlets, require_flow};
use crate::error::{ComponentError, ComponentResult};
use crate::isentropic::{
    area_ratio, characteristic_velocity, critical_pressure_ratio, exhaust_velocity, exit_mach,
    pressure_ratio_from_area_ratio, thrust_coefficient,
};
use crate::traits::{ComponentOutput, EvalInputs, UnitModel};
use rc_core::units::constants::G0_MPS2;
use rc_core::units::{Area, Force, MassRate, Pressure, Time, Velocity, m2, mps, newtons, pa, s};
use rc_fluids::{FlowFluid, PropertyAdapter};
use rc_graph::Arity;

/// Minimum exit-to-ambient pressure ratio before the flow separates
/// (Summerfield criterion).
pub const SUMMERFIELD_LIMIT: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NozzleExpansion {
    ExitPressure(Pressure),
    /// Exit to throat area ratio ε ≥ 1.
    AreaRatio(f64),
}

/// Nozzle performance at the evaluated operating point.
#[derive(Debug, Clone, PartialEq)]
pub struct NozzlePerformance {
    pub mass_flow: MassRate,
    pub chamber_pressure: Pressure,
    pub exit_pressure: Pressure,
    pub ambient_pressure: Pressure,
    pub exit_mach: f64,
    pub exit_velocity: Velocity,
    pub c_star: Velocity,
    pub thrust_coefficient: f64,
    pub throat_area: Area,
    pub exit_area: Area,
    pub area_ratio: f64,
    pub quality_factor: f64,
    pub thrust: Force,
    pub specific_impulse: Time,
    pub choked: bool,
}

/// Isentropic expansion of the inlet gas.
///
/// ```text
/// At = ṁ·c*/pc
/// F  = q·(ṁ·ve + (pe − pa)·Ae) = q·CF·pc·At
/// Isp = F / (ṁ·g0)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Nozzle {
    expansion: NozzleExpansion,
    ambient_pressure: Pressure,
    quality_factor: Option<f64>,
}

impl Nozzle {
    pub fn new(expansion: NozzleExpansion, ambient_pressure: Pressure) -> ComponentResult<Self> {
        match expansion {
            NozzleExpansion::ExitPressure(p) if p.value.is_finite() && p.value > 0.0 => {}
            NozzleExpansion::AreaRatio(eps) if eps.is_finite() && eps >= 1.0 => {}
            _ => {
                return Err(ComponentError::InvalidArg {
                    what: "nozzle exit pressure must be positive and area ratio at least 1",
                });
            }
        }
        check_finite(ambient_pressure.value, "ambient pressure")?;
        if ambient_pressure.value < 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "ambient pressure cannot be negative",
            });
        }
        Ok(Self {
            expansion,
            ambient_pressure,
            quality_factor: None,
        })
    }

    /// Override the Isp quality factor (default: the propellant pair's, or
    /// 1 for non-combustion gas).
    pub fn with_quality_factor(mut self, q: f64) -> ComponentResult<Self> {
        if !(q > 0.0 && q <= 1.0) {
            return Err(ComponentError::InvalidArg {
                what: "quality factor must be in (0,1]",
            });
        }
        self.quality_factor = Some(q);
        Ok(self)
    }

    pub fn expansion(&self) -> NozzleExpansion {
        self.expansion
    }

    pub fn ambient_pressure(&self) -> Pressure {
        self.ambient_pressure
    }
}

impl UnitModel for Nozzle {
    fn arity(&self) -> Arity {
        Arity::SINK
    }

    fn evaluate(
        &self,
        adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput> {
        expect_inlets(inputs.inlets, 1)?;
        let inlet = &inputs.inlets[0];
        let m = require_flow(inlet, "nozzle mass flow must be positive")?;
        let gas = inlet.gas_properties(adapter)?;
        let gamma = gas.gamma;
        if !(gamma > 1.0) {
            return Err(ComponentError::NonPhysical {
                what: "nozzle gas needs gamma > 1",
            });
        }
        let r = gas.specific_gas_constant();
        let pc = inlet.pressure.value;
        let tc = inlet.temperature.value;
        let pa_amb = self.ambient_pressure.value;

        let pr = match self.expansion {
            NozzleExpansion::ExitPressure(pe) => pe.value / pc,
            NozzleExpansion::AreaRatio(eps) => pressure_ratio_from_area_ratio(gamma, eps)?,
        };
        if !(pr > 0.0 && pr < 1.0) {
            return Err(ComponentError::Infeasible {
                what: format!("nozzle exit pressure ratio {pr:.4} must lie in (0, 1)"),
            });
        }
        let pe = pr * pc;
        if pa_amb > 0.0 && pe / pa_amb < SUMMERFIELD_LIMIT {
            return Err(ComponentError::FlowSeparation {
                exit_pressure: pe,
                ambient: pa_amb,
            });
        }

        let mut out = ComponentOutput::new(Vec::new());
        let choked = pc / pa_amb.max(f64::MIN_POSITIVE) >= critical_pressure_ratio(gamma);
        if !choked {
            out.warnings.push(format!(
                "nozzle unchoked: pc/pa = {:.3} below critical {:.3}",
                pc / pa_amb,
                critical_pressure_ratio(gamma)
            ));
        }

        let c_star = characteristic_velocity(gamma, r, tc);
        let eps = area_ratio(gamma, pr);
        let cf = thrust_coefficient(gamma, pr, pa_amb / pc, eps);
        let throat = m * c_star / pc;
        let quality = self.quality_factor.unwrap_or(match &inlet.fluid {
            FlowFluid::Combustion(g) => g.pair.isp_quality_factor(),
            FlowFluid::Propellant(_) => 1.0,
        });
        let thrust = quality * cf * pc * throat;
        check_finite(thrust, "nozzle thrust")?;

        out.nozzle = Some(NozzlePerformance {
            mass_flow: inlet.mass_flow,
            chamber_pressure: inlet.pressure,
            exit_pressure: pa(pe),
            ambient_pressure: self.ambient_pressure,
            exit_mach: exit_mach(gamma, pr),
            exit_velocity: mps(exhaust_velocity(gamma, r, tc, pr)),
            c_star: mps(c_star),
            thrust_coefficient: cf,
            throat_area: m2(throat),
            exit_area: m2(eps * throat),
            area_ratio: eps,
            quality_factor: quality,
            thrust: newtons(thrust),
            specific_impulse: s(thrust / (m * G0_MPS2)),
            choked,
        });
        Ok(out)
    }
}
