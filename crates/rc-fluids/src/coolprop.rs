//! CoolProp-backed property engine via `rfluids`.

use crate::error::{FluidError, FluidResult};
use crate::model::{Envelope, PropertyEngine};
use crate::propellant::Propellant;
use crate::state::{FluidProperties, Phase, StateInput};
use rc_core::units::{k, kgpm3, mps, pa, pas};
use rfluids::prelude::*;
use uom::si::pressure::pascal;
use uom::si::thermodynamic_temperature::kelvin;

const MAX_ITER: usize = 100;
const LOWER_BRACKET_STEPS: usize = 20;

/// Compressibility factor below which a state is reported as liquid.
const LIQUID_Z: f64 = 0.3;

/// Real-fluid properties from CoolProp's Helmholtz equations of state.
///
/// rfluids `Fluid` instances are created per query, so the engine holds no
/// mutable state and is shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct CoolPropEngine;

impl CoolPropEngine {
    pub fn new() -> Self {
        Self
    }

    fn fluid_at_pt(&self, fluid: Propellant, p_pa: f64, t_k: f64) -> FluidResult<Fluid> {
        Fluid::from(fluid.rfluids_pure())
            .in_state(FluidInput::pressure(p_pa), FluidInput::temperature(t_k))
            .map_err(|e| FluidError::Backend {
                message: format!("rfluids error for {fluid} at P={p_pa} Pa, T={t_k} K: {e}"),
            })
    }

    fn enthalpy_at(&self, fluid: Propellant, p_pa: f64, t_k: f64) -> FluidResult<f64> {
        self.fluid_at_pt(fluid, p_pa, t_k)?
            .enthalpy()
            .map_err(|e| FluidError::Backend {
                message: format!("rfluids error getting enthalpy: {e}"),
            })
    }

    fn entropy_at(&self, fluid: Propellant, p_pa: f64, t_k: f64) -> FluidResult<f64> {
        self.fluid_at_pt(fluid, p_pa, t_k)?
            .entropy()
            .map_err(|e| FluidError::Backend {
                message: format!("rfluids error getting entropy: {e}"),
            })
    }

    /// Invert a property monotonic in T at fixed pressure by bisection over
    /// the envelope temperature range.
    fn solve_t<F>(
        &self,
        fluid: Propellant,
        env: &Envelope,
        what: &'static str,
        target: f64,
        property: F,
    ) -> FluidResult<f64>
    where
        F: Fn(f64) -> FluidResult<f64>,
    {
        let mut t_low = env.t_min;
        let mut t_high = env.t_max;

        // At high pressure the melting line sits above the triple point;
        // step the lower bracket up until the backend accepts it.
        let mut y_low = property(t_low);
        for _ in 0..LOWER_BRACKET_STEPS {
            if y_low.is_ok() {
                break;
            }
            t_low += 0.5;
            y_low = property(t_low);
        }
        let y_low = y_low?;
        let y_high = property(t_high)?;

        if target < y_low || target > y_high {
            return Err(FluidError::OutOfRange {
                fluid: fluid.name().to_string(),
                what,
                value: target,
                min: y_low,
                max: y_high,
            });
        }

        let tol = 1e-3_f64.max(target.abs() * 1e-9);
        for _ in 0..MAX_ITER {
            let t_mid = 0.5 * (t_low + t_high);
            let y_mid = property(t_mid)?;
            if (y_mid - target).abs() < tol || t_high - t_low < 1e-9 {
                return Ok(t_mid);
            }
            if y_mid < target {
                t_low = t_mid;
            } else {
                t_high = t_mid;
            }
        }

        Ok(0.5 * (t_low + t_high))
    }

    fn pack(&self, fluid: Propellant, p_pa: f64, t_k: f64) -> FluidResult<FluidProperties> {
        let mut state = self.fluid_at_pt(fluid, p_pa, t_k)?;
        let rho = state.density().map_err(|e| backend("density", e))? * fluid.density_correction();
        let h = state.enthalpy().map_err(|e| backend("enthalpy", e))?;
        let s = state.entropy().map_err(|e| backend("entropy", e))?;
        let cp = state.specific_heat().map_err(|e| backend("cp", e))?;
        let cv = state
            .specific_heat_const_volume()
            .map_err(|e| backend("cv", e))?;
        let a = state.sound_speed().map_err(|e| backend("sound speed", e))?;

        if rho <= 0.0 || cp <= 0.0 || cv <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "CoolProp returned non-positive density or heat capacity",
            });
        }

        let z = p_pa / (rho * fluid.specific_gas_constant() * t_k);
        let phase = if z < LIQUID_Z { Phase::Liquid } else { Phase::Gas };

        Ok(FluidProperties {
            p: pa(p_pa),
            t: k(t_k),
            rho: kgpm3(rho),
            h,
            s,
            cp,
            gamma: cp / cv,
            a: mps(a),
            viscosity: state.dynamic_viscosity().ok().map(pas),
            conductivity: state.conductivity().ok(),
            phase,
        })
    }
}

fn backend(what: &str, e: impl std::fmt::Display) -> FluidError {
    FluidError::Backend {
        message: format!("rfluids error getting {what}: {e}"),
    }
}

impl PropertyEngine for CoolPropEngine {
    fn name(&self) -> &str {
        "CoolProp"
    }

    fn envelope(&self, fluid: Propellant) -> FluidResult<Envelope> {
        // Triple point (or lower EOS limit) to the upper EOS limit.
        Ok(match fluid {
            Propellant::Lox => Envelope::new(1.0e3, 8.0e7, 54.361, 2000.0),
            Propellant::Lh2 => Envelope::new(1.0e3, 2.0e8, 13.957, 1000.0),
            Propellant::Lch4 => Envelope::new(1.0e3, 1.0e8, 90.694, 625.0),
            Propellant::Rp1 => Envelope::new(1.0e3, 7.0e7, 263.6, 700.0),
            Propellant::Helium => Envelope::new(1.0e3, 1.0e8, 2.2, 2000.0),
        })
    }

    fn properties(&self, fluid: Propellant, input: StateInput) -> FluidResult<FluidProperties> {
        let env = self.envelope(fluid)?;
        let p_pa = input.pressure().get::<pascal>();
        env.check_pressure(fluid, p_pa)?;

        let t_k = match input {
            StateInput::PT { t, .. } => {
                let t_k = t.get::<kelvin>();
                env.check_temperature(fluid, t_k)?;
                t_k
            }
            StateInput::PH { h, .. } => {
                if !h.is_finite() {
                    return Err(FluidError::NonPhysical { what: "enthalpy" });
                }
                self.solve_t(fluid, &env, "enthalpy", h, |t| {
                    self.enthalpy_at(fluid, p_pa, t)
                })?
            }
            StateInput::PS { s, .. } => {
                if !s.is_finite() {
                    return Err(FluidError::NonPhysical { what: "entropy" });
                }
                self.solve_t(fluid, &env, "entropy", s, |t| self.entropy_at(fluid, p_pa, t))?
            }
        };

        self.pack(fluid, p_pa, t_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_core::units::bar;

    #[test]
    fn lox_at_storage_is_liquid() {
        let engine = CoolPropEngine::new();
        let props = engine
            .properties(
                Propellant::Lox,
                StateInput::PT {
                    p: bar(2.0),
                    t: Propellant::Lox.storage_temperature(),
                },
            )
            .unwrap();
        assert_eq!(props.phase, Phase::Liquid);
        assert!(props.rho.value > 1000.0 && props.rho.value < 1250.0);
    }

    #[test]
    fn ph_round_trip_hydrogen_gas() {
        let engine = CoolPropEngine::new();
        let pt = engine
            .properties(Propellant::Lh2, StateInput::PT { p: bar(50.0), t: k(250.0) })
            .unwrap();
        assert_eq!(pt.phase, Phase::Gas);
        let ph = engine
            .properties(Propellant::Lh2, StateInput::PH { p: bar(50.0), h: pt.h })
            .unwrap();
        assert!((ph.t.value - 250.0).abs() < 0.01);
    }

    #[test]
    fn beyond_envelope_fails() {
        let engine = CoolPropEngine::new();
        let env = engine.envelope(Propellant::Helium).unwrap();
        let res = engine.properties(
            Propellant::Helium,
            StateInput::PT { p: bar(10.0), t: k(env.t_max + 1.0) },
        );
        assert!(matches!(res, Err(FluidError::OutOfRange { .. })));
    }
}
