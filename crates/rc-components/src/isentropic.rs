//! Ideal rocket theory relations for a calorically perfect gas.
//!
//! Pressure ratios are exit over chamber (`pe/pc` < 1) unless noted.

use crate::error::{ComponentError, ComponentResult};

/// Vandenkerckhove function Γ(γ).
pub fn vandenkerckhove(gamma: f64) -> f64 {
    gamma.sqrt() * (2.0 / (gamma + 1.0)).powf((gamma + 1.0) / (2.0 * (gamma - 1.0)))
}

/// Characteristic velocity c* = √(R·Tc) / Γ [m/s].
pub fn characteristic_velocity(gamma: f64, r_specific: f64, t_chamber: f64) -> f64 {
    (r_specific * t_chamber).sqrt() / vandenkerckhove(gamma)
}

/// Momentum thrust coefficient for expansion to `pe/pc`.
pub fn thrust_coefficient_ideal(gamma: f64, pressure_ratio: f64) -> f64 {
    vandenkerckhove(gamma) * expansion_term(gamma, pressure_ratio).sqrt()
}

/// Thrust coefficient including the (pe − pa)·ε pressure term.
pub fn thrust_coefficient(gamma: f64, pressure_ratio: f64, ambient_ratio: f64, area_ratio: f64) -> f64 {
    thrust_coefficient_ideal(gamma, pressure_ratio) + (pressure_ratio - ambient_ratio) * area_ratio
}

/// Nozzle area ratio Ae/At for expansion to `pe/pc`.
pub fn area_ratio(gamma: f64, pressure_ratio: f64) -> f64 {
    vandenkerckhove(gamma) / (pressure_ratio.powf(1.0 / gamma) * expansion_term(gamma, pressure_ratio).sqrt())
}

/// Supersonic-branch `pe/pc` for an area ratio ε ≥ 1.
pub fn pressure_ratio_from_area_ratio(gamma: f64, area_ratio_target: f64) -> ComponentResult<f64> {
    if !(area_ratio_target >= 1.0) || !area_ratio_target.is_finite() {
        return Err(ComponentError::InvalidArg {
            what: "nozzle area ratio must be at least 1",
        });
    }
    let throat = 1.0 / critical_pressure_ratio(gamma);
    if area_ratio_target == 1.0 {
        return Ok(throat);
    }

    // ε falls monotonically from ∞ to 1 as pe/pc rises to the throat value;
    // bisect in log space.
    let mut lo = (1e-12_f64).ln();
    let mut hi = throat.ln();
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if area_ratio(gamma, mid.exp()) > area_ratio_target {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-13 {
            break;
        }
    }
    Ok((0.5 * (lo + hi)).exp())
}

/// Exit Mach number for expansion to `pe/pc`.
pub fn exit_mach(gamma: f64, pressure_ratio: f64) -> f64 {
    (2.0 / (gamma - 1.0) * (pressure_ratio.powf(-(gamma - 1.0) / gamma) - 1.0)).sqrt()
}

/// Exhaust velocity [m/s] for expansion to `pe/pc`.
pub fn exhaust_velocity(gamma: f64, r_specific: f64, t_chamber: f64, pressure_ratio: f64) -> f64 {
    (r_specific * t_chamber * expansion_term(gamma, pressure_ratio)).sqrt()
}

/// Chamber-to-throat pressure ratio pc/p* at which flow chokes.
pub fn critical_pressure_ratio(gamma: f64) -> f64 {
    ((gamma + 1.0) / 2.0).powf(gamma / (gamma - 1.0))
}

/// Ideal-gas isentropic enthalpy drop cp·T·(1 − (p_out/p_in)^((γ−1)/γ)).
pub fn isentropic_enthalpy_drop(cp: f64, gamma: f64, t_in: f64, outlet_ratio: f64) -> f64 {
    cp * t_in * (1.0 - outlet_ratio.powf((gamma - 1.0) / gamma))
}

/// Eucken-type Prandtl number estimate 4γ/(9γ − 5).
pub fn prandtl_estimate(gamma: f64) -> f64 {
    4.0 * gamma / (9.0 * gamma - 5.0)
}

/// 2γ/(γ−1)·(1 − (pe/pc)^((γ−1)/γ))
fn expansion_term(gamma: f64, pressure_ratio: f64) -> f64 {
    2.0 * gamma / (gamma - 1.0) * (1.0 - pressure_ratio.powf((gamma - 1.0) / gamma))
}
