//! Stage mass and ideal Δv from a solved engine.
//!
//! Propellant mass is the tank flow over the burn time, scaled by a
//! margin for residuals. The final (burnout) mass is the user's dry mass
//! plus every electric drive. Ideal Δv is `Isp·g0·ln(m0/mf)`.

use rc_core::units::constants::G0_MPS2;
use serde::{Deserialize, Serialize};

use crate::error::{PerfError, PerfResult};
use crate::evaluate::EnginePerformance;

/// Inputs that close the stage mass around an engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassBudget {
    pub burn_time_s: f64,
    /// Structure, tanks and engine hardware without electric drives.
    pub dry_mass_kg: f64,
    /// Loaded over burned propellant, at least 1.
    #[serde(default = "default_margin")]
    pub propellant_margin: f64,
}

fn default_margin() -> f64 {
    1.0
}

impl MassBudget {
    pub fn new(burn_time_s: f64, dry_mass_kg: f64) -> PerfResult<Self> {
        Self {
            burn_time_s,
            dry_mass_kg,
            propellant_margin: default_margin(),
        }
        .validated()
    }

    pub fn with_propellant_margin(mut self, margin: f64) -> PerfResult<Self> {
        self.propellant_margin = margin;
        self.validated()
    }

    /// Check a budget built field by field (e.g. deserialized).
    pub fn validated(self) -> PerfResult<Self> {
        if !(self.burn_time_s.is_finite() && self.burn_time_s > 0.0) {
            return Err(PerfError::invalid("burn time must be positive"));
        }
        if !(self.dry_mass_kg.is_finite() && self.dry_mass_kg >= 0.0) {
            return Err(PerfError::invalid("dry mass cannot be negative"));
        }
        if !(self.propellant_margin.is_finite() && self.propellant_margin >= 1.0) {
            return Err(PerfError::invalid("propellant margin must be at least 1"));
        }
        Ok(self)
    }

    pub fn evaluate(&self, performance: &EnginePerformance) -> PerfResult<BudgetReport> {
        let propellant = performance.tank_mdot_kg_s * self.burn_time_s * self.propellant_margin;
        let electric = performance.electric_mass_kg();
        let final_mass = self.dry_mass_kg + electric;
        let initial_mass = final_mass + propellant;
        if !(final_mass > 0.0) {
            return Err(PerfError::invalid("stage has no burnout mass"));
        }
        let report = BudgetReport {
            isp_s: performance.isp_s,
            propellant_mass_kg: propellant,
            electric_mass_kg: electric,
            final_mass_kg: final_mass,
            initial_mass_kg: initial_mass,
            ideal_delta_v_m_s: performance.isp_s * G0_MPS2 * (initial_mass / final_mass).ln(),
        };
        if !report.ideal_delta_v_m_s.is_finite() {
            return Err(PerfError::invalid("ideal delta-v is not finite"));
        }
        Ok(report)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub isp_s: f64,
    pub propellant_mass_kg: f64,
    pub electric_mass_kg: f64,
    pub final_mass_kg: f64,
    pub initial_mass_kg: f64,
    pub ideal_delta_v_m_s: f64,
}

impl BudgetReport {
    pub fn mass_ratio(&self) -> f64 {
        self.initial_mass_kg / self.final_mass_kg
    }

    /// Ideal Δv with a payload riding along [m/s].
    pub fn delta_v_with_payload(&self, payload_kg: f64) -> f64 {
        let ratio = (self.initial_mass_kg + payload_kg) / (self.final_mass_kg + payload_kg);
        self.isp_s * G0_MPS2 * ratio.ln()
    }

    /// Largest payload that still reaches `delta_v` [kg]; `None` when the
    /// empty stage falls short.
    pub fn payload_for_delta_v(&self, delta_v: f64) -> Option<f64> {
        let e = (delta_v / (self.isp_s * G0_MPS2)).exp();
        let payload = (self.initial_mass_kg - self.final_mass_kg * e) / (e - 1.0);
        (payload.is_finite() && payload >= 0.0).then_some(payload)
    }

    /// Ideal Δv less gravity loss over a burn flown `vertical_fraction`
    /// upward [m/s].
    pub fn gravity_delta_v(&self, burn_time_s: f64, vertical_fraction: f64) -> f64 {
        self.ideal_delta_v_m_s - G0_MPS2 * burn_time_s * vertical_fraction
    }
}
