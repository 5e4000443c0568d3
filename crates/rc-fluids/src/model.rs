//! Property engine abstraction and validity envelopes.

use crate::error::{FluidError, FluidResult};
use crate::propellant::Propellant;
use crate::state::{FluidProperties, StateInput};

/// Rectangular pressure/temperature region where an engine is trusted.
///
/// Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// [Pa]
    pub p_min: f64,
    /// [Pa]
    pub p_max: f64,
    /// [K]
    pub t_min: f64,
    /// [K]
    pub t_max: f64,
}

impl Envelope {
    pub const fn new(p_min: f64, p_max: f64, t_min: f64, t_max: f64) -> Self {
        Self {
            p_min,
            p_max,
            t_min,
            t_max,
        }
    }

    pub fn contains(&self, p: f64, t: f64) -> bool {
        (self.p_min..=self.p_max).contains(&p) && (self.t_min..=self.t_max).contains(&t)
    }

    pub fn check_pressure(&self, fluid: Propellant, p: f64) -> FluidResult<()> {
        if !p.is_finite() {
            return Err(FluidError::NonPhysical { what: "pressure" });
        }
        if p < self.p_min || p > self.p_max {
            return Err(FluidError::OutOfRange {
                fluid: fluid.name().to_string(),
                what: "pressure",
                value: p,
                min: self.p_min,
                max: self.p_max,
            });
        }
        Ok(())
    }

    pub fn check_temperature(&self, fluid: Propellant, t: f64) -> FluidResult<()> {
        if !t.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "temperature",
            });
        }
        if t < self.t_min || t > self.t_max {
            return Err(FluidError::OutOfRange {
                fluid: fluid.name().to_string(),
                what: "temperature",
                value: t,
                min: self.t_min,
                max: self.t_max,
            });
        }
        Ok(())
    }

    pub fn check(&self, fluid: Propellant, p: f64, t: f64) -> FluidResult<()> {
        self.check_pressure(fluid, p)?;
        self.check_temperature(fluid, t)
    }
}

/// Thermophysical property backend.
///
/// Implementations must be thread-safe; sweeps share one engine across
/// worker threads.
pub trait PropertyEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Validity envelope for `fluid`.
    fn envelope(&self, fluid: Propellant) -> FluidResult<Envelope>;

    /// Full property set at the state given by `input`.
    ///
    /// Fails with `FluidError::OutOfRange` outside the envelope.
    fn properties(&self, fluid: Propellant, input: StateInput) -> FluidResult<FluidProperties>;
}
