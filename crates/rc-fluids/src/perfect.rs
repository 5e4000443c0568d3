//! Analytic property engine: incompressible liquids and calorically
//! perfect gases with tabulated validity envelopes.
//!
//! Deterministic and cheap; used for tests and for quick sizing runs where
//! CoolProp accuracy is not needed.

use crate::error::{FluidError, FluidResult};
use crate::model::{Envelope, PropertyEngine};
use crate::propellant::Propellant;
use crate::state::{FluidProperties, Phase, StateInput};
use rc_core::units::constants::{R_UNIVERSAL, T_REFERENCE_K};
use rc_core::units::{k, kgpm3, mps, pa, pas};
use std::collections::BTreeMap;
use uom::si::pressure::pascal;
use uom::si::thermodynamic_temperature::kelvin;

/// Reference pressure for enthalpy and entropy [Pa].
const P_REFERENCE: f64 = 101_325.0;

/// Constant-property fluid model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerfectFluid {
    /// Incompressible liquid: h = cp·(T − T_ref) + (p − p_ref)/ρ.
    Liquid {
        /// [kg/m³]
        density: f64,
        /// [J/(kg·K)]
        cp: f64,
        /// [m/s]
        sound_speed: f64,
        /// [Pa·s]
        viscosity: f64,
        /// [W/(m·K)]
        conductivity: f64,
    },
    /// Calorically perfect ideal gas.
    Gas {
        /// [kg/mol]
        molar_mass: f64,
        cp: f64,
        viscosity: f64,
        conductivity: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    model: PerfectFluid,
    envelope: Envelope,
}

/// Property engine built from a table of `PerfectFluid` entries.
#[derive(Debug, Clone)]
pub struct PerfectFluidEngine {
    table: BTreeMap<Propellant, Entry>,
}

impl PerfectFluidEngine {
    /// Default table covering the whole propellant catalogue.
    pub fn new() -> Self {
        let mut engine = Self {
            table: BTreeMap::new(),
        };
        let liquid_p = (1.0e3, 1.0e8);

        engine.insert(
            Propellant::Lox,
            PerfectFluid::Liquid {
                density: 1141.0,
                cp: 1699.0,
                sound_speed: 900.0,
                viscosity: 1.9e-4,
                conductivity: 0.15,
            },
            Envelope::new(liquid_p.0, liquid_p.1, 54.4, 154.5),
        );
        engine.insert(
            Propellant::Lh2,
            PerfectFluid::Liquid {
                density: 70.85,
                cp: 9690.0,
                sound_speed: 1100.0,
                viscosity: 1.3e-5,
                conductivity: 0.1,
            },
            Envelope::new(liquid_p.0, liquid_p.1, 13.96, 33.0),
        );
        engine.insert(
            Propellant::Lch4,
            PerfectFluid::Liquid {
                density: 422.6,
                cp: 3481.0,
                sound_speed: 1400.0,
                viscosity: 1.2e-4,
                conductivity: 0.19,
            },
            Envelope::new(liquid_p.0, liquid_p.1, 90.7, 190.0),
        );
        engine.insert(
            Propellant::Rp1,
            PerfectFluid::Liquid {
                density: 810.0,
                cp: 2010.0,
                sound_speed: 1300.0,
                viscosity: 1.5e-3,
                conductivity: 0.13,
            },
            Envelope::new(liquid_p.0, liquid_p.1, 220.0, 600.0),
        );
        engine.insert(
            Propellant::Helium,
            PerfectFluid::Gas {
                molar_mass: Propellant::Helium.molar_mass(),
                cp: 5193.0,
                viscosity: 2.0e-5,
                conductivity: 0.15,
            },
            Envelope::new(1.0e3, 1.0e8, 2.2, 2000.0),
        );
        engine
    }

    /// Replace (or add) the model for one propellant.
    pub fn with_fluid(mut self, fluid: Propellant, model: PerfectFluid, envelope: Envelope) -> Self {
        self.insert(fluid, model, envelope);
        self
    }

    fn insert(&mut self, fluid: Propellant, model: PerfectFluid, envelope: Envelope) {
        self.table.insert(fluid, Entry { model, envelope });
    }

    fn entry(&self, fluid: Propellant) -> FluidResult<&Entry> {
        self.table.get(&fluid).ok_or(FluidError::NotSupported {
            what: "propellant missing from perfect-fluid table",
        })
    }
}

impl Default for PerfectFluidEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfectFluid {
    /// Temperature from the inverse of the enthalpy/entropy relations.
    fn temperature(&self, input: StateInput) -> f64 {
        match (*self, input) {
            (_, StateInput::PT { t, .. }) => t.get::<kelvin>(),
            (PerfectFluid::Liquid { density, cp, .. }, StateInput::PH { p, h }) => {
                T_REFERENCE_K + (h - (p.get::<pascal>() - P_REFERENCE) / density) / cp
            }
            (PerfectFluid::Liquid { cp, .. }, StateInput::PS { s, .. }) => {
                T_REFERENCE_K * (s / cp).exp()
            }
            (PerfectFluid::Gas { cp, .. }, StateInput::PH { h, .. }) => T_REFERENCE_K + h / cp,
            (PerfectFluid::Gas { molar_mass, cp, .. }, StateInput::PS { p, s }) => {
                let r = R_UNIVERSAL / molar_mass;
                T_REFERENCE_K * ((s + r * (p.get::<pascal>() / P_REFERENCE).ln()) / cp).exp()
            }
        }
    }

    fn properties_at(&self, p: f64, t: f64) -> FluidProperties {
        match *self {
            PerfectFluid::Liquid {
                density,
                cp,
                sound_speed,
                viscosity,
                conductivity,
            } => FluidProperties {
                p: pa(p),
                t: k(t),
                rho: kgpm3(density),
                h: cp * (t - T_REFERENCE_K) + (p - P_REFERENCE) / density,
                s: cp * (t / T_REFERENCE_K).ln(),
                cp,
                gamma: 1.0,
                a: mps(sound_speed),
                viscosity: Some(pas(viscosity)),
                conductivity: Some(conductivity),
                phase: Phase::Liquid,
            },
            PerfectFluid::Gas {
                molar_mass,
                cp,
                viscosity,
                conductivity,
            } => {
                let r = R_UNIVERSAL / molar_mass;
                let gamma = cp / (cp - r);
                FluidProperties {
                    p: pa(p),
                    t: k(t),
                    rho: kgpm3(p / (r * t)),
                    h: cp * (t - T_REFERENCE_K),
                    s: cp * (t / T_REFERENCE_K).ln() - r * (p / P_REFERENCE).ln(),
                    cp,
                    gamma,
                    a: mps((gamma * r * t).sqrt()),
                    viscosity: Some(pas(viscosity)),
                    conductivity: Some(conductivity),
                    phase: Phase::Gas,
                }
            }
        }
    }
}

impl PropertyEngine for PerfectFluidEngine {
    fn name(&self) -> &str {
        "perfect"
    }

    fn envelope(&self, fluid: Propellant) -> FluidResult<Envelope> {
        Ok(self.entry(fluid)?.envelope)
    }

    fn properties(&self, fluid: Propellant, input: StateInput) -> FluidResult<FluidProperties> {
        let entry = self.entry(fluid)?;
        let p = input.pressure().get::<pascal>();
        entry.envelope.check_pressure(fluid, p)?;
        let t = entry.model.temperature(input);
        entry.envelope.check_temperature(fluid, t)?;
        Ok(entry.model.properties_at(p, t))
    }
}
