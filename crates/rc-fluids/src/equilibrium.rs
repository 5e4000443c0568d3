//! Combustion equilibrium engines.

use crate::composition::{Composition, Species};
use crate::error::{FluidError, FluidResult};
use crate::propellant::PropellantPair;
use rc_core::units::constants::R_UNIVERSAL;
use rc_core::units::{Pressure, Temperature, k};

/// Frozen combustion products at chamber conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct CombustionProducts {
    pub flame_temperature: Temperature,
    /// Mean molar mass [kg/mol]
    pub molar_mass: f64,
    pub gamma: f64,
    /// [J/(kg·K)]
    pub cp: f64,
    pub composition: Composition,
}

impl CombustionProducts {
    /// R/M [J/(kg·K)]
    pub fn specific_gas_constant(&self) -> f64 {
        R_UNIVERSAL / self.molar_mass
    }
}

/// Chemical-equilibrium backend.
pub trait EquilibriumEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Adiabatic combustion of `pair` at chamber pressure and O/F mass ratio.
    ///
    /// Fails with `FluidError::ConvergenceFailed` when no equilibrium state
    /// can be produced.
    fn combust(
        &self,
        chamber_pressure: Pressure,
        mixture_ratio: f64,
        pair: PropellantPair,
    ) -> FluidResult<CombustionProducts>;
}

/// Flame temperature fit for one propellant pair.
#[derive(Debug, Clone, Copy)]
struct PairFit {
    /// Peak flame temperature at the reference pressure [K]
    t_peak: f64,
    mr_peak: f64,
    /// Gaussian widths in ln(MR) on the fuel-rich and lean sides
    rich_width: f64,
    lean_width: f64,
    gamma_hot: f64,
    gamma_cold: f64,
    mr_min: f64,
    mr_max: f64,
}

fn fit(pair: PropellantPair) -> PairFit {
    match pair {
        PropellantPair::LoxLh2 => PairFit {
            t_peak: 3550.0,
            mr_peak: 6.5,
            rich_width: 0.48,
            lean_width: 0.6,
            gamma_hot: 1.20,
            gamma_cold: 1.40,
            mr_min: 0.5,
            mr_max: 12.0,
        },
        PropellantPair::LoxLch4 => PairFit {
            t_peak: 3580.0,
            mr_peak: 3.4,
            rich_width: 0.26,
            lean_width: 0.6,
            gamma_hot: 1.19,
            gamma_cold: 1.33,
            mr_min: 0.1,
            mr_max: 7.0,
        },
        PropellantPair::LoxRp1 => PairFit {
            t_peak: 3700.0,
            mr_peak: 2.6,
            rich_width: 0.397,
            lean_width: 0.656,
            gamma_hot: 1.22,
            gamma_cold: 1.35,
            mr_min: 0.1,
            mr_max: 6.0,
        },
    }
}

/// Fuel element content [mol C, mol H] per kg.
fn fuel_atoms_per_kg(pair: PropellantPair) -> (f64, f64) {
    match pair {
        PropellantPair::LoxLh2 => (0.0, 1000.0 / 1.008),
        PropellantPair::LoxLch4 => {
            let n = 1000.0 / 16.043;
            (n, 4.0 * n)
        }
        // CH1.9532 surrogate
        PropellantPair::LoxRp1 => {
            let n = 1000.0 / (12.011 + 1.9532 * 1.008);
            (n, 1.9532 * n)
        }
    }
}

/// Empirical equilibrium: flame temperature from a curve fit in mixture
/// ratio and chamber pressure, products from an oxygen-priority element
/// balance.
///
/// Valid for roughly 1 to 300 bar and the per-pair mixture ratio window;
/// outside it `combust` fails with `ConvergenceFailed`.
#[derive(Debug, Clone)]
pub struct CurveFitEquilibrium {
    pub ignition_temperature: f64,
    pub reference_pressure: f64,
    pub pressure_exponent: f64,
    pub pressure_range: (f64, f64),
}

impl CurveFitEquilibrium {
    pub fn new() -> Self {
        Self {
            ignition_temperature: 300.0,
            reference_pressure: 7.0e6,
            pressure_exponent: 0.015,
            pressure_range: (1.0e5, 3.0e7),
        }
    }
}

impl Default for CurveFitEquilibrium {
    fn default() -> Self {
        Self::new()
    }
}

/// Major products from an element balance. Oxygen goes to CO first, then
/// H2O, then CO2; any excess remains as O2. Unburnt carbon binds hydrogen as
/// CH4 and the rest is soot.
pub(crate) fn major_products(pair: PropellantPair, mixture_ratio: f64) -> FluidResult<Composition> {
    let (carbon, hydrogen) = fuel_atoms_per_kg(pair);
    let mut oxygen = mixture_ratio * 1000.0 / 15.999;

    let mut co = carbon.min(oxygen);
    oxygen -= co;
    let carbon_left = carbon - co;

    let mut h2 = 0.5 * hydrogen;
    let h2o = h2.min(oxygen);
    oxygen -= h2o;
    h2 -= h2o;

    let co2 = co.min(oxygen);
    co -= co2;
    oxygen -= co2;

    let o2 = 0.5 * oxygen;

    let ch4 = carbon_left.min(0.5 * h2);
    h2 -= 2.0 * ch4;
    let soot = carbon_left - ch4;

    Composition::new_mole_fractions(vec![
        (Species::H2O, h2o),
        (Species::CO2, co2),
        (Species::CO, co),
        (Species::H2, h2),
        (Species::O2, o2),
        (Species::CH4, ch4),
        (Species::Soot, soot),
    ])
}

impl EquilibriumEngine for CurveFitEquilibrium {
    fn name(&self) -> &str {
        "curve-fit"
    }

    fn combust(
        &self,
        chamber_pressure: Pressure,
        mixture_ratio: f64,
        pair: PropellantPair,
    ) -> FluidResult<CombustionProducts> {
        let pc = chamber_pressure.value;
        if !pc.is_finite() || pc <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "chamber pressure",
            });
        }
        if !mixture_ratio.is_finite() || mixture_ratio <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "mixture ratio",
            });
        }

        let f = fit(pair);
        if mixture_ratio < f.mr_min || mixture_ratio > f.mr_max {
            return Err(FluidError::ConvergenceFailed {
                what: format!(
                    "{pair} mixture ratio {mixture_ratio:.3} outside fitted range [{}, {}]",
                    f.mr_min, f.mr_max
                ),
            });
        }
        let (p_lo, p_hi) = self.pressure_range;
        if pc < p_lo || pc > p_hi {
            return Err(FluidError::ConvergenceFailed {
                what: format!("{pair} chamber pressure {pc:.0} Pa outside fitted range [{p_lo}, {p_hi}]"),
            });
        }

        let x = (mixture_ratio / f.mr_peak).ln();
        let width = if x < 0.0 { f.rich_width } else { f.lean_width };
        let t_peak = f.t_peak * (pc / self.reference_pressure).powf(self.pressure_exponent);
        let span = t_peak - self.ignition_temperature;
        let theta = (-width * x * x).exp();
        let flame_temperature = self.ignition_temperature + span * theta;

        let composition = major_products(pair, mixture_ratio)?;
        let molar_mass = composition.molar_mass();
        let gamma = f.gamma_cold + (f.gamma_hot - f.gamma_cold) * theta;
        let cp = gamma / (gamma - 1.0) * R_UNIVERSAL / molar_mass;

        Ok(CombustionProducts {
            flame_temperature: k(flame_temperature),
            molar_mass,
            gamma,
            cp,
            composition,
        })
    }
}
