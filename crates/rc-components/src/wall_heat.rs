//! Hot-gas wall heat flux for regeneratively cooled chambers.
//!
//! ## Model
//!
//! Convection follows the modified Bartz correlation, evaluated at the
//! cylindrical chamber section and at the throat:
//!
//! ```text
//! h = 0.026·1.213·ṁ^0.8·D^−1.8·μ^0.2·cp·Pr^−0.6·(T0/Tf)^0.68
//! ```
//!
//! with film temperature `Tf = 0.28·T + 0.5·Tw + 0.22·Taw`. Radiation is
//! the grey-body exchange between gas and wall. The heat load on the
//! coolant is the chamber-section flux (convective plus radiative) times
//! the cooled area.

use std::f64::consts::PI;

use crate::chamber::ChamberReport;
use crate::common::check_finite;
use crate::error::{ComponentError, ComponentResult};
use crate::isentropic::prandtl_estimate;
use rc_core::units::{Area, Power, Temperature, watts};
use rc_fluids::{FlowFluid, FlowState};
use uom::si::area::square_meter;
use uom::si::thermodynamic_temperature::kelvin;

/// Stefan–Boltzmann constant [W/(m²·K⁴)].
pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;

const DEFAULT_GAS_EMISSIVITY: f64 = 0.1;
const DEFAULT_WALL_EMISSIVITY: f64 = 0.8;

/// Combustion gas viscosity [Pa·s] from molar mass [kg/mol] and
/// temperature [K].
pub fn gas_viscosity(molar_mass: f64, temperature: f64) -> f64 {
    1.184e-7 * (molar_mass * 1e3).sqrt() * temperature.powf(0.6)
}

/// Reference temperature for gas properties in the boundary layer.
pub fn film_temperature(static_t: f64, wall_t: f64, adiabatic_wall_t: f64) -> f64 {
    0.28 * static_t + 0.5 * wall_t + 0.22 * adiabatic_wall_t
}

/// Modified Bartz convective coefficient [W/(m²·K)].
pub fn bartz_coefficient(
    mass_flow: f64,
    diameter: f64,
    viscosity: f64,
    cp: f64,
    prandtl: f64,
    stagnation_t: f64,
    film_t: f64,
) -> f64 {
    0.026 * 1.213
        * mass_flow.powf(0.8)
        * diameter.powf(-1.8)
        * viscosity.powf(0.2)
        * cp
        * prandtl.powf(-0.6)
        * (stagnation_t / film_t).powf(0.68)
}

/// Net radiative flux from gas to wall [W/m²].
pub fn radiative_flux(gas_t: f64, wall_t: f64, gas_emissivity: f64, wall_emissivity: f64) -> f64 {
    STEFAN_BOLTZMANN * (gas_t.powi(4) - wall_t.powi(4))
        / (1.0 / gas_emissivity + 1.0 / wall_emissivity - 1.0)
}

/// Chamber-to-throat area ratio typical of a throat area [m²].
pub fn contraction_ratio_estimate(throat_area: f64) -> f64 {
    0.469_479 * throat_area.powf(-0.3) + 1.25
}

/// Fluxes at one chamber operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHeatLoad {
    /// Convective flux in the cylindrical section [W/m²].
    pub convective_flux: f64,
    /// Convective flux at the throat, where it peaks [W/m²].
    pub throat_flux: f64,
    /// [W/m²]
    pub radiative_flux: f64,
    /// [m]
    pub throat_diameter: f64,
    /// [m]
    pub chamber_diameter: f64,
    /// Heat absorbed by the coolant.
    pub heat_load: Power,
}

/// Wall heat transfer from a chamber into its cooling jacket.
///
/// The throat area follows from the chamber operating point,
/// `At = ṁ·c*/pc`. Without an explicit contraction ratio an empirical
/// estimate for the throat size is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHeatFlux {
    cooled_area: Area,
    max_wall_temperature: Temperature,
    contraction_ratio: Option<f64>,
    gas_emissivity: f64,
    wall_emissivity: f64,
}

impl WallHeatFlux {
    pub fn new(cooled_area: Area, max_wall_temperature: Temperature) -> ComponentResult<Self> {
        let area = cooled_area.get::<square_meter>();
        let tw = max_wall_temperature.get::<kelvin>();
        if !(area.is_finite() && area > 0.0) || !(tw.is_finite() && tw > 0.0) {
            return Err(ComponentError::InvalidArg {
                what: "cooled area and wall temperature must be positive",
            });
        }
        Ok(Self {
            cooled_area,
            max_wall_temperature,
            contraction_ratio: None,
            gas_emissivity: DEFAULT_GAS_EMISSIVITY,
            wall_emissivity: DEFAULT_WALL_EMISSIVITY,
        })
    }

    pub fn with_contraction_ratio(mut self, ratio: f64) -> ComponentResult<Self> {
        if !(ratio.is_finite() && ratio >= 1.0) {
            return Err(ComponentError::InvalidArg {
                what: "contraction ratio must be at least 1",
            });
        }
        self.contraction_ratio = Some(ratio);
        Ok(self)
    }

    pub fn with_emissivities(mut self, gas: f64, wall: f64) -> ComponentResult<Self> {
        if !(gas > 0.0 && gas <= 1.0 && wall > 0.0 && wall <= 1.0) {
            return Err(ComponentError::InvalidArg {
                what: "emissivities must be in (0, 1]",
            });
        }
        self.gas_emissivity = gas;
        self.wall_emissivity = wall;
        Ok(self)
    }

    pub fn cooled_area(&self) -> Area {
        self.cooled_area
    }

    pub fn max_wall_temperature(&self) -> Temperature {
        self.max_wall_temperature
    }

    pub fn contraction_ratio(&self) -> Option<f64> {
        self.contraction_ratio
    }

    pub fn emissivities(&self) -> (f64, f64) {
        (self.gas_emissivity, self.wall_emissivity)
    }

    /// Fluxes for a chamber report and the chamber's outlet products.
    pub fn evaluate(&self, report: &ChamberReport, products: &FlowState) -> ComponentResult<WallHeatLoad> {
        let FlowFluid::Combustion(gas) = &products.fluid else {
            return Err(ComponentError::NotSupported {
                what: "wall heat flux needs combustion products",
            });
        };
        let m = products.mass_flow.value;
        let t0 = report.flame_temperature.get::<kelvin>();
        let tw = self.max_wall_temperature.get::<kelvin>();

        let throat_area = m * report.c_star.value / report.chamber_pressure.value;
        check_finite(throat_area, "throat area")?;
        if throat_area <= 0.0 {
            return Err(ComponentError::NonPhysical { what: "throat area" });
        }
        let contraction = self
            .contraction_ratio
            .unwrap_or_else(|| contraction_ratio_estimate(throat_area));
        let throat_diameter = (4.0 * throat_area / PI).sqrt();
        let chamber_diameter = throat_diameter * contraction.sqrt();

        let gamma = gas.gamma;
        let mu = gas_viscosity(gas.molar_mass, t0);
        let pr = prandtl_estimate(gamma);
        let coefficient = |d: f64, film: f64| bartz_coefficient(m, d, mu, gas.cp, pr, t0, film);

        // Chamber section: static and adiabatic wall temperatures equal T0.
        let convective_flux = (coefficient(chamber_diameter, film_temperature(t0, tw, t0)) * (t0 - tw)).max(0.0);

        let stagnation = 1.0 + 0.5 * (gamma - 1.0);
        let recovery = pr.cbrt();
        let t_static = t0 / stagnation;
        let t_adiabatic = t0 * (1.0 + 0.5 * recovery * (gamma - 1.0)) / stagnation;
        let throat_flux = (coefficient(throat_diameter, film_temperature(t_static, tw, t_adiabatic))
            * (t_adiabatic - tw))
            .max(0.0);

        let radiative_flux =
            radiative_flux(t0, tw, self.gas_emissivity, self.wall_emissivity).max(0.0);
        let heat_load = (convective_flux + radiative_flux) * self.cooled_area.get::<square_meter>();
        check_finite(heat_load, "wall heat load")?;

        Ok(WallHeatLoad {
            convective_flux,
            throat_flux,
            radiative_flux,
            throat_diameter,
            chamber_diameter,
            heat_load: watts(heat_load),
        })
    }
}
