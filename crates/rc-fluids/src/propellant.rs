//! Propellant catalogue and propellant pairs.

use crate::error::{FluidError, FluidResult};
use rc_core::units::constants::R_UNIVERSAL;
use rc_core::units::{Temperature, k};
use std::fmt;
use std::str::FromStr;

/// Role a propellant plays in the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropellantRole {
    Oxidizer,
    Fuel,
    Pressurant,
}

/// Supported propellants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Propellant {
    /// Liquid oxygen
    Lox,
    /// Liquid hydrogen
    Lh2,
    /// Liquid methane
    Lch4,
    /// RP-1 kerosene, modelled as n-dodecane
    Rp1,
    /// Helium (tank pressurant, expander drive gas in tests)
    Helium,
}

impl Propellant {
    pub const ALL: [Propellant; 5] = [
        Propellant::Lox,
        Propellant::Lh2,
        Propellant::Lch4,
        Propellant::Rp1,
        Propellant::Helium,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Propellant::Lox => "LOX",
            Propellant::Lh2 => "LH2",
            Propellant::Lch4 => "LCH4",
            Propellant::Rp1 => "RP1",
            Propellant::Helium => "He",
        }
    }

    pub fn role(self) -> PropellantRole {
        match self {
            Propellant::Lox => PropellantRole::Oxidizer,
            Propellant::Lh2 | Propellant::Lch4 | Propellant::Rp1 => PropellantRole::Fuel,
            Propellant::Helium => PropellantRole::Pressurant,
        }
    }

    /// Molar mass [kg/mol].
    pub fn molar_mass(self) -> f64 {
        match self {
            Propellant::Lox => 0.031_998,
            Propellant::Lh2 => 0.002_016,
            Propellant::Lch4 => 0.016_043,
            Propellant::Rp1 => 0.170_338,
            Propellant::Helium => 0.004_002_6,
        }
    }

    /// Specific gas constant R/M [J/(kg·K)].
    pub fn specific_gas_constant(self) -> f64 {
        R_UNIVERSAL / self.molar_mass()
    }

    /// Default storage temperature (normal boiling point for cryogens).
    pub fn storage_temperature(self) -> Temperature {
        k(match self {
            Propellant::Lox => 90.19,
            Propellant::Lh2 => 20.25,
            Propellant::Lch4 => 111.0,
            Propellant::Rp1 => 263.6,
            Propellant::Helium => 300.0,
        })
    }

    /// CoolProp pure-fluid surrogate.
    pub(crate) fn rfluids_pure(self) -> rfluids::prelude::Pure {
        use rfluids::prelude::Pure;
        match self {
            Propellant::Lox => Pure::Oxygen,
            Propellant::Lh2 => Pure::Hydrogen,
            Propellant::Lch4 => Pure::Methane,
            Propellant::Rp1 => Pure::nDodecane,
            Propellant::Helium => Pure::Helium,
        }
    }

    /// Density multiplier applied on top of the surrogate fluid.
    ///
    /// n-dodecane underpredicts RP-1 density by about 4 %.
    pub(crate) fn density_correction(self) -> f64 {
        match self {
            Propellant::Rp1 => 1.04,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Propellant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Propellant {
    type Err = FluidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOX" | "LO2" | "O2" | "OXYGEN" => Ok(Propellant::Lox),
            "LH2" | "H2" | "HYDROGEN" => Ok(Propellant::Lh2),
            "LCH4" | "CH4" | "METHANE" => Ok(Propellant::Lch4),
            "RP1" | "RP-1" | "KEROSENE" => Ok(Propellant::Rp1),
            "HE" | "HELIUM" => Ok(Propellant::Helium),
            _ => Err(FluidError::InvalidArg {
                what: "unknown propellant",
            }),
        }
    }
}

/// Oxidizer/fuel combinations with equilibrium data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropellantPair {
    LoxLh2,
    LoxLch4,
    LoxRp1,
}

impl PropellantPair {
    pub const ALL: [PropellantPair; 3] = [
        PropellantPair::LoxLh2,
        PropellantPair::LoxLch4,
        PropellantPair::LoxRp1,
    ];

    /// Pair for an oxidizer and a fuel, in either order.
    pub fn from_propellants(a: Propellant, b: Propellant) -> FluidResult<Self> {
        let fuel = match (a, b) {
            (Propellant::Lox, fuel) | (fuel, Propellant::Lox) => fuel,
            _ => {
                return Err(FluidError::NotSupported {
                    what: "propellant pair without LOX oxidizer",
                });
            }
        };
        match fuel {
            Propellant::Lh2 => Ok(PropellantPair::LoxLh2),
            Propellant::Lch4 => Ok(PropellantPair::LoxLch4),
            Propellant::Rp1 => Ok(PropellantPair::LoxRp1),
            _ => Err(FluidError::NotSupported {
                what: "fuel has no equilibrium data",
            }),
        }
    }

    pub fn oxidizer(self) -> Propellant {
        Propellant::Lox
    }

    pub fn fuel(self) -> Propellant {
        match self {
            PropellantPair::LoxLh2 => Propellant::Lh2,
            PropellantPair::LoxLch4 => Propellant::Lch4,
            PropellantPair::LoxRp1 => Propellant::Rp1,
        }
    }

    /// Design mixture ratio (oxidizer/fuel by mass).
    pub fn default_mixture_ratio(self) -> f64 {
        match self {
            PropellantPair::LoxLh2 => 5.6,
            PropellantPair::LoxLch4 => 3.6,
            PropellantPair::LoxRp1 => 2.45,
        }
    }

    /// Ratio of delivered to ideal specific impulse.
    pub fn isp_quality_factor(self) -> f64 {
        match self {
            PropellantPair::LoxLh2 => 0.98,
            PropellantPair::LoxLch4 => 0.97,
            PropellantPair::LoxRp1 => 0.95,
        }
    }

    /// Chamber characteristic length L* [m].
    pub fn characteristic_length(self) -> f64 {
        match self {
            PropellantPair::LoxLh2 => 0.89,
            PropellantPair::LoxLch4 => 1.45,
            PropellantPair::LoxRp1 => 1.145,
        }
    }
}

impl fmt::Display for PropellantPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.oxidizer(), self.fuel())
    }
}

impl FromStr for PropellantPair {
    type Err = FluidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s.split_once('/').ok_or(FluidError::InvalidArg {
            what: "propellant pair must be written as OX/FUEL",
        })?;
        PropellantPair::from_propellants(a.parse()?, b.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("lox".parse::<Propellant>().unwrap(), Propellant::Lox);
        assert_eq!("RP-1".parse::<Propellant>().unwrap(), Propellant::Rp1);
        assert_eq!("methane".parse::<Propellant>().unwrap(), Propellant::Lch4);
        assert!("hydrazine".parse::<Propellant>().is_err());
    }

    #[test]
    fn pair_order_does_not_matter() {
        let a = PropellantPair::from_propellants(Propellant::Lox, Propellant::Rp1).unwrap();
        let b = PropellantPair::from_propellants(Propellant::Rp1, Propellant::Lox).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fuel(), Propellant::Rp1);
        assert_eq!("LOX/LH2".parse::<PropellantPair>().unwrap(), PropellantPair::LoxLh2);
    }

    #[test]
    fn pair_without_oxidizer_rejected() {
        assert!(PropellantPair::from_propellants(Propellant::Lh2, Propellant::Rp1).is_err());
        assert!(PropellantPair::from_propellants(Propellant::Lox, Propellant::Helium).is_err());
    }

    #[test]
    fn catalogue_defaults() {
        assert_eq!(PropellantPair::LoxRp1.default_mixture_ratio(), 2.45);
        assert_eq!(PropellantPair::LoxLh2.isp_quality_factor(), 0.98);
        assert_eq!(PropellantPair::LoxLch4.characteristic_length(), 1.45);
        assert_eq!(Propellant::Lox.storage_temperature().value, 90.19);
        assert_eq!(Propellant::Helium.role(), PropellantRole::Pressurant);
        for p in Propellant::ALL {
            assert!(p.specific_gas_constant() > 0.0);
        }
    }
}
