//! Combustion product species and mole-fraction compositions.

use crate::error::{FluidError, FluidResult};
use rc_core::numeric::{Tolerances, nearly_equal};

/// Major combustion product species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Species {
    H2O,
    CO2,
    CO,
    H2,
    O2,
    CH4,
    /// Condensed carbon in very fuel-rich kerosene products.
    Soot,
}

impl Species {
    /// Molar mass [kg/mol].
    pub fn molar_mass(self) -> f64 {
        match self {
            Species::H2O => 0.018_015,
            Species::CO2 => 0.044_009,
            Species::CO => 0.028_010,
            Species::H2 => 0.002_016,
            Species::O2 => 0.031_998,
            Species::CH4 => 0.016_043,
            Species::Soot => 0.012_011,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::H2O => "H2O",
            Species::CO2 => "CO2",
            Species::CO => "CO",
            Species::H2 => "H2",
            Species::O2 => "O2",
            Species::CH4 => "CH4",
            Species::Soot => "C(s)",
        }
    }
}

/// Composition defined by normalized mole fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    items: Vec<(Species, f64)>,
}

impl Composition {
    pub fn pure(species: Species) -> Self {
        Self {
            items: vec![(species, 1.0)],
        }
    }

    /// Build from (possibly unnormalized) mole amounts.
    ///
    /// Amounts must be finite and non-negative with a positive sum; they are
    /// normalized to sum to one and negligible species are dropped.
    pub fn new_mole_fractions(fractions: Vec<(Species, f64)>) -> FluidResult<Self> {
        if fractions.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "empty composition",
            });
        }

        let mut sum = 0.0;
        for (_, frac) in &fractions {
            if !frac.is_finite() {
                return Err(FluidError::NonPhysical {
                    what: "non-finite mole fraction",
                });
            }
            if *frac < 0.0 {
                return Err(FluidError::NonPhysical {
                    what: "negative mole fraction",
                });
            }
            sum += frac;
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "mole fractions sum to zero or non-finite",
            });
        }

        let items: Vec<(Species, f64)> = fractions
            .into_iter()
            .map(|(s, f)| (s, f / sum))
            .filter(|(_, f)| *f > 1e-12)
            .collect();

        if items.is_empty() {
            return Err(FluidError::NonPhysical {
                what: "all mole fractions negligible",
            });
        }

        Ok(Self { items })
    }

    /// Mole fraction of a species (0.0 if absent).
    pub fn mole_fraction(&self, species: Species) -> f64 {
        self.items
            .iter()
            .filter(|(s, _)| *s == species)
            .map(|(_, f)| *f)
            .sum()
    }

    /// `Some(species)` if exactly one species is present.
    pub fn is_pure(&self) -> Option<Species> {
        match self.items.as_slice() {
            [(species, frac)] if nearly_equal(*frac, 1.0, Tolerances::default()) => Some(*species),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        self.items.iter().copied()
    }

    /// Mean molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.items
            .iter()
            .map(|(species, x)| species.molar_mass() * x)
            .sum()
    }
}
