//! Property Adapter: the single property/combustion entry point for
//! components, memoizing engine calls for the duration of one solve.

use crate::equilibrium::{CombustionProducts, EquilibriumEngine};
use crate::error::{FluidError, FluidResult};
use crate::flow::{FlowFluid, FlowState, Validity};
use crate::model::{Envelope, PropertyEngine};
use crate::propellant::{Propellant, PropellantPair};
use crate::state::{FluidProperties, StateInput};
use rc_core::numeric::bisect;
use rc_core::units::{Pressure, Temperature};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PropertyKey {
    fluid: Propellant,
    input: (u8, u64, u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CombustionKey {
    pair: PropellantPair,
    pc: u64,
    mr: u64,
}

/// Memo cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub property_hits: u64,
    pub property_misses: u64,
    pub combustion_hits: u64,
    pub combustion_misses: u64,
}

/// Wraps a property engine and an equilibrium engine.
///
/// Caches are keyed on the exact bit patterns of the inputs. The adapter
/// uses interior mutability and is therefore `!Sync`: each solve (and each
/// sweep point) owns its own adapter while the engines themselves are
/// shared.
pub struct PropertyAdapter<'e> {
    properties: &'e dyn PropertyEngine,
    equilibrium: &'e dyn EquilibriumEngine,
    property_cache: RefCell<HashMap<PropertyKey, FluidProperties>>,
    combustion_cache: RefCell<HashMap<CombustionKey, CombustionProducts>>,
    stats: Cell<CacheStats>,
}

/// Guard returned by [`PropertyAdapter::begin_solve`]; clears the caches
/// when dropped.
pub struct SolveScope<'a, 'e> {
    adapter: &'a PropertyAdapter<'e>,
}

impl Drop for SolveScope<'_, '_> {
    fn drop(&mut self) {
        self.adapter.clear();
    }
}

impl<'e> PropertyAdapter<'e> {
    pub fn new(properties: &'e dyn PropertyEngine, equilibrium: &'e dyn EquilibriumEngine) -> Self {
        Self {
            properties,
            equilibrium,
            property_cache: RefCell::new(HashMap::new()),
            combustion_cache: RefCell::new(HashMap::new()),
            stats: Cell::new(CacheStats::default()),
        }
    }

    /// Start a solve: caches are emptied now and again when the returned
    /// scope is dropped, whether the solve succeeds or fails.
    pub fn begin_solve(&self) -> SolveScope<'_, 'e> {
        self.clear();
        SolveScope { adapter: self }
    }

    /// Empty both caches and reset the counters.
    pub fn clear(&self) {
        self.property_cache.borrow_mut().clear();
        self.combustion_cache.borrow_mut().clear();
        self.stats.set(CacheStats::default());
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.get()
    }

    pub fn envelope(&self, fluid: Propellant) -> FluidResult<Envelope> {
        self.properties.envelope(fluid)
    }

    pub fn property_lookup(&self, fluid: Propellant, input: StateInput) -> FluidResult<FluidProperties> {
        let key = PropertyKey {
            fluid,
            input: input.key_bits(),
        };
        if let Some(hit) = self.property_cache.borrow().get(&key) {
            self.bump(|s| s.property_hits += 1);
            return Ok(hit.clone());
        }

        self.bump(|s| s.property_misses += 1);
        let props = self.properties.properties(fluid, input)?;
        self.property_cache.borrow_mut().insert(key, props.clone());
        Ok(props)
    }

    /// Equilibrium products; engine failures propagate unchanged.
    pub fn equilibrium_combustion(
        &self,
        chamber_pressure: Pressure,
        mixture_ratio: f64,
        pair: PropellantPair,
    ) -> FluidResult<CombustionProducts> {
        let key = CombustionKey {
            pair,
            pc: chamber_pressure.value.to_bits(),
            mr: mixture_ratio.to_bits(),
        };
        if let Some(hit) = self.combustion_cache.borrow().get(&key) {
            self.bump(|s| s.combustion_hits += 1);
            return Ok(hit.clone());
        }

        self.bump(|s| s.combustion_misses += 1);
        let products = self
            .equilibrium
            .combust(chamber_pressure, mixture_ratio, pair)
            .inspect_err(|e| trace!(%pair, mixture_ratio, error = %e, "equilibrium failed"))?;
        self.combustion_cache.borrow_mut().insert(key, products.clone());
        Ok(products)
    }

    /// Fuel-rich mixture ratio in `bracket` whose flame temperature equals
    /// `t_limit` (gas-generator and preburner sizing).
    pub fn mixture_ratio_for_temperature(
        &self,
        chamber_pressure: Pressure,
        pair: PropellantPair,
        t_limit: Temperature,
        bracket: (f64, f64),
    ) -> FluidResult<f64> {
        let (lo, hi) = bracket;
        if !(lo > 0.0 && hi > lo) {
            return Err(FluidError::InvalidArg {
                what: "mixture ratio bracket must satisfy 0 < lo < hi",
            });
        }
        let t_lo = self.equilibrium_combustion(chamber_pressure, lo, pair)?.flame_temperature;
        let t_hi = self.equilibrium_combustion(chamber_pressure, hi, pair)?.flame_temperature;
        let target = t_limit.value;
        let failure = RefCell::new(None);
        let residual = |mr: f64| match self.equilibrium_combustion(chamber_pressure, mr, pair) {
            Ok(p) => p.flame_temperature.value - target,
            Err(e) => {
                failure.borrow_mut().get_or_insert(e);
                f64::NAN
            }
        };

        let root = bisect(lo, hi, 1e-6, 200, residual);
        if let Some(e) = failure.into_inner() {
            return Err(e);
        }
        root.ok_or_else(|| FluidError::ConvergenceFailed {
            what: format!(
                "{pair} flame temperature {target:.1} K not between {:.1} K and {:.1} K in MR [{lo}, {hi}]",
                t_lo.value, t_hi.value
            ),
        })
    }

    /// Classify a stream state: finite, non-negative flow, positive
    /// pressure and temperature, inside the envelope for propellants.
    pub fn classify(&self, state: &FlowState) -> Validity {
        let m = state.mass_flow.value;
        let p = state.pressure.value;
        let t = state.temperature.value;
        if !m.is_finite() || m < 0.0 {
            return Validity::Invalid(format!("mass flow {m} kg/s"));
        }
        if !p.is_finite() || p <= 0.0 {
            return Validity::Invalid(format!("pressure {p} Pa"));
        }
        if !t.is_finite() || t <= 0.0 {
            return Validity::Invalid(format!("temperature {t} K"));
        }
        if let FlowFluid::Propellant(prop) = state.fluid {
            match self.envelope(prop) {
                Ok(env) if env.contains(p, t) => {}
                Ok(_) => {
                    return Validity::Invalid(format!(
                        "{prop} at {p:.0} Pa, {t:.2} K outside property envelope"
                    ));
                }
                Err(e) => return Validity::Invalid(e.to_string()),
            }
        }
        Validity::Valid
    }

    fn bump(&self, f: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}
