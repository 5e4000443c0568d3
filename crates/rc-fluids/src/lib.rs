//! rc-fluids: propellant properties and combustion for the cycle solver.
//!
//! Provides:
//! - Propellant and propellant-pair catalogue
//! - Flow state carried by cycle streams
//! - `PropertyEngine` trait with a CoolProp backend (via `rfluids`) and an
//!   analytic constant-property backend with tabulated envelopes
//! - `EquilibriumEngine` trait with an empirical curve-fit backend
//! - `PropertyAdapter`: the single entry point components use, memoizing
//!   queries for the duration of one solve
//!
//! # Example
//!
//! ```
//! use rc_core::units::{bar, k};
//! use rc_fluids::{
//!     CurveFitEquilibrium, PerfectFluidEngine, Propellant, PropertyAdapter, StateInput,
//! };
//!
//! let props = PerfectFluidEngine::new();
//! let eq = CurveFitEquilibrium::new();
//! let adapter = PropertyAdapter::new(&props, &eq);
//! let lox = adapter
//!     .property_lookup(Propellant::Lox, StateInput::PT { p: bar(2.0), t: k(90.19) })
//!     .unwrap();
//! assert!(lox.rho.value > 1000.0);
//! ```

pub mod adapter;
pub mod composition;
pub mod coolprop;
pub mod equilibrium;
pub mod error;
pub mod flow;
pub mod model;
pub mod perfect;
pub mod propellant;
pub mod state;

pub use adapter::{CacheStats, PropertyAdapter, SolveScope};
pub use composition::{Composition, Species};
pub use coolprop::CoolPropEngine;
pub use equilibrium::{CombustionProducts, CurveFitEquilibrium, EquilibriumEngine};
pub use error::{FluidError, FluidResult};
pub use flow::{CombustionGas, FlowFluid, FlowState, GasProperties, Validity};
pub use model::{Envelope, PropertyEngine};
pub use perfect::{PerfectFluid, PerfectFluidEngine};
pub use propellant::{Propellant, PropellantPair, PropellantRole};
pub use state::{FluidProperties, Phase, SpecEnthalpy, SpecEntropy, SpecHeatCapacity, StateInput};
