//! Cycle solver for rocket-engine component networks.
//!
//! A cycle is assembled with [`CycleBuilder`]: component specs connected by
//! streams, pumps coupled to turbines by shafts, chambers heating cooling
//! channels. Loops in the dependency graph are torn; every torn edge and
//! every user-declared balance becomes a break variable. [`CycleSolver`]
//! drives the break variables to zero residual with a damped Newton method
//! over a forward-difference Jacobian, evaluating the components in a fixed
//! forward order on each pass.
//!
//! Solver phases: Initialized → Iterating → Converged | Diverged | Failed.

pub mod cycle;
pub mod error;
mod evaluate;
pub mod jacobian;
mod newton;
pub mod solver;
pub mod sweep;

pub use cycle::{
    BreakVariable, BreakVariableDef, Closure, CycleBuilder, CycleGraph, ElectricShaft, HeatLink,
    HeatSource, Shaft, StreamQuantity, Unknown,
};
pub use error::{DivergenceReason, SolverError, SolverResult};
pub use solver::{CycleSolution, CycleSolver, SolverConfig, SolverPhase, SolverState};
pub use sweep::{SweepParameter, SweepPoint, linspace, sweep};
