//! Engine performance from converged cycles.
//!
//! [`evaluate`] turns a [`CycleSolution`](rc_solver::CycleSolution) into
//! whole-engine figures (thrust, delivered Isp, overall mixture ratio,
//! turbomachine power, chamber margins, cooling, electric drives).
//! [`MassBudget`] closes the stage mass for an ideal Δv. [`CycleReport`]
//! is the serializable record written by the CLI.

pub mod budget;
pub mod error;
pub mod evaluate;
pub mod report;

pub use budget::{BudgetReport, MassBudget};
pub use error::{PerfError, PerfResult};
pub use evaluate::{CycleResult, EnginePerformance, evaluate};
pub use report::{
    BreakVariableSnapshot, ChamberSnapshot, CoolingSnapshot, CycleReport, ElectricDriveSnapshot,
    MachineSnapshot, NozzleSnapshot, StreamSnapshot, WallSnapshot,
};
