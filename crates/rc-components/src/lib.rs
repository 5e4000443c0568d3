//! rc-components: rocket-engine component models for the cycle solver.
//!
//! Provides:
//! - Tanks, pumps, turbines, combustion chambers / gas generators
//! - Regenerative cooling channels, wall heat flux and heat exchangers
//! - Battery-fed electric pump drives
//! - Nozzles with ideal rocket theory helpers
//! - Splitters and mergers
//!
//! Every model implements `UnitModel` and is a deterministic function of
//! its configuration and inputs, reading properties only through the
//! `PropertyAdapter`. `ComponentSpec` is the tagged union the solver
//! stores and dispatches on.
//!
//! # Example
//!
//! ```
//! use rc_components::{ComponentSpec, EvalInputs, Pump, PumpTarget, UnitModel};
//! use rc_core::units::{bar, kgps};
//! use rc_fluids::{CurveFitEquilibrium, FlowState, PerfectFluidEngine, Propellant, PropertyAdapter};
//!
//! let props = PerfectFluidEngine::new();
//! let eq = CurveFitEquilibrium::new();
//! let adapter = PropertyAdapter::new(&props, &eq);
//! let inlet = FlowState::propellant(
//!     &adapter,
//!     Propellant::Lox,
//!     kgps(2.3),
//!     bar(2.0),
//!     Propellant::Lox.storage_temperature(),
//! )
//! .unwrap();
//!
//! let pump: ComponentSpec = Pump::new(0.7, PumpTarget::DischargePressure(bar(69.0)))
//!     .unwrap()
//!     .into();
//! let out = pump.evaluate(&adapter, &EvalInputs::new(&[inlet])).unwrap();
//! assert_eq!(out.outlets[0].pressure, bar(69.0));
//! assert!(out.shaft_power.value > 0.0);
//! ```

pub mod chamber;
pub mod common;
pub mod cooling;
pub mod electric;
pub mod error;
pub mod heat_exchanger;
pub mod isentropic;
pub mod merger;
pub mod nozzle;
pub mod pump;
pub mod spec;
pub mod splitter;
pub mod tank;
pub mod traits;
pub mod turbine;
pub mod wall_heat;

// Re-exports
pub use chamber::{Chamber, ChamberReport, DEFAULT_INJECTOR_DROP};
pub use common::PressureDrop;
pub use cooling::{CoolingChannel, CoolingReport};
pub use electric::{Battery, ElectricDrive, ElectricDriveReport};
pub use error::{ComponentError, ComponentResult};
pub use heat_exchanger::{HeatExchanger, HeatExchangerMode};
pub use merger::Merger;
pub use nozzle::{Nozzle, NozzleExpansion, NozzlePerformance, SUMMERFIELD_LIMIT};
pub use pump::{Pump, PumpTarget};
pub use spec::{ComponentKind, ComponentSpec};
pub use splitter::{SplitRule, Splitter};
pub use tank::Tank;
pub use traits::{Adjustment, Balance, BalanceKind, ComponentOutput, EvalInputs, UnitModel};
pub use turbine::{Turbine, TurbineMode};
pub use wall_heat::{WallHeatFlux, WallHeatLoad};
