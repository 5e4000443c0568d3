//! rc-core: shared foundation for the rocket cycle workspace.
//!
//! Contains:
//! - units (uom SI types + constructors + physical constants)
//! - numeric (Real + tolerances + residual helpers)
//! - ids (compact IDs for streams, components, ports, shafts)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{RcError, RcResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
