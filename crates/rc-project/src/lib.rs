//! rc-project: engine definition files.
//!
//! An engine is described in YAML: property backend, solver settings,
//! streams, components with their ports, shafts, heat links, seed states
//! and break variables. [`load_yaml`] parses and validates a file;
//! [`build_cycle`] turns the definition into a solvable cycle.

pub mod compile;
pub mod schema;
pub mod validate;

use std::path::Path;

use rc_components::ComponentError;
use rc_fluids::FluidError;
use rc_solver::SolverError;

pub use compile::{Backends, CompiledEngine, build_cycle};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_engine};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Component '{component}': {source}")]
    Component {
        component: String,
        #[source]
        source: ComponentError,
    },

    #[error("Cycle error: {0}")]
    Solver(#[from] SolverError),
}

/// Parse and validate an engine definition.
pub fn from_yaml_str(content: &str) -> ProjectResult<EngineDef> {
    let engine: EngineDef = serde_yaml::from_str(content)?;
    validate_engine(&engine)?;
    Ok(engine)
}

pub fn to_yaml_string(engine: &EngineDef) -> ProjectResult<String> {
    validate_engine(engine)?;
    Ok(serde_yaml::to_string(engine)?)
}

pub fn load_yaml(path: &Path) -> ProjectResult<EngineDef> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, engine: &EngineDef) -> ProjectResult<()> {
    std::fs::write(path, to_yaml_string(engine)?)?;
    Ok(())
}
