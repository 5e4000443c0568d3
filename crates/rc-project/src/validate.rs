//! Engine definition validation.
//!
//! Checks identifiers, references and solver settings. Component parameters
//! are validated by the component constructors when the cycle is built.

use std::collections::HashSet;

use crate::schema::{ComponentKindDef, EngineDef};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn unique<'a>(
    ids: impl IntoIterator<Item = &'a String>,
    context: &str,
) -> Result<HashSet<&'a str>, ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: id.clone(),
                context: context.to_string(),
            });
        }
    }
    Ok(seen)
}

fn require(set: &HashSet<&str>, id: &str, context: impl Into<String>) -> Result<(), ValidationError> {
    if set.contains(id) {
        Ok(())
    } else {
        Err(ValidationError::MissingReference {
            id: id.to_string(),
            context: context.into(),
        })
    }
}

fn positive(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: "must be positive".to_string(),
        })
    }
}

pub fn validate_engine(engine: &EngineDef) -> Result<(), ValidationError> {
    if engine.version == 0 || engine.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: engine.version,
        });
    }

    let solver = &engine.solver;
    positive("solver.tolerance", solver.tolerance)?;
    positive("solver.fd_step", solver.fd_step)?;
    positive("solver.max_step_fraction", solver.max_step_fraction)?;
    if !(solver.line_search_factor > 0.0 && solver.line_search_factor < 1.0) {
        return Err(ValidationError::InvalidValue {
            field: "solver.line_search_factor".to_string(),
            value: solver.line_search_factor.to_string(),
            reason: "must lie in (0, 1)".to_string(),
        });
    }

    let streams = unique(&engine.streams, "streams")?;
    let components = unique(engine.components.iter().map(|c| &c.id), "components")?;
    unique(
        engine
            .shafts
            .iter()
            .map(|s| &s.id)
            .chain(engine.electric_shafts.iter().map(|s| &s.id)),
        "shafts",
    )?;
    unique(engine.break_variables.iter().map(|b| &b.name), "break_variables")?;
    unique(engine.seeds.iter().map(|s| &s.stream), "seeds")?;

    let mut produced = HashSet::new();
    let mut consumed = HashSet::new();
    for component in &engine.components {
        for stream in &component.inlets {
            require(&streams, stream, format!("component '{}' inlets", component.id))?;
            if !consumed.insert(stream) {
                return Err(ValidationError::DuplicateId {
                    id: stream.clone(),
                    context: "stream consumers".to_string(),
                });
            }
        }
        for stream in &component.outlets {
            require(&streams, stream, format!("component '{}' outlets", component.id))?;
            if !produced.insert(stream) {
                return Err(ValidationError::DuplicateId {
                    id: stream.clone(),
                    context: "stream producers".to_string(),
                });
            }
        }
        if let ComponentKindDef::Chamber { pair, .. } = &component.kind
            && !pair.contains('/')
        {
            return Err(ValidationError::InvalidValue {
                field: format!("component '{}' pair", component.id),
                value: pair.clone(),
                reason: "write propellant pairs as OX/FUEL".to_string(),
            });
        }
    }

    for shaft in &engine.shafts {
        let context = format!("shaft '{}'", shaft.id);
        require(&components, &shaft.turbine, context.clone())?;
        if shaft.pumps.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("shaft '{}' pumps", shaft.id),
                value: "[]".to_string(),
                reason: "a shaft drives at least one pump".to_string(),
            });
        }
        for pump in &shaft.pumps {
            require(&components, pump, context.clone())?;
        }
    }

    for shaft in &engine.electric_shafts {
        let context = format!("shaft '{}'", shaft.id);
        if shaft.pumps.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("shaft '{}' pumps", shaft.id),
                value: "[]".to_string(),
                reason: "a shaft drives at least one pump".to_string(),
            });
        }
        for pump in &shaft.pumps {
            require(&components, pump, context.clone())?;
        }
        positive(format!("shaft '{}' burn_time_s", shaft.id), shaft.burn_time_s)?;
    }

    for link in &engine.heat_links {
        require(&components, &link.chamber, "heat link chamber")?;
        require(&components, &link.channel, "heat link channel")?;
        if link.fraction.is_some() == link.wall.is_some() {
            return Err(ValidationError::InvalidValue {
                field: format!("heat link '{}' -> '{}'", link.chamber, link.channel),
                value: format!("fraction {:?}, wall {}", link.fraction, link.wall.is_some()),
                reason: "give exactly one of fraction or wall".to_string(),
            });
        }
        if let Some(wall) = &link.wall {
            positive(format!("heat link '{}' cooled_area_m2", link.channel), wall.cooled_area_m2)?;
            positive(
                format!("heat link '{}' max_wall_temperature_k", link.channel),
                wall.max_wall_temperature_k,
            )?;
        }
    }

    if let Some(budget) = &engine.budget {
        positive("budget.burn_time_s", budget.burn_time_s)?;
        if !(budget.dry_mass_kg.is_finite() && budget.dry_mass_kg >= 0.0) {
            return Err(ValidationError::InvalidValue {
                field: "budget.dry_mass_kg".to_string(),
                value: budget.dry_mass_kg.to_string(),
                reason: "cannot be negative".to_string(),
            });
        }
    }

    for seed in &engine.seeds {
        require(&streams, &seed.stream, "seeds")?;
        positive(format!("seed '{}' pressure_pa", seed.stream), seed.pressure_pa)?;
        positive(format!("seed '{}' temperature_k", seed.stream), seed.temperature_k)?;
    }

    for var in &engine.break_variables {
        let context = format!("break variable '{}'", var.name);
        require(&components, var.unknown.component(), context.clone())?;
        require(&components, var.closure.component(), context)?;
        if let Some((lo, hi)) = var.bounds
            && !(lo < hi)
        {
            return Err(ValidationError::InvalidValue {
                field: format!("break variable '{}' bounds", var.name),
                value: format!("[{lo}, {hi}]"),
                reason: "lower bound must be below upper bound".to_string(),
            });
        }
    }

    Ok(())
}
