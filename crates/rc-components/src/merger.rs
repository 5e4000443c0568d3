//! Flow merger.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentOutput, EvalInputs, UnitModel};
use rc_core::units::kgps;
use rc_fluids::PropertyAdapter;
use rc_graph::{Arity, PortCount};

/// Relative inlet pressure spread above which a mismatch is reported.
const PRESSURE_MISMATCH: f64 = 1e-3;

/// Joins N ≥ 2 streams of one fluid: masses add, enthalpy mixes
/// adiabatically, outlet takes the lowest inlet pressure.
#[derive(Debug, Clone, PartialEq)]
pub struct Merger {
    inlets: usize,
}

impl Merger {
    pub fn new(inlets: usize) -> ComponentResult<Self> {
        if inlets < 2 {
            return Err(ComponentError::InvalidArg {
                what: "merger needs at least two inlets",
            });
        }
        Ok(Self { inlets })
    }
}

impl UnitModel for Merger {
    fn arity(&self) -> Arity {
        Arity::new(PortCount::Exactly(self.inlets), PortCount::Exactly(1))
    }

    fn evaluate(
        &self,
        adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput> {
        let [first, rest @ ..] = inputs.inlets else {
            return Err(ComponentError::InvalidArg {
                what: "merger has no inlets",
            });
        };
        if inputs.inlets.len() != self.inlets {
            return Err(ComponentError::InvalidArg {
                what: "wrong number of inlet states",
            });
        }
        if rest.iter().any(|s| !s.fluid.same_fluid(&first.fluid)) {
            return Err(ComponentError::InvalidArg {
                what: "merger inlets must carry a single fluid",
            });
        }

        let m_total: f64 = inputs.inlets.iter().map(|s| s.mass_flow.value).sum();
        let p_min = inputs
            .inlets
            .iter()
            .map(|s| s.pressure.value)
            .fold(f64::INFINITY, f64::min);
        let p_max = inputs
            .inlets
            .iter()
            .map(|s| s.pressure.value)
            .fold(f64::NEG_INFINITY, f64::max);
        let h_mix = if m_total > 0.0 {
            inputs.inlets.iter().map(|s| s.enthalpy_flow()).sum::<f64>() / m_total
        } else {
            first.enthalpy
        };

        let outlet = first
            .with_mass_flow(kgps(m_total))
            .at_ph(adapter, rc_core::units::pa(p_min), h_mix)?;
        let mut out = ComponentOutput::new(vec![outlet]);
        if (p_max - p_min) / p_min > PRESSURE_MISMATCH {
            out.warnings.push(format!(
                "merger inlet pressures differ: {p_min:.0} to {p_max:.0} Pa"
            ));
        }
        Ok(out)
    }
}
