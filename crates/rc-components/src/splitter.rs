//! Flow splitter.

use crate::common::{check_finite, expect_inlets};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentOutput, EvalInputs, UnitModel};
use rc_core::units::{MassRate, kgps};
use rc_fluids::PropertyAdapter;
use rc_graph::{Arity, PortCount};

#[derive(Debug, Clone, PartialEq)]
pub enum SplitRule {
    /// Outlet shares of the inlet flow; sum to one.
    Fractions(Vec<f64>),
    /// Flows of outlets `0..N-1`; the last outlet takes the remainder.
    FixedFlows(Vec<MassRate>),
}

/// Divides one stream into N ≥ 2 at inlet pressure and temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct Splitter {
    rule: SplitRule,
}

impl Splitter {
    pub fn new(rule: SplitRule) -> ComponentResult<Self> {
        match &rule {
            SplitRule::Fractions(f) => {
                if f.len() < 2 {
                    return Err(ComponentError::InvalidArg {
                        what: "splitter needs at least two outlets",
                    });
                }
                if f.iter().any(|x| !x.is_finite() || *x < 0.0) {
                    return Err(ComponentError::InvalidArg {
                        what: "split fractions must be non-negative",
                    });
                }
                if (f.iter().sum::<f64>() - 1.0).abs() > 1e-9 {
                    return Err(ComponentError::InvalidArg {
                        what: "split fractions must sum to one",
                    });
                }
            }
            SplitRule::FixedFlows(m) => {
                if m.is_empty() {
                    return Err(ComponentError::InvalidArg {
                        what: "splitter needs at least two outlets",
                    });
                }
                if m.iter().any(|x| !x.value.is_finite() || x.value < 0.0) {
                    return Err(ComponentError::InvalidArg {
                        what: "fixed outlet flows must be non-negative",
                    });
                }
            }
        }
        Ok(Self { rule })
    }

    pub fn rule(&self) -> &SplitRule {
        &self.rule
    }

    pub fn outlet_count(&self) -> usize {
        match &self.rule {
            SplitRule::Fractions(f) => f.len(),
            SplitRule::FixedFlows(m) => m.len() + 1,
        }
    }

    /// Outlet flows for a given inlet flow.
    fn flows(&self, inlet: f64, inputs: &EvalInputs<'_>) -> ComponentResult<Vec<f64>> {
        match &self.rule {
            SplitRule::Fractions(f) => Ok(f.iter().map(|x| x * inlet).collect()),
            SplitRule::FixedFlows(fixed) => {
                let mut flows = Vec::with_capacity(fixed.len() + 1);
                for (index, m) in fixed.iter().enumerate() {
                    let m = inputs.outlet_flow(index).unwrap_or(*m).value;
                    check_finite(m, "splitter outlet flow")?;
                    flows.push(m);
                }
                let remainder = inlet - flows.iter().sum::<f64>();
                if remainder < 0.0 {
                    return Err(ComponentError::Infeasible {
                        what: format!(
                            "fixed splitter flows exceed inlet {inlet:.4} kg/s by {:.4} kg/s",
                            -remainder
                        ),
                    });
                }
                flows.push(remainder);
                Ok(flows)
            }
        }
    }
}

impl UnitModel for Splitter {
    fn arity(&self) -> Arity {
        Arity::new(PortCount::Exactly(1), PortCount::Exactly(self.outlet_count()))
    }

    fn evaluate(
        &self,
        _adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput> {
        expect_inlets(inputs.inlets, 1)?;
        let inlet = &inputs.inlets[0];
        let flows = self.flows(inlet.mass_flow.value, inputs)?;
        let outlets = flows
            .into_iter()
            .map(|m| inlet.with_mass_flow(kgps(m)))
            .collect();
        Ok(ComponentOutput::new(outlets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Adjustment;
    use rc_core::units::{bar, k};
    use rc_fluids::{CurveFitEquilibrium, FlowState, PerfectFluidEngine, Propellant};

    #[test]
    fn rejects_bad_rules() {
        assert!(Splitter::new(SplitRule::Fractions(vec![1.0])).is_err());
        assert!(Splitter::new(SplitRule::Fractions(vec![0.5, 0.6])).is_err());
        assert!(Splitter::new(SplitRule::FixedFlows(vec![])).is_err());
        assert_eq!(
            Splitter::new(SplitRule::FixedFlows(vec![kgps(0.1)])).unwrap().outlet_count(),
            2
        );
    }

    #[test]
    fn fixed_flows_and_remainder() {
        let props = PerfectFluidEngine::new();
        let eq = CurveFitEquilibrium::new();
        let adapter = PropertyAdapter::new(&props, &eq);
        let inlet = [FlowState::propellant(&adapter, Propellant::Rp1, kgps(1.0), bar(80.0), k(265.0)).unwrap()];
        let splitter = Splitter::new(SplitRule::FixedFlows(vec![kgps(0.1)])).unwrap();

        let out = splitter.evaluate(&adapter, &EvalInputs::new(&inlet)).unwrap();
        assert!((out.outlets[0].mass_flow.value - 0.1).abs() < 1e-12);
        assert!((out.outlets[1].mass_flow.value - 0.9).abs() < 1e-12);
        assert_eq!(out.outlets[1].pressure, inlet[0].pressure);

        let adj = [Adjustment::OutletFlow {
            index: 0,
            mass_flow: kgps(0.25),
        }];
        let out = splitter
            .evaluate(&adapter, &EvalInputs::new(&inlet).with_adjustments(&adj))
            .unwrap();
        assert!((out.outlets[1].mass_flow.value - 0.75).abs() < 1e-12);

        let adj = [Adjustment::OutletFlow {
            index: 0,
            mass_flow: kgps(1.5),
        }];
        assert!(matches!(
            splitter.evaluate(&adapter, &EvalInputs::new(&inlet).with_adjustments(&adj)),
            Err(ComponentError::Infeasible { .. })
        ));
    }
}
