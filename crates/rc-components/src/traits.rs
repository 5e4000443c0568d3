//! Evaluation contract shared by all component models.

use crate::chamber::ChamberReport;
use crate::cooling::CoolingReport;
use crate::error::ComponentResult;
use crate::nozzle::NozzlePerformance;
use rc_core::units::{MassRate, Power, Pressure, watts};
use rc_fluids::{FlowState, PropertyAdapter};
use rc_graph::Arity;

/// Value of a break variable routed to the component that owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Tank delivery.
    MassFlow(MassRate),
    /// Pump or turbine outlet pressure.
    DischargePressure(Pressure),
    /// Turbine expansion ratio p_in/p_out.
    PressureRatio(f64),
    /// Splitter fixed outlet flow.
    OutletFlow { index: usize, mass_flow: MassRate },
}

/// Everything a component needs for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalInputs<'a> {
    pub inlets: &'a [FlowState],
    pub adjustments: &'a [Adjustment],
    /// Power the shaft asks of a turbine [W], after mechanical losses.
    pub shaft_demand: Option<Power>,
    /// Heat delivered to a cooling channel [W].
    pub heat_load: Option<Power>,
}

impl<'a> EvalInputs<'a> {
    pub fn new(inlets: &'a [FlowState]) -> Self {
        Self {
            inlets,
            adjustments: &[],
            shaft_demand: None,
            heat_load: None,
        }
    }

    pub fn with_adjustments(mut self, adjustments: &'a [Adjustment]) -> Self {
        self.adjustments = adjustments;
        self
    }

    pub fn with_shaft_demand(mut self, demand: Power) -> Self {
        self.shaft_demand = Some(demand);
        self
    }

    pub fn with_heat_load(mut self, heat: Power) -> Self {
        self.heat_load = Some(heat);
        self
    }

    pub fn mass_flow(&self) -> Option<MassRate> {
        self.adjustments.iter().find_map(|a| match a {
            Adjustment::MassFlow(m) => Some(*m),
            _ => None,
        })
    }

    pub fn discharge_pressure(&self) -> Option<Pressure> {
        self.adjustments.iter().find_map(|a| match a {
            Adjustment::DischargePressure(p) => Some(*p),
            _ => None,
        })
    }

    pub fn pressure_ratio(&self) -> Option<f64> {
        self.adjustments.iter().find_map(|a| match a {
            Adjustment::PressureRatio(r) => Some(*r),
            _ => None,
        })
    }

    pub fn outlet_flow(&self, index: usize) -> Option<MassRate> {
        self.adjustments.iter().find_map(|a| match a {
            Adjustment::OutletFlow { index: i, mass_flow } if *i == index => Some(*mass_flow),
            _ => None,
        })
    }
}

/// Which balance equation a residual belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceKind {
    /// Turbine output against shaft demand.
    ShaftPower,
    /// Chamber mixture ratio against its target.
    MixtureRatio,
    /// Injector feed pressure on one chamber inlet.
    FeedPressure { inlet: usize },
    /// Cooling channel outlet temperature against its limit.
    CoolantTemperature,
}

/// A normalized residual (zero when balanced).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    pub kind: BalanceKind,
    pub residual: f64,
}

/// Result of one component evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentOutput {
    pub outlets: Vec<FlowState>,
    /// Positive consumed from the shaft, negative delivered to it.
    pub shaft_power: Power,
    /// Heat into the fluid.
    pub heat_rate: Power,
    pub balances: Vec<Balance>,
    pub chamber: Option<ChamberReport>,
    pub nozzle: Option<NozzlePerformance>,
    pub cooling: Option<CoolingReport>,
    /// Non-fatal conditions (temperature limits, unchoked flow).
    pub warnings: Vec<String>,
}

impl ComponentOutput {
    pub fn new(outlets: Vec<FlowState>) -> Self {
        Self {
            outlets,
            shaft_power: watts(0.0),
            heat_rate: watts(0.0),
            balances: Vec::new(),
            chamber: None,
            nozzle: None,
            cooling: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_shaft_power(mut self, power: Power) -> Self {
        self.shaft_power = power;
        self
    }

    pub fn with_heat_rate(mut self, heat: Power) -> Self {
        self.heat_rate = heat;
        self
    }

    pub fn push_balance(&mut self, kind: BalanceKind, residual: f64) {
        self.balances.push(Balance { kind, residual });
    }

    /// Residual of the given balance, if the component reported one.
    pub fn residual(&self, kind: BalanceKind) -> Option<f64> {
        self.balances
            .iter()
            .find(|b| b.kind == kind)
            .map(|b| b.residual)
    }
}

/// A rocket-engine component model.
///
/// Evaluation is a pure function of the spec and the inputs apart from
/// adapter cache reads.
pub trait UnitModel: Send + Sync {
    /// Port counts this configuration requires.
    fn arity(&self) -> Arity;

    fn evaluate(
        &self,
        adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_core::units::{bar, kgps};

    #[test]
    fn adjustments_are_looked_up_by_kind() {
        let adj = [
            Adjustment::DischargePressure(bar(70.0)),
            Adjustment::OutletFlow {
                index: 1,
                mass_flow: kgps(0.2),
            },
        ];
        let inputs = EvalInputs::new(&[]).with_adjustments(&adj);
        assert_eq!(inputs.discharge_pressure(), Some(bar(70.0)));
        assert_eq!(inputs.mass_flow(), None);
        assert_eq!(inputs.outlet_flow(1), Some(kgps(0.2)));
        assert_eq!(inputs.outlet_flow(0), None);
    }

    #[test]
    fn residual_lookup() {
        let mut out = ComponentOutput::new(Vec::new());
        out.push_balance(BalanceKind::FeedPressure { inlet: 1 }, 0.25);
        assert_eq!(out.residual(BalanceKind::FeedPressure { inlet: 1 }), Some(0.25));
        assert_eq!(out.residual(BalanceKind::ShaftPower), None);
    }
}
