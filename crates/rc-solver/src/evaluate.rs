//! One forward pass over the torn cycle.

use rc_components::{Adjustment, ComponentOutput, ComponentSpec, EvalInputs, UnitModel};
use rc_core::units::{kgps, pa, watts};
use rc_core::{CompId, LinkId, StreamId};
use rc_fluids::{FlowState, PropertyAdapter, Validity};
use rc_graph::LinkKind;

use crate::cycle::{Closure, CycleGraph, HeatSource, LinkRole, StreamQuantity, Unknown};
use crate::error::{SolverError, SolverResult};

/// Everything computed by one pass.
#[derive(Debug, Clone)]
pub(crate) struct CyclePass {
    /// Indexed by stream slot. Torn streams hold the producer's value.
    pub streams: Vec<FlowState>,
    /// Indexed by component slot.
    pub outputs: Vec<ComponentOutput>,
    /// One per break variable.
    pub residuals: Vec<f64>,
    /// Computed link values (pump power, absorbed heat), by link slot.
    pub link_values: Vec<f64>,
}

pub(crate) enum Pass {
    Complete(Box<CyclePass>),
    NonPhysical { stream: String, reason: String },
}

struct Partial<'c> {
    cycle: &'c CycleGraph,
    values: &'c [f64],
    streams: Vec<Option<FlowState>>,
    outputs: Vec<Option<ComponentOutput>>,
}

impl Partial<'_> {
    fn guess(&self, unknown: Unknown) -> Option<f64> {
        self.cycle
            .break_variables()
            .iter()
            .position(|b| b.unknown == unknown)
            .and_then(|i| self.values.get(i).copied())
    }

    fn output(&self, comp: CompId) -> SolverResult<&ComponentOutput> {
        self.outputs
            .get(comp.slot())
            .and_then(Option::as_ref)
            .ok_or_else(|| SolverError::Numeric {
                what: format!(
                    "'{}' read before it was evaluated",
                    self.cycle.component_name(comp)
                ),
            })
    }

    /// Value a link delivers as computed by its source component.
    fn computed_link(&self, link: LinkId) -> SolverResult<f64> {
        match self.cycle.link_role(link) {
            Some(LinkRole::Shaft { pump }) => Ok(self.output(pump)?.shaft_power.value),
            Some(LinkRole::Heat { chamber, source }) => {
                let output = self.output(chamber)?;
                let report = output.chamber.as_ref().ok_or_else(|| SolverError::Numeric {
                    what: format!(
                        "'{}' produced no chamber report",
                        self.cycle.component_name(chamber)
                    ),
                })?;
                match source {
                    HeatSource::Fraction(fraction) => Ok(fraction * report.heat_release.value),
                    HeatSource::Wall(wall) => {
                        let products = output.outlets.first().ok_or_else(|| SolverError::Numeric {
                            what: format!(
                                "'{}' produced no outlet",
                                self.cycle.component_name(chamber)
                            ),
                        })?;
                        let load = wall.evaluate(report, products).map_err(|source| {
                            SolverError::Component {
                                component: self.cycle.component_name(chamber).to_string(),
                                source,
                                last_state: None,
                            }
                        })?;
                        Ok(load.heat_load.value)
                    }
                }
            }
            None => Err(SolverError::setup(format!("link #{link} has no role"))),
        }
    }

    /// Guess for a torn link, otherwise the computed value.
    fn link_value(&self, link: LinkId) -> SolverResult<f64> {
        match self.guess(Unknown::Link(link)) {
            Some(v) => Ok(v),
            None => self.computed_link(link),
        }
    }

    fn inlet(
        &self,
        adapter: &PropertyAdapter<'_>,
        stream: StreamId,
    ) -> SolverResult<Result<FlowState, (String, String)>> {
        let Some(seed) = self.cycle.seed(stream) else {
            return self
                .streams
                .get(stream.slot())
                .and_then(Option::clone)
                .map(Ok)
                .ok_or_else(|| SolverError::Numeric {
                    what: format!("stream #{stream} read before it was written"),
                });
        };
        let q = |quantity| {
            self.guess(Unknown::Stream { stream, quantity })
                .ok_or_else(|| SolverError::setup(format!("torn stream #{stream} has no guess")))
        };
        let m = q(StreamQuantity::MassFlow)?;
        let p = q(StreamQuantity::Pressure)?;
        let h = q(StreamQuantity::Enthalpy)?;
        let name = self.stream_name(stream);
        if !(m >= 0.0) || !(p > 0.0) || !h.is_finite() {
            return Ok(Err((name, format!("guess m={m} kg/s, p={p} Pa, h={h} J/kg"))));
        }
        match seed.with_mass_flow(kgps(m)).at_ph(adapter, pa(p), h) {
            Ok(state) => Ok(Ok(state)),
            Err(e) => Ok(Err((name, e.to_string()))),
        }
    }

    fn stream_name(&self, stream: StreamId) -> String {
        self.cycle
            .graph()
            .stream(stream)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("#{stream}"))
    }

    fn adjustments(&self, comp: CompId) -> Vec<Adjustment> {
        self.cycle
            .break_variables()
            .iter()
            .zip(self.values)
            .filter_map(|(var, &v)| match var.unknown {
                Unknown::TankMassFlow(c) if c == comp => Some(Adjustment::MassFlow(kgps(v))),
                Unknown::PumpDischarge(c) if c == comp => {
                    Some(Adjustment::DischargePressure(pa(v)))
                }
                Unknown::TurbinePressureRatio(c) if c == comp => {
                    Some(Adjustment::PressureRatio(v))
                }
                Unknown::SplitterFlow { splitter, outlet } if splitter == comp => {
                    Some(Adjustment::OutletFlow {
                        index: outlet,
                        mass_flow: kgps(v),
                    })
                }
                _ => None,
            })
            .collect()
    }
}

/// Evaluate every component once, in order, with break variables at
/// `values`.
///
/// Stops early with [`Pass::NonPhysical`] at the first stream that leaves
/// its envelope. Component and adapter errors carry the component name.
pub(crate) fn forward_pass(
    cycle: &CycleGraph,
    adapter: &PropertyAdapter<'_>,
    values: &[f64],
) -> SolverResult<Pass> {
    let graph = cycle.graph();
    let mut pass = Partial {
        cycle,
        values,
        streams: vec![None; graph.streams().len()],
        outputs: vec![None; graph.components().len()],
    };

    for &comp in cycle.evaluation_order() {
        let name = cycle.component_name(comp);
        let spec = cycle
            .spec(comp)
            .ok_or_else(|| SolverError::setup(format!("no spec for '{name}'")))?;

        let mut inlets = Vec::new();
        for stream in graph.inlet_streams(comp) {
            match pass.inlet(adapter, stream)? {
                Ok(state) => inlets.push(state),
                Err((stream, reason)) => return Ok(Pass::NonPhysical { stream, reason }),
            }
        }

        let adjustments = pass.adjustments(comp);
        let mut inputs = EvalInputs::new(&inlets).with_adjustments(&adjustments);
        if let ComponentSpec::Turbine(_) = spec
            && let Some(shaft) = cycle.shafts().iter().find(|s| s.turbine == comp)
        {
            let mut demand = 0.0;
            for &(_, link) in &shaft.pumps {
                demand += pass.link_value(link)?;
            }
            inputs = inputs.with_shaft_demand(watts(demand / shaft.mechanical_efficiency));
        }
        if let ComponentSpec::CoolingChannel(_) = spec {
            let mut heat = None;
            for link in graph.links_into(comp, LinkKind::Heat) {
                *heat.get_or_insert(0.0) += pass.link_value(link.id)?;
            }
            if let Some(q) = heat {
                inputs = inputs.with_heat_load(watts(q));
            }
        }

        let mut output = spec
            .evaluate(adapter, &inputs)
            .map_err(|source| SolverError::Component {
                component: name.to_string(),
                source,
                last_state: None,
            })?;

        let outlet_streams = graph.outlet_streams(comp);
        if outlet_streams.len() != output.outlets.len() {
            return Err(SolverError::Numeric {
                what: format!(
                    "'{name}' produced {} outlets for {} streams",
                    output.outlets.len(),
                    outlet_streams.len()
                ),
            });
        }
        for (stream, state) in outlet_streams.iter().zip(output.outlets.iter_mut()) {
            state.validity = adapter.classify(state);
            if let Validity::Invalid(reason) = &state.validity {
                return Ok(Pass::NonPhysical {
                    stream: pass.stream_name(*stream),
                    reason: reason.clone(),
                });
            }
            if let Some(slot) = pass.streams.get_mut(stream.slot()) {
                *slot = Some(state.clone());
            }
        }
        if let Some(slot) = pass.outputs.get_mut(comp.slot()) {
            *slot = Some(output);
        }
    }

    let link_values = graph
        .links()
        .iter()
        .map(|l| pass.computed_link(l.id))
        .collect::<SolverResult<Vec<f64>>>()?;

    let mut residuals = Vec::with_capacity(values.len());
    for (var, &value) in cycle.break_variables().iter().zip(values) {
        let r = match var.closure {
            Closure::Balance { component, kind } => pass
                .output(component)?
                .residual(kind)
                .ok_or_else(|| SolverError::Numeric {
                    what: format!(
                        "'{}' reported no {kind:?} balance for '{}'",
                        cycle.component_name(component),
                        var.name
                    ),
                })?,
            Closure::Link(link) => {
                let computed = link_values.get(link.slot()).copied().unwrap_or(f64::NAN);
                (computed - value) / var.scale
            }
            Closure::Stream { stream, quantity } => {
                let computed = pass
                    .streams
                    .get(stream.slot())
                    .and_then(Option::as_ref)
                    .map_or(f64::NAN, |s| quantity.of(s));
                (computed - value) / var.scale
            }
        };
        if !r.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("residual of '{}' is not finite", var.name),
            });
        }
        residuals.push(r);
    }

    let streams = pass
        .streams
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| SolverError::Numeric {
            what: "a stream was never written".into(),
        })?;
    let outputs = pass
        .outputs
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| SolverError::Numeric {
            what: "a component was never evaluated".into(),
        })?;

    Ok(Pass::Complete(Box::new(CyclePass {
        streams,
        outputs,
        residuals,
        link_values,
    })))
}
