//! Cycle assembly: component specs on a graph, shafts, heat links and
//! break variables.

use std::collections::BTreeMap;
use std::fmt;

use rc_components::{
    BalanceKind, ComponentSpec, ElectricDrive, SplitRule, TurbineMode, UnitModel, WallHeatFlux,
};
use rc_core::units::{MassRate, Pressure};
use rc_core::{CompId, LinkId, ShaftId, StreamId};
use rc_fluids::FlowState;
use rc_graph::{Graph, GraphBuilder, LinkKind, Via};
use uom::si::mass_rate::kilogram_per_second;
use uom::si::pressure::pascal;

use crate::error::{SolverError, SolverResult};

/// Which component quantity a break variable drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unknown {
    /// Tank delivery [kg/s].
    TankMassFlow(CompId),
    /// Pump outlet pressure [Pa].
    PumpDischarge(CompId),
    /// Turbine expansion ratio p_in/p_out.
    TurbinePressureRatio(CompId),
    /// Fixed outlet flow of a splitter [kg/s].
    SplitterFlow { splitter: CompId, outlet: usize },
    /// Value carried by a torn link: pump power or absorbed heat [W].
    Link(LinkId),
    /// One quantity of a torn stream.
    Stream {
        stream: StreamId,
        quantity: StreamQuantity,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamQuantity {
    MassFlow,
    Pressure,
    Enthalpy,
}

impl StreamQuantity {
    pub const ALL: [StreamQuantity; 3] = [
        StreamQuantity::MassFlow,
        StreamQuantity::Pressure,
        StreamQuantity::Enthalpy,
    ];

    pub fn of(self, state: &FlowState) -> f64 {
        match self {
            StreamQuantity::MassFlow => state.mass_flow.get::<kilogram_per_second>(),
            StreamQuantity::Pressure => state.pressure.get::<pascal>(),
            StreamQuantity::Enthalpy => state.enthalpy,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            StreamQuantity::MassFlow => "mass_flow",
            StreamQuantity::Pressure => "pressure",
            StreamQuantity::Enthalpy => "enthalpy",
        }
    }

    /// Default (bounds, scale floor).
    fn limits(self) -> ((f64, f64), f64) {
        match self {
            StreamQuantity::MassFlow => ((0.0, f64::INFINITY), 0.1),
            StreamQuantity::Pressure => ((1e3, 1e9), 1e5),
            StreamQuantity::Enthalpy => ((f64::NEG_INFINITY, f64::INFINITY), 1e4),
        }
    }
}

/// Equation that closes a break variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Closure {
    /// A balance residual reported by a component.
    Balance { component: CompId, kind: BalanceKind },
    /// Computed link value minus its guess.
    Link(LinkId),
    /// Computed stream quantity minus its guess.
    Stream {
        stream: StreamId,
        quantity: StreamQuantity,
    },
}

/// A free unknown of the cycle with its closing equation.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakVariable {
    pub name: String,
    pub unknown: Unknown,
    pub closure: Closure,
    pub initial: f64,
    /// Inclusive physical bounds on the value.
    pub bounds: (f64, f64),
    /// Typical magnitude; sets step limits, difference steps and the
    /// normalization of torn-edge residuals.
    pub scale: f64,
}

impl BreakVariable {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.bounds.0 && value <= self.bounds.1
    }
}

/// User-declared break variable; unset fields default from the unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakVariableDef {
    pub name: String,
    pub unknown: Unknown,
    pub closure: Closure,
    pub initial: Option<f64>,
    pub bounds: Option<(f64, f64)>,
    pub scale: Option<f64>,
}

impl BreakVariableDef {
    pub fn new(name: impl Into<String>, unknown: Unknown, closure: Closure) -> Self {
        Self {
            name: name.into(),
            unknown,
            closure,
            initial: None,
            bounds: None,
            scale: None,
        }
    }

    pub fn with_initial(mut self, value: f64) -> Self {
        self.initial = Some(value);
        self
    }

    pub fn with_bounds(mut self, lo: f64, hi: f64) -> Self {
        self.bounds = Some((lo, hi));
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Pumps driven by one turbine.
#[derive(Debug, Clone, PartialEq)]
pub struct Shaft {
    pub name: String,
    pub turbine: CompId,
    /// Each pump with the link carrying its demand.
    pub pumps: Vec<(CompId, LinkId)>,
    pub mechanical_efficiency: f64,
}

/// Pumps driven by a battery-fed motor instead of a turbine.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricShaft {
    pub name: String,
    pub pumps: Vec<CompId>,
    pub drive: ElectricDrive,
    pub mechanical_efficiency: f64,
}

/// How much of a chamber's heat a cooling channel absorbs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeatSource {
    /// Fixed share of the chamber's heat release.
    Fraction(f64),
    /// Wall flux computed from the chamber's operating point.
    Wall(WallHeatFlux),
}

/// Heat path from a chamber wall into a cooling channel.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatLink {
    pub link: LinkId,
    pub chamber: CompId,
    pub channel: CompId,
    pub source: HeatSource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LinkRole {
    Shaft { pump: CompId },
    Heat { chamber: CompId, source: HeatSource },
}

/// Incremental cycle description.
#[derive(Debug, Default)]
pub struct CycleBuilder {
    graph: GraphBuilder,
    specs: Vec<ComponentSpec>,
    shafts: Vec<Shaft>,
    electric_shafts: Vec<ElectricShaft>,
    heat_links: Vec<HeatLink>,
    link_roles: Vec<LinkRole>,
    seeds: BTreeMap<StreamId, FlowState>,
    declared: Vec<BreakVariableDef>,
}

impl CycleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stream(&mut self, name: impl Into<String>) -> StreamId {
        self.graph.add_stream(name)
    }

    /// Add a component; ports follow the order of `inlets` and `outlets`.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        spec: impl Into<ComponentSpec>,
        inlets: &[StreamId],
        outlets: &[StreamId],
    ) -> CompId {
        let spec = spec.into();
        let id = self.graph.add_component(name, spec.arity(), inlets, outlets);
        self.specs.push(spec);
        id
    }

    /// Couple pumps to the turbine that drives them.
    pub fn add_shaft(
        &mut self,
        name: impl Into<String>,
        pumps: &[CompId],
        turbine: CompId,
        mechanical_efficiency: f64,
    ) -> ShaftId {
        let id = ShaftId::from_index(self.shafts.len() as u32);
        let pumps = pumps
            .iter()
            .map(|&pump| {
                let link = self.graph.add_link(pump, turbine, LinkKind::Shaft);
                self.link_roles.push(LinkRole::Shaft { pump });
                (pump, link)
            })
            .collect();
        self.shafts.push(Shaft {
            name: name.into(),
            turbine,
            pumps,
            mechanical_efficiency,
        });
        id
    }

    /// Drive pumps from an electric motor. The pumps' draw sizes the
    /// drive after the solve; it adds no equations.
    pub fn add_electric_shaft(
        &mut self,
        name: impl Into<String>,
        pumps: &[CompId],
        drive: ElectricDrive,
        mechanical_efficiency: f64,
    ) {
        self.electric_shafts.push(ElectricShaft {
            name: name.into(),
            pumps: pumps.to_vec(),
            drive,
            mechanical_efficiency,
        });
    }

    /// Route `fraction` of a chamber's heat release into a cooling channel.
    pub fn add_heat_link(&mut self, chamber: CompId, channel: CompId, fraction: f64) -> LinkId {
        self.link_heat(chamber, channel, HeatSource::Fraction(fraction))
    }

    /// Cool a chamber wall; the load follows the wall flux at the
    /// chamber's current operating point.
    pub fn add_wall_heat_link(&mut self, chamber: CompId, channel: CompId, wall: WallHeatFlux) -> LinkId {
        self.link_heat(chamber, channel, HeatSource::Wall(wall))
    }

    fn link_heat(&mut self, chamber: CompId, channel: CompId, source: HeatSource) -> LinkId {
        let link = self.graph.add_link(chamber, channel, LinkKind::Heat);
        self.link_roles.push(LinkRole::Heat { chamber, source });
        self.heat_links.push(HeatLink {
            link,
            chamber,
            channel,
            source,
        });
        link
    }

    /// Starting state for a stream that closes a loop. Also fixes the
    /// fluid carried by the torn stream.
    pub fn seed_stream(&mut self, stream: StreamId, state: FlowState) {
        self.seeds.insert(stream, state);
    }

    pub fn add_break_variable(&mut self, def: BreakVariableDef) {
        self.declared.push(def);
    }

    /// Validate and freeze the cycle.
    ///
    /// Dependency loops are torn automatically; each torn link becomes one
    /// break variable and each torn stream three (flow, pressure, enthalpy).
    pub fn build(self) -> SolverResult<CycleGraph> {
        let graph = self.graph.build()?;
        let name = |c: CompId| {
            graph
                .component(c)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("#{c}"))
        };
        let spec_of = |c: CompId| {
            self.specs
                .get(c.slot())
                .ok_or_else(|| SolverError::setup(format!("unknown component #{c}")))
        };

        for shaft in &self.shafts {
            if !matches!(spec_of(shaft.turbine)?, ComponentSpec::Turbine(_)) {
                return Err(SolverError::setup(format!(
                    "shaft '{}' must be driven by a turbine, not '{}'",
                    shaft.name,
                    name(shaft.turbine)
                )));
            }
            if shaft.pumps.is_empty() {
                return Err(SolverError::setup(format!("shaft '{}' drives no pumps", shaft.name)));
            }
            for &(pump, _) in &shaft.pumps {
                if !matches!(spec_of(pump)?, ComponentSpec::Pump(_)) {
                    return Err(SolverError::setup(format!(
                        "shaft '{}' loads '{}', which is not a pump",
                        shaft.name,
                        name(pump)
                    )));
                }
            }
            let eta = shaft.mechanical_efficiency;
            if !(eta > 0.0 && eta <= 1.0) {
                return Err(SolverError::setup(format!(
                    "shaft '{}' mechanical efficiency must be in (0, 1]",
                    shaft.name
                )));
            }
        }
        for (i, shaft) in self.electric_shafts.iter().enumerate() {
            if shaft.pumps.is_empty() {
                return Err(SolverError::setup(format!("shaft '{}' drives no pumps", shaft.name)));
            }
            for &pump in &shaft.pumps {
                if !matches!(spec_of(pump)?, ComponentSpec::Pump(_)) {
                    return Err(SolverError::setup(format!(
                        "shaft '{}' loads '{}', which is not a pump",
                        shaft.name,
                        name(pump)
                    )));
                }
                let elsewhere = self.shafts.iter().any(|s| s.pumps.iter().any(|(p, _)| *p == pump))
                    || self.electric_shafts[i + 1..].iter().any(|s| s.pumps.contains(&pump));
                if elsewhere {
                    return Err(SolverError::setup(format!(
                        "pump '{}' is on more than one shaft",
                        name(pump)
                    )));
                }
            }
            let eta = shaft.mechanical_efficiency;
            if !(eta > 0.0 && eta <= 1.0) {
                return Err(SolverError::setup(format!(
                    "shaft '{}' mechanical efficiency must be in (0, 1]",
                    shaft.name
                )));
            }
        }
        for (i, a) in self.shafts.iter().enumerate() {
            for b in &self.shafts[i + 1..] {
                let shared_pump = a
                    .pumps
                    .iter()
                    .any(|(p, _)| b.pumps.iter().any(|(q, _)| p == q));
                if a.turbine == b.turbine || shared_pump {
                    return Err(SolverError::setup(format!(
                        "shafts '{}' and '{}' share a component",
                        a.name, b.name
                    )));
                }
            }
        }

        for link in &self.heat_links {
            if !matches!(spec_of(link.chamber)?, ComponentSpec::Chamber(_))
                || !matches!(spec_of(link.channel)?, ComponentSpec::CoolingChannel(_))
            {
                return Err(SolverError::setup(format!(
                    "heat link '{}' -> '{}' must join a chamber to a cooling channel",
                    name(link.chamber),
                    name(link.channel)
                )));
            }
            if let HeatSource::Fraction(f) = link.source
                && !(0.0..=1.0).contains(&f)
            {
                return Err(SolverError::setup(format!(
                    "heat fraction into '{}' must be in [0, 1]",
                    name(link.channel)
                )));
            }
        }

        for component in graph.components() {
            match spec_of(component.id)? {
                ComponentSpec::Turbine(t)
                    if matches!(t.mode(), TurbineMode::MatchDemand { .. })
                        && !self.shafts.iter().any(|s| s.turbine == component.id) =>
                {
                    return Err(SolverError::setup(format!(
                        "turbine '{}' matches shaft demand but drives no shaft",
                        component.name
                    )));
                }
                ComponentSpec::CoolingChannel(c)
                    if c.heat_load().is_none()
                        && !self.heat_links.iter().any(|l| l.channel == component.id) =>
                {
                    return Err(SolverError::setup(format!(
                        "cooling channel '{}' has neither a heat load nor a heat link",
                        component.name
                    )));
                }
                _ => {}
            }
        }

        let mut break_variables = Vec::with_capacity(self.declared.len());
        for def in self.declared {
            break_variables.push(resolve(&graph, &self.specs, def)?);
        }

        let torn = graph.feedback_set();
        for via in &torn {
            match *via {
                Via::Link(link) => {
                    let (from, to) = graph
                        .link(link)
                        .map(|l| (name(l.from), name(l.to)))
                        .ok_or_else(|| SolverError::setup(format!("unknown link #{link}")))?;
                    break_variables.push(BreakVariable {
                        name: format!("{from}->{to}"),
                        unknown: Unknown::Link(link),
                        closure: Closure::Link(link),
                        initial: 0.0,
                        bounds: (0.0, f64::INFINITY),
                        scale: 1e3,
                    });
                }
                Via::Stream(stream) => {
                    let stream_name = graph
                        .stream(stream)
                        .map(|s| s.name.clone())
                        .unwrap_or_default();
                    let seed = self.seeds.get(&stream).ok_or_else(|| {
                        SolverError::setup(format!(
                            "stream '{stream_name}' closes a loop and needs a seed state"
                        ))
                    })?;
                    for quantity in StreamQuantity::ALL {
                        let initial = quantity.of(seed);
                        let (bounds, floor) = quantity.limits();
                        break_variables.push(BreakVariable {
                            name: format!("{stream_name}.{}", quantity.suffix()),
                            unknown: Unknown::Stream { stream, quantity },
                            closure: Closure::Stream { stream, quantity },
                            initial,
                            bounds,
                            scale: initial.abs().max(floor),
                        });
                    }
                }
            }
        }

        for (i, a) in break_variables.iter().enumerate() {
            for b in &break_variables[i + 1..] {
                if a.unknown == b.unknown {
                    return Err(SolverError::setup(format!(
                        "break variables '{}' and '{}' drive the same unknown",
                        a.name, b.name
                    )));
                }
                if a.closure == b.closure {
                    return Err(SolverError::setup(format!(
                        "break variables '{}' and '{}' share a closing equation",
                        a.name, b.name
                    )));
                }
            }
        }

        let order = graph.evaluation_order(&torn)?;
        let seeds = self
            .seeds
            .into_iter()
            .filter(|(s, _)| torn.contains(&Via::Stream(*s)))
            .collect();

        Ok(CycleGraph {
            graph,
            specs: self.specs,
            shafts: self.shafts,
            electric_shafts: self.electric_shafts,
            heat_links: self.heat_links,
            link_roles: self.link_roles,
            seeds,
            break_variables,
            torn,
            order,
        })
    }
}

/// Check a declared break variable against the specs and fill defaults.
fn resolve(graph: &Graph, specs: &[ComponentSpec], def: BreakVariableDef) -> SolverResult<BreakVariable> {
    let bad = |what: &str| SolverError::setup(format!("break variable '{}': {what}", def.name));
    let spec = |c: CompId| specs.get(c.slot()).ok_or_else(|| bad("unknown component"));

    let (default_initial, bounds, floor) = match def.unknown {
        Unknown::TankMassFlow(c) => match spec(c)? {
            ComponentSpec::Tank(t) => (
                Some(t.mass_flow().get::<kilogram_per_second>()),
                (0.0, f64::INFINITY),
                0.1,
            ),
            _ => return Err(bad("mass flow unknown must belong to a tank")),
        },
        Unknown::PumpDischarge(c) => match spec(c)? {
            ComponentSpec::Pump(p) => {
                let initial = match p.target() {
                    rc_components::PumpTarget::DischargePressure(p) => Some(p.get::<pascal>()),
                    rc_components::PumpTarget::PressureRatio(_) => None,
                };
                (initial, (1e3, 1e9), 1e5)
            }
            _ => return Err(bad("discharge unknown must belong to a pump")),
        },
        Unknown::TurbinePressureRatio(c) => match spec(c)? {
            ComponentSpec::Turbine(t) => {
                let initial = match t.mode() {
                    TurbineMode::PressureRatio(r) => Some(r),
                    _ => None,
                };
                (initial, (1.0, 1e4), 1.0)
            }
            _ => return Err(bad("pressure ratio unknown must belong to a turbine")),
        },
        Unknown::SplitterFlow { splitter, outlet } => match spec(splitter)? {
            ComponentSpec::Splitter(s) => match s.rule() {
                SplitRule::FixedFlows(flows) if outlet < flows.len() => {
                    (Some(flows[outlet].get::<kilogram_per_second>()), (0.0, f64::INFINITY), 0.1)
                }
                _ => return Err(bad("splitter outlet is not a fixed flow")),
            },
            _ => return Err(bad("outlet flow unknown must belong to a splitter")),
        },
        Unknown::Link(_) | Unknown::Stream { .. } => {
            return Err(bad("link and stream unknowns are created by tearing loops"));
        }
    };

    match def.closure {
        Closure::Balance { component, kind } => {
            let spec = spec(component)?;
            let ok = match kind {
                BalanceKind::ShaftPower => matches!(spec, ComponentSpec::Turbine(_)),
                BalanceKind::MixtureRatio => spec
                    .as_chamber()
                    .is_some_and(|c| c.mixture_ratio_target().is_some()),
                BalanceKind::FeedPressure { inlet } => spec.as_chamber().is_some() && inlet < 2,
                BalanceKind::CoolantTemperature => matches!(
                    spec,
                    ComponentSpec::CoolingChannel(c) if c.max_outlet_temperature().is_some()
                ),
            };
            if !ok {
                let component = graph
                    .component(component)
                    .map(|c| c.name.as_str())
                    .unwrap_or("?");
                return Err(bad(&format!("'{component}' cannot report a {kind:?} balance")));
            }
        }
        Closure::Link(_) | Closure::Stream { .. } => {
            return Err(bad("torn-edge closures are created by tearing loops"));
        }
    }

    let initial = def
        .initial
        .or(default_initial)
        .ok_or_else(|| bad("needs an initial value"))?;
    let bounds = def.bounds.unwrap_or(bounds);
    if !initial.is_finite() || bounds.0 > bounds.1 {
        return Err(bad("initial value must be finite and bounds ordered"));
    }
    let scale = def.scale.unwrap_or(initial.abs().max(floor));
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(bad("scale must be positive"));
    }

    Ok(BreakVariable {
        name: def.name,
        unknown: def.unknown,
        closure: def.closure,
        initial,
        bounds,
        scale,
    })
}

/// Immutable, validated cycle ready to solve.
#[derive(Debug, Clone)]
pub struct CycleGraph {
    graph: Graph,
    specs: Vec<ComponentSpec>,
    shafts: Vec<Shaft>,
    electric_shafts: Vec<ElectricShaft>,
    heat_links: Vec<HeatLink>,
    link_roles: Vec<LinkRole>,
    seeds: BTreeMap<StreamId, FlowState>,
    break_variables: Vec<BreakVariable>,
    torn: Vec<Via>,
    order: Vec<CompId>,
}

impl CycleGraph {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn spec(&self, id: CompId) -> Option<&ComponentSpec> {
        self.specs.get(id.slot())
    }

    pub fn component_name(&self, id: CompId) -> &str {
        self.graph
            .component(id)
            .map(|c| c.name.as_str())
            .unwrap_or("?")
    }

    pub fn shafts(&self) -> &[Shaft] {
        &self.shafts
    }

    pub fn electric_shafts(&self) -> &[ElectricShaft] {
        &self.electric_shafts
    }

    pub fn heat_links(&self) -> &[HeatLink] {
        &self.heat_links
    }

    /// Every free unknown, declared ones first, then torn edges.
    pub fn break_variables(&self) -> &[BreakVariable] {
        &self.break_variables
    }

    pub fn torn_edges(&self) -> &[Via] {
        &self.torn
    }

    pub fn evaluation_order(&self) -> &[CompId] {
        &self.order
    }

    pub fn initial_values(&self) -> Vec<f64> {
        self.break_variables.iter().map(|b| b.initial).collect()
    }

    pub(crate) fn link_role(&self, link: LinkId) -> Option<LinkRole> {
        self.link_roles.get(link.slot()).copied()
    }

    pub(crate) fn seed(&self, stream: StreamId) -> Option<&FlowState> {
        self.seeds.get(&stream)
    }

    /// Copy with a chamber run at a new pressure.
    pub fn with_chamber_pressure(&self, chamber: CompId, pc: Pressure) -> SolverResult<Self> {
        let spec = self
            .spec(chamber)
            .and_then(|s| s.with_chamber_pressure(pc))
            .ok_or_else(|| {
                SolverError::setup(format!("'{}' is not a chamber", self.component_name(chamber)))
            })?;
        self.replace_spec(chamber, spec)
    }

    /// Copy with a tank delivering a new mass flow.
    pub fn with_mass_flow(&self, tank: CompId, mass_flow: MassRate) -> SolverResult<Self> {
        let spec = self
            .spec(tank)
            .and_then(|s| s.with_mass_flow(mass_flow))
            .ok_or_else(|| {
                SolverError::setup(format!("'{}' is not a tank", self.component_name(tank)))
            })?;
        let mut cycle = self.replace_spec(tank, spec)?;
        for var in &mut cycle.break_variables {
            if var.unknown == Unknown::TankMassFlow(tank) {
                var.initial = mass_flow.get::<kilogram_per_second>();
            }
        }
        Ok(cycle)
    }

    fn replace_spec(
        &self,
        id: CompId,
        spec: rc_components::ComponentResult<ComponentSpec>,
    ) -> SolverResult<Self> {
        let spec = spec.map_err(|source| SolverError::Component {
            component: self.component_name(id).to_string(),
            source,
            last_state: None,
        })?;
        let mut cycle = self.clone();
        if let Some(slot) = cycle.specs.get_mut(id.slot()) {
            *slot = spec;
        }
        Ok(cycle)
    }
}

impl fmt::Display for CycleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} components, {} streams, {} shafts, {} break variables",
            self.graph.components().len(),
            self.graph.streams().len(),
            self.shafts.len(),
            self.break_variables.len()
        )
    }
}
