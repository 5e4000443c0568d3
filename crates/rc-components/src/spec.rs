//! Tagged component configuration and dispatch.

use std::fmt;

use crate::chamber::Chamber;
use crate::cooling::CoolingChannel;
use crate::error::ComponentResult;
use crate::heat_exchanger::HeatExchanger;
use crate::merger::Merger;
use crate::nozzle::Nozzle;
use crate::pump::Pump;
use crate::splitter::Splitter;
use crate::tank::Tank;
use crate::traits::{ComponentOutput, EvalInputs, UnitModel};
use crate::turbine::Turbine;
use rc_core::units::{MassRate, Pressure};
use rc_fluids::PropertyAdapter;
use rc_graph::Arity;

/// Component type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Tank,
    Pump,
    Turbine,
    Chamber,
    CoolingChannel,
    HeatExchanger,
    Nozzle,
    Splitter,
    Merger,
}

impl ComponentKind {
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Tank => "tank",
            ComponentKind::Pump => "pump",
            ComponentKind::Turbine => "turbine",
            ComponentKind::Chamber => "chamber",
            ComponentKind::CoolingChannel => "cooling channel",
            ComponentKind::HeatExchanger => "heat exchanger",
            ComponentKind::Nozzle => "nozzle",
            ComponentKind::Splitter => "splitter",
            ComponentKind::Merger => "merger",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated, immutable configuration of one cycle component.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentSpec {
    Tank(Tank),
    Pump(Pump),
    Turbine(Turbine),
    Chamber(Chamber),
    CoolingChannel(CoolingChannel),
    HeatExchanger(HeatExchanger),
    Nozzle(Nozzle),
    Splitter(Splitter),
    Merger(Merger),
}

impl ComponentSpec {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentSpec::Tank(_) => ComponentKind::Tank,
            ComponentSpec::Pump(_) => ComponentKind::Pump,
            ComponentSpec::Turbine(_) => ComponentKind::Turbine,
            ComponentSpec::Chamber(_) => ComponentKind::Chamber,
            ComponentSpec::CoolingChannel(_) => ComponentKind::CoolingChannel,
            ComponentSpec::HeatExchanger(_) => ComponentKind::HeatExchanger,
            ComponentSpec::Nozzle(_) => ComponentKind::Nozzle,
            ComponentSpec::Splitter(_) => ComponentKind::Splitter,
            ComponentSpec::Merger(_) => ComponentKind::Merger,
        }
    }

    fn model(&self) -> &dyn UnitModel {
        match self {
            ComponentSpec::Tank(c) => c,
            ComponentSpec::Pump(c) => c,
            ComponentSpec::Turbine(c) => c,
            ComponentSpec::Chamber(c) => c,
            ComponentSpec::CoolingChannel(c) => c,
            ComponentSpec::HeatExchanger(c) => c,
            ComponentSpec::Nozzle(c) => c,
            ComponentSpec::Splitter(c) => c,
            ComponentSpec::Merger(c) => c,
        }
    }

    pub fn as_chamber(&self) -> Option<&Chamber> {
        match self {
            ComponentSpec::Chamber(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_cooling_channel(&self) -> Option<&CoolingChannel> {
        match self {
            ComponentSpec::CoolingChannel(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tank(&self) -> Option<&Tank> {
        match self {
            ComponentSpec::Tank(t) => Some(t),
            _ => None,
        }
    }

    /// Copy with a new chamber pressure; `None` unless this is a chamber.
    pub fn with_chamber_pressure(&self, pc: Pressure) -> Option<ComponentResult<Self>> {
        self.as_chamber()
            .map(|c| c.with_chamber_pressure(pc).map(ComponentSpec::Chamber))
    }

    /// Copy with a new delivered flow; `None` unless this is a tank.
    pub fn with_mass_flow(&self, mass_flow: MassRate) -> Option<ComponentResult<Self>> {
        self.as_tank()
            .map(|t| t.with_mass_flow(mass_flow).map(ComponentSpec::Tank))
    }
}

impl UnitModel for ComponentSpec {
    fn arity(&self) -> Arity {
        self.model().arity()
    }

    fn evaluate(
        &self,
        adapter: &PropertyAdapter<'_>,
        inputs: &EvalInputs<'_>,
    ) -> ComponentResult<ComponentOutput> {
        self.model().evaluate(adapter, inputs)
    }
}

macro_rules! impl_from_model {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for ComponentSpec {
                fn from(value: $ty) -> Self {
                    ComponentSpec::$ty(value)
                }
            }
        )*
    };
}

impl_from_model!(
    Tank,
    Pump,
    Turbine,
    Chamber,
    CoolingChannel,
    HeatExchanger,
    Nozzle,
    Splitter,
    Merger
);
