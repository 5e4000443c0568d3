//! Core graph data structures.

use rc_core::{CompId, LinkId, PortId, StreamId};

use crate::arity::Arity;

/// Direction/kind of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Inlet port (upstream connection).
    Inlet,
    /// Outlet port (downstream connection).
    Outlet,
}

/// A flow-state edge between a producing and a consuming component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub id: StreamId,
    pub name: String,
}

/// A port attaches a component to a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    pub comp: CompId,
    pub stream: StreamId,
    pub kind: PortKind,
}

/// A unit in the cycle (pump, chamber, splitter, ...).
///
/// Inlet and outlet ports are kept in declaration order; component models
/// rely on that order (e.g. hot side first for a heat exchanger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: CompId,
    pub name: String,
    pub arity: Arity,
    pub inlets: Vec<PortId>,
    pub outlets: Vec<PortId>,
}

/// Kind of non-flow coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Shaft power demand flows from a pump to the turbine driving it.
    Shaft,
    /// Heat released in a chamber is absorbed by a cooling channel.
    Heat,
}

/// Non-flow dependency: `to` needs a quantity computed by `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub from: CompId,
    pub to: CompId,
    pub kind: LinkKind,
}

/// The validated, immutable cycle topology.
///
/// Streams, components, ports and links live in vectors indexed by their IDs.
/// `stream_producer` / `stream_consumer` give the two ports of every stream.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) streams: Vec<Stream>,
    pub(crate) components: Vec<Component>,
    pub(crate) ports: Vec<Port>,
    pub(crate) links: Vec<Link>,
    pub(crate) stream_producer: Vec<PortId>,
    pub(crate) stream_consumer: Vec<PortId>,
}

impl Graph {
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn stream(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(id.slot())
    }

    pub fn component(&self, id: CompId) -> Option<&Component> {
        self.components.get(id.slot())
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.slot())
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.slot())
    }

    /// Find a component by name.
    pub fn find_component(&self, name: &str) -> Option<CompId> {
        self.components.iter().find(|c| c.name == name).map(|c| c.id)
    }

    /// Inlet streams of a component, in port order.
    pub fn inlet_streams(&self, comp: CompId) -> Vec<StreamId> {
        self.port_streams(comp, PortKind::Inlet)
    }

    /// Outlet streams of a component, in port order.
    pub fn outlet_streams(&self, comp: CompId) -> Vec<StreamId> {
        self.port_streams(comp, PortKind::Outlet)
    }

    fn port_streams(&self, comp: CompId, kind: PortKind) -> Vec<StreamId> {
        let Some(c) = self.component(comp) else {
            return Vec::new();
        };
        let ports = match kind {
            PortKind::Inlet => &c.inlets,
            PortKind::Outlet => &c.outlets,
        };
        ports
            .iter()
            .filter_map(|&p| self.port(p).map(|port| port.stream))
            .collect()
    }

    /// Component writing the stream.
    pub fn producer(&self, stream: StreamId) -> Option<CompId> {
        let port = self.stream_producer.get(stream.slot())?;
        self.port(*port).map(|p| p.comp)
    }

    /// Component reading the stream.
    pub fn consumer(&self, stream: StreamId) -> Option<CompId> {
        let port = self.stream_consumer.get(stream.slot())?;
        self.port(*port).map(|p| p.comp)
    }

    /// Components without outlets.
    pub fn sinks(&self) -> impl Iterator<Item = &Component> + '_ {
        self.components.iter().filter(|c| c.outlets.is_empty())
    }

    /// Links of the given kind ending at `comp`.
    pub fn links_into(&self, comp: CompId, kind: LinkKind) -> impl Iterator<Item = &Link> + '_ {
        self.links
            .iter()
            .filter(move |l| l.to == comp && l.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::arity::PortCount;
    use crate::builder::GraphBuilder;

    #[test]
    fn port_streams_follow_declaration_order() {
        let mut builder = GraphBuilder::new();
        let hot = builder.add_stream("hot");
        let cold = builder.add_stream("cold");
        let hot_out = builder.add_stream("hot_out");
        let cold_out = builder.add_stream("cold_out");
        builder.add_component("hot_tank", Arity::SOURCE, &[], &[hot]);
        builder.add_component("cold_tank", Arity::SOURCE, &[], &[cold]);
        let hx = builder.add_component(
            "hx",
            Arity::new(PortCount::Exactly(2), PortCount::Exactly(2)),
            &[hot, cold],
            &[hot_out, cold_out],
        );
        builder.add_component("hot_sink", Arity::SINK, &[hot_out], &[]);
        builder.add_component("cold_sink", Arity::SINK, &[cold_out], &[]);
        let graph = builder.build().unwrap();

        assert_eq!(graph.inlet_streams(hx), vec![hot, cold]);
        assert_eq!(graph.outlet_streams(hx), vec![hot_out, cold_out]);
        assert_eq!(graph.producer(hot_out), Some(hx));
    }
}
