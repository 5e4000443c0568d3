//! Incremental graph builder.

use rc_core::{CompId, LinkId, PortId, StreamId};

use crate::arity::Arity;
use crate::error::GraphResult;
use crate::graph::{Component, Graph, Link, LinkKind, Port, PortKind, Stream};
use crate::validate;

/// Builder for constructing a cycle topology incrementally.
///
/// Use `add_stream`, `add_component` and `add_link` to describe the cycle,
/// then call `build()` to validate and freeze it into an immutable `Graph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    streams: Vec<Stream>,
    components: Vec<Component>,
    ports: Vec<Port>,
    links: Vec<Link>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream (flow-state edge) and return its ID.
    pub fn add_stream(&mut self, name: impl Into<String>) -> StreamId {
        let id = StreamId::from_index(self.streams.len() as u32);
        self.streams.push(Stream {
            id,
            name: name.into(),
        });
        id
    }

    /// Add a component reading `inlets` and writing `outlets`.
    ///
    /// One port is created per stream reference, in the given order.
    /// Arity is only checked in `build()`.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        inlets: &[StreamId],
        outlets: &[StreamId],
    ) -> CompId {
        let comp_id = CompId::from_index(self.components.len() as u32);
        let inlet_ports = inlets
            .iter()
            .map(|&s| self.push_port(comp_id, s, PortKind::Inlet))
            .collect();
        let outlet_ports = outlets
            .iter()
            .map(|&s| self.push_port(comp_id, s, PortKind::Outlet))
            .collect();

        self.components.push(Component {
            id: comp_id,
            name: name.into(),
            arity,
            inlets: inlet_ports,
            outlets: outlet_ports,
        });
        comp_id
    }

    /// Add a non-flow dependency from `from` to `to`.
    pub fn add_link(&mut self, from: CompId, to: CompId, kind: LinkKind) -> LinkId {
        let id = LinkId::from_index(self.links.len() as u32);
        self.links.push(Link { id, from, to, kind });
        id
    }

    fn push_port(&mut self, comp: CompId, stream: StreamId, kind: PortKind) -> PortId {
        let id = PortId::from_index(self.ports.len() as u32);
        self.ports.push(Port {
            id,
            comp,
            stream,
            kind,
        });
        id
    }

    /// Validate and build the immutable `Graph`.
    pub fn build(self) -> GraphResult<Graph> {
        validate::validate_structure(&self.streams, &self.components, &self.ports, &self.links)?;
        let (stream_producer, stream_consumer) =
            validate::stream_ownership(&self.streams, &self.ports)?;
        validate::validate_arity(&self.components)?;
        validate::validate_connectivity(&self.streams, &self.components, &self.ports)?;

        Ok(Graph {
            streams: self.streams,
            components: self.components,
            ports: self.ports,
            links: self.links,
            stream_producer,
            stream_consumer,
        })
    }
}
