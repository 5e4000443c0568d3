//! Graph-specific error types.

use rc_core::{CompId, LinkId, PortId, RcError, StreamId};

use crate::arity::PortCount;
use crate::graph::PortKind;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A port refers to a stream that doesn't exist.
    InvalidStreamRef { port: PortId, stream: StreamId },

    /// A port or link refers to a component that doesn't exist.
    InvalidCompRef { comp: CompId },

    /// A component has the wrong number of inlet or outlet ports for its type.
    ArityMismatch {
        comp: CompId,
        name: String,
        kind: PortKind,
        expected: PortCount,
        found: usize,
    },

    /// A stream must be produced by exactly one outlet and consumed by exactly one inlet.
    StreamOwnership {
        stream: StreamId,
        producers: usize,
        consumers: usize,
    },

    /// A link connects a component to itself.
    SelfLink { link: LinkId },

    /// No component without inlets (propellant source).
    NoSource,

    /// No component without outlets (exit sink).
    NoSink,

    /// The component is not reachable from the rest of the cycle.
    Disconnected { comp: CompId, name: String },

    /// Evaluation order requested but dependencies still form a cycle.
    Cyclic { remaining: Vec<CompId> },

    /// A port's component field doesn't match the component containing it.
    PortCompMismatch {
        port: PortId,
        expected: CompId,
        actual: CompId,
    },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidStreamRef { port, stream } => {
                write!(f, "Port {} refers to non-existent stream {}", port, stream)
            }
            GraphError::InvalidCompRef { comp } => {
                write!(f, "Reference to non-existent component {}", comp)
            }
            GraphError::ArityMismatch {
                comp,
                name,
                kind,
                expected,
                found,
            } => {
                let side = match kind {
                    PortKind::Inlet => "inlets",
                    PortKind::Outlet => "outlets",
                };
                write!(
                    f,
                    "Component {} '{}' has {} {} (expected {})",
                    comp, name, found, side, expected
                )
            }
            GraphError::StreamOwnership {
                stream,
                producers,
                consumers,
            } => write!(
                f,
                "Stream {} has {} producers and {} consumers (expected 1 and 1)",
                stream, producers, consumers
            ),
            GraphError::SelfLink { link } => write!(f, "Link {} connects a component to itself", link),
            GraphError::NoSource => write!(f, "Cycle has no propellant source"),
            GraphError::NoSink => write!(f, "Cycle has no exit sink"),
            GraphError::Disconnected { comp, name } => {
                write!(f, "Component {} '{}' is not connected to the cycle", comp, name)
            }
            GraphError::Cyclic { remaining } => write!(
                f,
                "Dependencies still cyclic after tearing ({} components unordered)",
                remaining.len()
            ),
            GraphError::PortCompMismatch {
                port,
                expected,
                actual,
            } => write!(
                f,
                "Port {} should belong to component {} but references {}",
                port, expected, actual
            ),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for RcError {
    fn from(err: GraphError) -> Self {
        RcError::Invariant {
            what: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_core::Id;

    #[test]
    fn display_mentions_component_name() {
        let err = GraphError::ArityMismatch {
            comp: Id::from_index(2),
            name: "chamber".into(),
            kind: PortKind::Inlet,
            expected: PortCount::Exactly(2),
            found: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("chamber"));
        assert!(msg.contains("exactly 2"));
    }

    #[test]
    fn converts_to_rc_error() {
        let err: RcError = GraphError::NoSink.into();
        assert!(matches!(err, RcError::Invariant { .. }));
    }
}
