//! rc-graph: cycle topology for the rocket cycle solver.
//!
//! Provides:
//! - Core graph data structures (Stream, Component, Port, Link, Graph)
//! - Incremental builder with arity and connectivity validation
//! - Feedback detection and forward evaluation order
//!
//! Streams are flow-state edges: each has exactly one producing component
//! and one consuming component. Links are non-flow couplings (a pump
//! feeding its power demand to a turbine, a chamber feeding heat to a
//! cooling channel) that still impose evaluation order.
//!
//! # Example
//!
//! ```
//! use rc_graph::{Arity, GraphBuilder};
//!
//! let mut builder = GraphBuilder::new();
//! let feed = builder.add_stream("feed");
//! let discharge = builder.add_stream("discharge");
//! builder.add_component("tank", Arity::SOURCE, &[], &[feed]);
//! builder.add_component("pump", Arity::TWO_PORT, &[feed], &[discharge]);
//! builder.add_component("nozzle", Arity::SINK, &[discharge], &[]);
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.streams().len(), 2);
//! assert_eq!(graph.evaluation_order(&[]).unwrap().len(), 3);
//! ```

pub mod arity;
pub mod builder;
pub mod error;
pub mod graph;
pub mod order;
pub(crate) mod validate;

pub use arity::{Arity, PortCount};
pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{Component, Graph, Link, LinkKind, Port, PortKind, Stream};
pub use order::{Dependency, Via};
