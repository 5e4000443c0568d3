//! Integration tests for rc-graph.

use rc_graph::{Arity, GraphBuilder, GraphError, LinkKind, PortCount, PortKind, Via};

const CHAMBER: Arity = Arity::new(PortCount::Exactly(2), PortCount::Exactly(1));
const SPLITTER: Arity = Arity::new(PortCount::Exactly(1), PortCount::AtLeast(2));

#[test]
fn build_open_cycle() {
    // ox tank -> ox pump -\
    //                      chamber -> nozzle
    // fuel tank -> fuel pump -/
    let mut b = GraphBuilder::new();
    let ox0 = b.add_stream("ox_tank_out");
    let ox1 = b.add_stream("ox_pump_out");
    let f0 = b.add_stream("fuel_tank_out");
    let f1 = b.add_stream("fuel_pump_out");
    let gas = b.add_stream("chamber_out");
    b.add_component("ox_tank", Arity::SOURCE, &[], &[ox0]);
    let ox_pump = b.add_component("ox_pump", Arity::TWO_PORT, &[ox0], &[ox1]);
    b.add_component("fuel_tank", Arity::SOURCE, &[], &[f0]);
    b.add_component("fuel_pump", Arity::TWO_PORT, &[f0], &[f1]);
    let chamber = b.add_component("chamber", CHAMBER, &[ox1, f1], &[gas]);
    b.add_component("nozzle", Arity::SINK, &[gas], &[]);

    let graph = b.build().unwrap();
    assert_eq!(graph.components().len(), 6);
    assert_eq!(graph.ports().len(), 10);
    assert_eq!(graph.inlet_streams(chamber), vec![ox1, f1]);
    assert_eq!(graph.outlet_streams(ox_pump), vec![ox1]);
    assert_eq!(graph.find_component("nozzle").map(|c| c.index()), Some(5));

    let port = graph.port(graph.component(chamber).unwrap().inlets[1]).unwrap();
    assert_eq!(port.kind, PortKind::Inlet);
    assert_eq!(port.stream, f1);

    let order = graph.evaluation_order(&[]).unwrap();
    assert_eq!(order.last().copied(), graph.find_component("nozzle"));
}

#[test]
fn chamber_with_one_inlet_is_rejected() {
    let mut b = GraphBuilder::new();
    let s0 = b.add_stream("feed");
    let s1 = b.add_stream("gas");
    b.add_component("tank", Arity::SOURCE, &[], &[s0]);
    b.add_component("chamber", CHAMBER, &[s0], &[s1]);
    b.add_component("nozzle", Arity::SINK, &[s1], &[]);

    let err = b.build().unwrap_err();
    assert!(matches!(
        err,
        GraphError::ArityMismatch {
            kind: PortKind::Inlet,
            found: 1,
            ..
        }
    ));
}

#[test]
fn splitter_needs_two_outlets() {
    let mut b = GraphBuilder::new();
    let s0 = b.add_stream("feed");
    let s1 = b.add_stream("only");
    b.add_component("tank", Arity::SOURCE, &[], &[s0]);
    b.add_component("splitter", SPLITTER, &[s0], &[s1]);
    b.add_component("nozzle", Arity::SINK, &[s1], &[]);
    assert!(matches!(
        b.build(),
        Err(GraphError::ArityMismatch {
            kind: PortKind::Outlet,
            ..
        })
    ));
}

#[test]
fn dangling_stream_is_rejected() {
    let mut b = GraphBuilder::new();
    let s0 = b.add_stream("feed");
    let _unused = b.add_stream("nowhere");
    b.add_component("tank", Arity::SOURCE, &[], &[s0]);
    b.add_component("nozzle", Arity::SINK, &[s0], &[]);
    assert!(matches!(
        b.build(),
        Err(GraphError::StreamOwnership {
            producers: 0,
            consumers: 0,
            ..
        })
    ));
}

#[test]
fn two_separate_lines_are_disconnected() {
    let mut b = GraphBuilder::new();
    let a = b.add_stream("a");
    let c = b.add_stream("c");
    b.add_component("tank_a", Arity::SOURCE, &[], &[a]);
    b.add_component("nozzle_a", Arity::SINK, &[a], &[]);
    let tank_c = b.add_component("tank_c", Arity::SOURCE, &[], &[c]);
    let nozzle_c = b.add_component("nozzle_c", Arity::SINK, &[c], &[]);
    // A link alone does not make the flow network connected.
    b.add_link(tank_c, nozzle_c, LinkKind::Shaft);
    assert!(matches!(b.build(), Err(GraphError::Disconnected { .. })));
}

#[test]
fn missing_sink_is_rejected() {
    // tank -> merger -> pipe -> back into merger; nothing leaves the cycle
    let mut b = GraphBuilder::new();
    let a = b.add_stream("a");
    let m = b.add_stream("mixed");
    let back = b.add_stream("back");
    b.add_component("tank", Arity::SOURCE, &[], &[a]);
    b.add_component(
        "merger",
        Arity::new(PortCount::AtLeast(2), PortCount::Exactly(1)),
        &[a, back],
        &[m],
    );
    b.add_component("pipe", Arity::TWO_PORT, &[m], &[back]);
    assert!(matches!(b.build(), Err(GraphError::NoSink)));
}

#[test]
fn shaft_link_closing_a_loop_is_torn() {
    // turbine exhaust feeds the chamber; the pump feeds the turbine drive gas
    // and its power demand goes to the same turbine.
    let mut b = GraphBuilder::new();
    let f0 = b.add_stream("fuel_tank_out");
    let f1 = b.add_stream("fuel_pump_out");
    let t1 = b.add_stream("turbine_out");
    let ox = b.add_stream("ox");
    let gas = b.add_stream("gas");
    b.add_component("fuel_tank", Arity::SOURCE, &[], &[f0]);
    let pump = b.add_component("fuel_pump", Arity::TWO_PORT, &[f0], &[f1]);
    let turbine = b.add_component("turbine", Arity::TWO_PORT, &[f1], &[t1]);
    b.add_component("ox_tank", Arity::SOURCE, &[], &[ox]);
    b.add_component("chamber", CHAMBER, &[ox, t1], &[gas]);
    b.add_component("nozzle", Arity::SINK, &[gas], &[]);
    b.add_link(pump, turbine, LinkKind::Shaft);
    let graph = b.build().unwrap();

    // pump -> turbine is already a forward edge, nothing to tear
    assert!(graph.feedback_set().is_empty());
    assert_eq!(graph.links_into(turbine, LinkKind::Shaft).count(), 1);
}

#[test]
fn torn_link_reported_as_link() {
    let mut b = GraphBuilder::new();
    let s0 = b.add_stream("s0");
    let s1 = b.add_stream("s1");
    let tank = b.add_component("tank", Arity::SOURCE, &[], &[s0]);
    let pump = b.add_component("pump", Arity::TWO_PORT, &[s0], &[s1]);
    let nozzle = b.add_component("nozzle", Arity::SINK, &[s1], &[]);
    let link = b.add_link(nozzle, pump, LinkKind::Heat);
    let graph = b.build().unwrap();

    assert_eq!(graph.feedback_set(), vec![Via::Link(link)]);
    let order = graph.evaluation_order(&[Via::Link(link)]).unwrap();
    assert_eq!(order, vec![tank, pump, nozzle]);
}
