//! Graph validation logic.

use rc_core::PortId;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Component, Link, Port, PortKind, Stream};

/// Check that every reference points at an existing object.
pub(crate) fn validate_structure(
    streams: &[Stream],
    components: &[Component],
    ports: &[Port],
    links: &[Link],
) -> GraphResult<()> {
    for port in ports {
        if port.stream.slot() >= streams.len() {
            return Err(GraphError::InvalidStreamRef {
                port: port.id,
                stream: port.stream,
            });
        }
        if port.comp.slot() >= components.len() {
            return Err(GraphError::InvalidCompRef { comp: port.comp });
        }
    }

    for comp in components {
        for &port_id in comp.inlets.iter().chain(comp.outlets.iter()) {
            let Some(port) = ports.get(port_id.slot()) else {
                return Err(GraphError::InvalidCompRef { comp: comp.id });
            };
            if port.comp != comp.id {
                return Err(GraphError::PortCompMismatch {
                    port: port_id,
                    expected: comp.id,
                    actual: port.comp,
                });
            }
        }
    }

    for link in links {
        for end in [link.from, link.to] {
            if end.slot() >= components.len() {
                return Err(GraphError::InvalidCompRef { comp: end });
            }
        }
        if link.from == link.to {
            return Err(GraphError::SelfLink { link: link.id });
        }
    }

    Ok(())
}

/// Every stream has one producer and one consumer; returns both port tables.
pub(crate) fn stream_ownership(
    streams: &[Stream],
    ports: &[Port],
) -> GraphResult<(Vec<PortId>, Vec<PortId>)> {
    let mut producers: Vec<Vec<PortId>> = vec![Vec::new(); streams.len()];
    let mut consumers: Vec<Vec<PortId>> = vec![Vec::new(); streams.len()];
    for port in ports {
        match port.kind {
            PortKind::Outlet => producers[port.stream.slot()].push(port.id),
            PortKind::Inlet => consumers[port.stream.slot()].push(port.id),
        }
    }

    let mut producer_table = Vec::with_capacity(streams.len());
    let mut consumer_table = Vec::with_capacity(streams.len());
    for stream in streams {
        let p = &producers[stream.id.slot()];
        let c = &consumers[stream.id.slot()];
        match (p.as_slice(), c.as_slice()) {
            ([prod], [cons]) => {
                producer_table.push(*prod);
                consumer_table.push(*cons);
            }
            _ => {
                return Err(GraphError::StreamOwnership {
                    stream: stream.id,
                    producers: p.len(),
                    consumers: c.len(),
                });
            }
        }
    }
    Ok((producer_table, consumer_table))
}

/// Port counts must match each component's declared arity.
pub(crate) fn validate_arity(components: &[Component]) -> GraphResult<()> {
    for comp in components {
        if !comp.arity.inlets.admits(comp.inlets.len()) {
            return Err(GraphError::ArityMismatch {
                comp: comp.id,
                name: comp.name.clone(),
                kind: PortKind::Inlet,
                expected: comp.arity.inlets,
                found: comp.inlets.len(),
            });
        }
        if !comp.arity.outlets.admits(comp.outlets.len()) {
            return Err(GraphError::ArityMismatch {
                comp: comp.id,
                name: comp.name.clone(),
                kind: PortKind::Outlet,
                expected: comp.arity.outlets,
                found: comp.outlets.len(),
            });
        }
    }
    Ok(())
}

/// Sources and sinks exist and all components form one weakly connected piece.
///
/// Only flow streams count here: a component attached to the rest of the
/// cycle by a shaft or heat link alone is still reported as disconnected.
pub(crate) fn validate_connectivity(
    streams: &[Stream],
    components: &[Component],
    ports: &[Port],
) -> GraphResult<()> {
    if !components.iter().any(|c| c.inlets.is_empty()) {
        return Err(GraphError::NoSource);
    }
    if !components.iter().any(|c| c.outlets.is_empty()) {
        return Err(GraphError::NoSink);
    }

    let mut parent: Vec<usize> = (0..components.len()).collect();
    let mut stream_comps: Vec<Vec<usize>> = vec![Vec::new(); streams.len()];
    for port in ports {
        stream_comps[port.stream.slot()].push(port.comp.slot());
    }
    for comps in &stream_comps {
        for pair in comps.windows(2) {
            union(&mut parent, pair[0], pair[1]);
        }
    }

    let root = find(&mut parent, 0);
    for comp in components {
        if find(&mut parent, comp.id.slot()) != root {
            return Err(GraphError::Disconnected {
                comp: comp.id,
                name: comp.name.clone(),
            });
        }
    }
    Ok(())
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[rb] = ra;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arity::Arity;
    use rc_core::Id;

    fn stream(i: u32) -> Stream {
        Stream {
            id: Id::from_index(i),
            name: format!("s{i}"),
        }
    }

    #[test]
    fn validate_empty_structure() {
        assert!(validate_structure(&[], &[], &[], &[]).is_ok());
    }

    #[test]
    fn validate_invalid_stream_ref() {
        let ports = vec![Port {
            id: Id::from_index(0),
            comp: Id::from_index(0),
            stream: Id::from_index(99),
            kind: PortKind::Inlet,
        }];
        let components = vec![Component {
            id: Id::from_index(0),
            name: "c".into(),
            arity: Arity::SINK,
            inlets: vec![Id::from_index(0)],
            outlets: vec![],
        }];
        let result = validate_structure(&[stream(0)], &components, &ports, &[]);
        assert!(matches!(
            result,
            Err(GraphError::InvalidStreamRef { .. })
        ));
    }

    #[test]
    fn stream_without_consumer_rejected() {
        let ports = vec![Port {
            id: Id::from_index(0),
            comp: Id::from_index(0),
            stream: Id::from_index(0),
            kind: PortKind::Outlet,
        }];
        let result = stream_ownership(&[stream(0)], &ports);
        assert!(matches!(
            result,
            Err(GraphError::StreamOwnership {
                producers: 1,
                consumers: 0,
                ..
            })
        ));
    }

    #[test]
    fn union_find_merges() {
        let mut parent: Vec<usize> = (0..4).collect();
        union(&mut parent, 0, 1);
        union(&mut parent, 2, 3);
        assert_eq!(find(&mut parent, 1), find(&mut parent, 0));
        assert_ne!(find(&mut parent, 1), find(&mut parent, 3));
        union(&mut parent, 1, 3);
        assert_eq!(find(&mut parent, 2), find(&mut parent, 0));
    }
}
