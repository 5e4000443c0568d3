//! Dependency analysis: feedback detection and forward evaluation order.
//!
//! A cycle with turbine/pump coupling or regenerative heating has no
//! topological order. `feedback_set` picks dependency edges to tear so
//! that the rest is acyclic; the caller turns each torn edge into a break
//! variable and evaluates the remaining graph with `evaluation_order`.

use std::collections::BTreeSet;

use rc_core::{CompId, LinkId, StreamId};

use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;

/// What carries a dependency between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Via {
    Stream(StreamId),
    Link(LinkId),
}

/// `to` cannot be evaluated before `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub from: CompId,
    pub to: CompId,
    pub via: Via,
}

impl Graph {
    /// All dependency edges: streams in ID order, then links in ID order.
    pub fn dependencies(&self) -> Vec<Dependency> {
        let mut deps = Vec::with_capacity(self.streams.len() + self.links.len());
        for stream in &self.streams {
            if let (Some(from), Some(to)) = (self.producer(stream.id), self.consumer(stream.id)) {
                deps.push(Dependency {
                    from,
                    to,
                    via: Via::Stream(stream.id),
                });
            }
        }
        for link in &self.links {
            deps.push(Dependency {
                from: link.from,
                to: link.to,
                via: Via::Link(link.id),
            });
        }
        deps
    }

    /// Dependency edges to tear so the remaining graph is acyclic.
    ///
    /// Repeatedly finds a cycle and tears one of its edges, preferring a
    /// link over a stream, otherwise the edge that closes the cycle.
    pub fn feedback_set(&self) -> Vec<Via> {
        let deps = self.dependencies();
        let mut torn: Vec<Via> = Vec::new();

        while let Some(cycle) = find_cycle(self.components.len(), &deps, &torn) {
            let pick = cycle
                .iter()
                .map(|&i| deps[i].via)
                .find(|via| matches!(via, Via::Link(_)))
                .or_else(|| cycle.last().map(|&i| deps[i].via));
            match pick {
                Some(via) => torn.push(via),
                None => break,
            }
        }
        torn.sort();
        torn
    }

    /// Deterministic forward order with the `torn` edges removed.
    ///
    /// Among ready components the lowest ID goes first.
    pub fn evaluation_order(&self, torn: &[Via]) -> GraphResult<Vec<CompId>> {
        let n = self.components.len();
        let deps: Vec<Dependency> = self
            .dependencies()
            .into_iter()
            .filter(|d| !torn.contains(&d.via))
            .collect();

        let mut indegree = vec![0usize; n];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
        for d in &deps {
            indegree[d.to.slot()] += 1;
            outgoing[d.from.slot()].push(d.to.slot());
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(self.components[i].id);
            for &j in &outgoing[i] {
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    ready.insert(j);
                }
            }
        }

        if order.len() < n {
            let remaining = (0..n)
                .filter(|&i| indegree[i] > 0)
                .map(|i| self.components[i].id)
                .collect();
            return Err(GraphError::Cyclic { remaining });
        }
        Ok(order)
    }
}

/// Edge indices (into `deps`) of one cycle, or `None` if acyclic.
fn find_cycle(n: usize, deps: &[Dependency], torn: &[Via]) -> Option<Vec<usize>> {
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (i, d) in deps.iter().enumerate() {
        if !torn.contains(&d.via) {
            adjacency[d.from.slot()].push((d.to.slot(), i));
        }
    }

    let mut search = CycleSearch {
        adjacency: &adjacency,
        state: vec![Mark::Unvisited; n],
        path_nodes: Vec::new(),
        path_edges: Vec::new(),
    };
    for root in 0..n {
        if search.state[root] == Mark::Unvisited {
            search.path_nodes.clear();
            search.path_edges.clear();
            search.path_nodes.push(root);
            if let Some(cycle) = search.visit(root) {
                return Some(cycle);
            }
        }
    }
    None
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

struct CycleSearch<'a> {
    adjacency: &'a [Vec<(usize, usize)>],
    state: Vec<Mark>,
    path_nodes: Vec<usize>,
    // path_edges[i] leads from path_nodes[i] to path_nodes[i + 1]
    path_edges: Vec<usize>,
}

impl CycleSearch<'_> {
    fn visit(&mut self, u: usize) -> Option<Vec<usize>> {
        self.state[u] = Mark::OnPath;
        for &(v, edge) in &self.adjacency[u] {
            match self.state[v] {
                Mark::OnPath => {
                    let pos = self.path_nodes.iter().position(|&x| x == v)?;
                    let mut cycle = self.path_edges[pos..].to_vec();
                    cycle.push(edge);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    self.path_nodes.push(v);
                    self.path_edges.push(edge);
                    if let Some(cycle) = self.visit(v) {
                        return Some(cycle);
                    }
                    self.path_nodes.pop();
                    self.path_edges.pop();
                }
                Mark::Done => {}
            }
        }
        self.state[u] = Mark::Done;
        None
    }
}
