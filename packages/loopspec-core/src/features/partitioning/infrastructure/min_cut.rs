//! Max-flow / min-cut (Edmonds-Karp)
//!
//! Vertex 0 is the source and vertex 1 the sink. Capacities added twice
//! between the same ordered pair accumulate. `INFINITY` is a sentinel, not a
//! large number: an infinite edge never saturates and adding to it leaves it
//! infinite. Finite capacities saturate at `MAX_FINITE`, so no sum of finite
//! weights turns into the sentinel.

use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, VecDeque};

pub type Vertex = usize;

pub const SOURCE: Vertex = 0;
pub const SINK: Vertex = 1;
pub const INFINITY: u64 = u64::MAX;
pub const MAX_FINITE: u64 = INFINITY - 1;

#[derive(Debug, Clone, Copy)]
struct FlowEdge {
    from: Vertex,
    to: Vertex,
    capacity: u64,
    flow: u64,
}

impl FlowEdge {
    fn residual(&self) -> u64 {
        if self.capacity == INFINITY {
            INFINITY
        } else {
            self.capacity - self.flow
        }
    }
}

/// How the BFS reached a vertex: through edge `edge`, forwards or against it
#[derive(Debug, Clone, Copy)]
struct Step {
    edge: usize,
    forward: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    edges: Vec<FlowEdge>,
    index: FxHashMap<(Vertex, Vertex), usize>,
    /// Edge ids leaving each vertex
    out: Vec<Vec<usize>>,
    /// Edge ids entering each vertex
    into: Vec<Vec<usize>>,
    max_flow: Option<u64>,
}

impl FlowNetwork {
    pub fn new() -> Self {
        let mut net = Self::default();
        net.reserve(SINK);
        net
    }

    fn reserve(&mut self, v: Vertex) {
        if v >= self.out.len() {
            self.out.resize_with(v + 1, Vec::new);
            self.into.resize_with(v + 1, Vec::new);
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.out.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Add `capacity` to the edge `from -> to`. Self loops carry no flow and
    /// are ignored.
    pub fn add_edge(&mut self, from: Vertex, to: Vertex, capacity: u64) {
        if from == to {
            return;
        }
        self.reserve(from.max(to));
        self.max_flow = None;
        match self.index.get(&(from, to)) {
            Some(&e) => {
                let edge = &mut self.edges[e];
                edge.capacity = if edge.capacity == INFINITY || capacity == INFINITY {
                    INFINITY
                } else {
                    edge.capacity.saturating_add(capacity).min(MAX_FINITE)
                };
            }
            None => {
                let e = self.edges.len();
                self.edges.push(FlowEdge {
                    from,
                    to,
                    capacity,
                    flow: 0,
                });
                self.index.insert((from, to), e);
                self.out[from].push(e);
                self.into[to].push(e);
            }
        }
    }

    pub fn capacity(&self, from: Vertex, to: Vertex) -> u64 {
        self.index
            .get(&(from, to))
            .map_or(0, |&e| self.edges[e].capacity)
    }

    /// Maximum source-to-sink flow; `INFINITY` when an all-infinite path
    /// joins them
    pub fn max_flow(&mut self) -> u64 {
        if let Some(flow) = self.max_flow {
            return flow;
        }
        for edge in &mut self.edges {
            edge.flow = 0;
        }
        let mut total = 0u64;
        while let Some(path) = self.augmenting_path() {
            let bottleneck = path
                .iter()
                .map(|step| self.step_residual(*step))
                .min()
                .unwrap_or(0);
            if bottleneck == 0 {
                break;
            }
            if bottleneck == INFINITY {
                total = INFINITY;
                break;
            }
            for step in &path {
                let edge = &mut self.edges[step.edge];
                if step.forward {
                    edge.flow = edge.flow.saturating_add(bottleneck);
                } else {
                    edge.flow -= bottleneck;
                }
            }
            total = total.saturating_add(bottleneck).min(MAX_FINITE);
        }
        self.max_flow = Some(total);
        total
    }

    fn step_residual(&self, step: Step) -> u64 {
        let edge = &self.edges[step.edge];
        if step.forward {
            edge.residual()
        } else {
            edge.flow
        }
    }

    /// Shortest source-to-sink path in the residual graph, source first
    fn augmenting_path(&self) -> Option<Vec<Step>> {
        let parents = self.residual_bfs();
        parents[SINK]?;
        let mut path = Vec::new();
        let mut v = SINK;
        while v != SOURCE {
            let step = parents[v]?;
            path.push(step);
            let edge = &self.edges[step.edge];
            v = if step.forward { edge.from } else { edge.to };
        }
        path.reverse();
        Some(path)
    }

    /// Parent step of every vertex reachable from the source over edges with
    /// residual capacity
    fn residual_bfs(&self) -> Vec<Option<Step>> {
        let n = self.num_vertices();
        let mut parents: Vec<Option<Step>> = vec![None; n];
        let mut seen = vec![false; n];
        let mut queue = VecDeque::from([SOURCE]);
        seen[SOURCE] = true;

        while let Some(u) = queue.pop_front() {
            if u == SINK {
                break;
            }
            let forward = self.out[u].iter().map(|&e| (e, true, self.edges[e].to));
            let backward = self.into[u].iter().map(|&e| (e, false, self.edges[e].from));
            for (edge, forward, v) in forward.chain(backward) {
                if seen[v] || self.step_residual(Step { edge, forward }) == 0 {
                    continue;
                }
                seen[v] = true;
                parents[v] = Some(Step { edge, forward });
                queue.push_back(v);
            }
        }
        parents
    }

    /// Vertices on the source side of a minimum cut
    pub fn source_side(&mut self) -> BTreeSet<Vertex> {
        self.max_flow();
        let parents = self.residual_bfs();
        (0..self.num_vertices())
            .filter(|&v| v == SOURCE || parents[v].is_some())
            .collect()
    }

    /// Every endpoint of an edge crossing a minimum cut, in either direction
    pub fn min_cut(&mut self) -> BTreeSet<Vertex> {
        let reachable = self.source_side();
        let mut cut = BTreeSet::new();
        for edge in &self.edges {
            if reachable.contains(&edge.from) != reachable.contains(&edge.to) {
                cut.insert(edge.from);
                cut.insert(edge.to);
            }
        }
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classic_network() {
        // 0 -> {2, 3} -> 1 with a cross edge
        let mut net = FlowNetwork::new();
        net.add_edge(SOURCE, 2, 10);
        net.add_edge(SOURCE, 3, 5);
        net.add_edge(2, 3, 15);
        net.add_edge(2, SINK, 4);
        net.add_edge(3, SINK, 10);
        assert_eq!(net.max_flow(), 14);
        assert_eq!(net.source_side(), BTreeSet::from([SOURCE, 2, 3]));
        assert_eq!(net.min_cut(), BTreeSet::from([SINK, 2, 3]));
    }

    #[test]
    fn test_parallel_edges_accumulate() {
        let mut net = FlowNetwork::new();
        net.add_edge(SOURCE, 2, 3);
        net.add_edge(SOURCE, 2, 4);
        net.add_edge(2, SINK, 100);
        assert_eq!(net.capacity(SOURCE, 2), 7);
        assert_eq!(net.max_flow(), 7);
    }

    #[test]
    fn test_infinite_edge_is_never_cut() {
        // source -> 2 (101) -inf-> 3 -> sink (1001)
        let mut net = FlowNetwork::new();
        net.add_edge(SOURCE, 2, 101);
        net.add_edge(2, 3, INFINITY);
        net.add_edge(3, SINK, 1001);
        assert_eq!(net.max_flow(), 101);
        assert_eq!(net.min_cut(), BTreeSet::from([SOURCE, 2]));

        // accumulating onto an infinite edge stays infinite
        net.add_edge(2, 3, 5);
        assert_eq!(net.capacity(2, 3), INFINITY);
        assert_eq!(net.max_flow(), 101);
    }

    #[test]
    fn test_finite_sums_stay_below_infinity() {
        let mut net = FlowNetwork::new();
        net.add_edge(SOURCE, 2, MAX_FINITE);
        net.add_edge(SOURCE, 2, MAX_FINITE);
        net.add_edge(2, SINK, INFINITY);
        assert_eq!(net.capacity(SOURCE, 2), MAX_FINITE);
        assert_eq!(net.max_flow(), MAX_FINITE);
        assert_eq!(net.min_cut(), BTreeSet::from([SOURCE, 2]));
    }

    #[test]
    fn test_all_infinite_path() {
        let mut net = FlowNetwork::new();
        net.add_edge(SOURCE, 2, INFINITY);
        net.add_edge(2, SINK, INFINITY);
        assert_eq!(net.max_flow(), INFINITY);
    }

    #[test]
    fn test_flow_cancels_through_reverse_edge() {
        // BFS first takes 0-2-3-1; the second path has to push back on 2-3
        let mut net = FlowNetwork::new();
        net.add_edge(SOURCE, 2, 1);
        net.add_edge(SOURCE, 4, 1);
        net.add_edge(2, 3, 1);
        net.add_edge(4, 3, 1);
        net.add_edge(2, 5, 1);
        net.add_edge(3, SINK, 1);
        net.add_edge(5, SINK, 1);
        assert_eq!(net.max_flow(), 2);
    }

    #[test]
    fn test_disconnected_sink() {
        let mut net = FlowNetwork::new();
        net.add_edge(SOURCE, 2, 9);
        assert_eq!(net.max_flow(), 0);
        assert!(net.min_cut().is_empty());
    }
}
