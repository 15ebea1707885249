/*
 * Loop PDG
 *
 * One node per loop operation plus external live-in/live-out nodes.
 * One petgraph edge per ordered node pair, weighted by the set of
 * dependence flavours between them.
 *
 * Removability (filled by the remediation marking pass):
 * - a dependence is removable when at least one remedy exists for it
 * - the cheapest removal cost is kept per dependence
 */

use crate::features::pdg::domain::{DepBits, DepKind, Dependence};
use crate::shared::models::{LoopId, OpId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// PDG node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdgNode {
    pub op: OpId,
    /// `false` for live-in definitions and live-out users outside the loop
    pub internal: bool,
}

/// Serializable edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdgEdgeDto {
    pub src: OpId,
    pub dst: OpId,
    pub deps: DepBits,
}

/// Serializable DTO for ProgramDependenceGraph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdgDto {
    pub loop_id: LoopId,
    pub nodes: Vec<PdgNode>,
    pub edges: Vec<PdgEdgeDto>,
    #[serde(default)]
    pub removal_costs: Vec<(Dependence, u64)>,
}

/// Edge counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PdgStats {
    pub internal_nodes: usize,
    pub external_nodes: usize,
    pub register: usize,
    pub control: usize,
    pub memory: usize,
    pub loop_carried: usize,
    pub removable: usize,
}

/// Program dependence graph of one loop
#[derive(Debug, Clone)]
pub struct ProgramDependenceGraph {
    loop_id: LoopId,
    graph: DiGraph<PdgNode, DepBits>,
    node_map: FxHashMap<OpId, NodeIndex>,
    removal_cost: FxHashMap<Dependence, u64>,
}

impl Serialize for ProgramDependenceGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut removal_costs: Vec<(Dependence, u64)> =
            self.removal_cost.iter().map(|(d, c)| (*d, *c)).collect();
        removal_costs.sort();
        let dto = PdgDto {
            loop_id: self.loop_id,
            nodes: self.graph.node_weights().copied().collect(),
            edges: self
                .graph
                .edge_references()
                .map(|e| PdgEdgeDto {
                    src: self.graph[e.source()].op,
                    dst: self.graph[e.target()].op,
                    deps: *e.weight(),
                })
                .collect(),
            removal_costs,
        };
        dto.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProgramDependenceGraph {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let dto = PdgDto::deserialize(deserializer)?;
        let mut pdg = ProgramDependenceGraph::new(dto.loop_id);
        for node in dto.nodes {
            pdg.add_node(node.op, node.internal);
        }
        for edge in dto.edges {
            for dep in edge.deps.dependences(edge.src, edge.dst) {
                pdg.add_dependence(dep);
            }
        }
        for (dep, cost) in dto.removal_costs {
            pdg.mark_removable(dep, cost);
        }
        Ok(pdg)
    }
}

impl ProgramDependenceGraph {
    pub fn new(loop_id: LoopId) -> Self {
        Self {
            loop_id,
            graph: DiGraph::new(),
            node_map: FxHashMap::default(),
            removal_cost: FxHashMap::default(),
        }
    }

    pub fn loop_id(&self) -> LoopId {
        self.loop_id
    }

    // ═══════════════════════════════════════════════════════════════════
    // Nodes
    // ═══════════════════════════════════════════════════════════════════

    /// Add a node; an existing node is kept (an internal node never becomes
    /// external)
    pub fn add_node(&mut self, op: OpId, internal: bool) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&op) {
            self.graph[idx].internal |= internal;
            return idx;
        }
        let idx = self.graph.add_node(PdgNode { op, internal });
        self.node_map.insert(op, idx);
        idx
    }

    pub fn contains_node(&self, op: OpId) -> bool {
        self.node_map.contains_key(&op)
    }

    pub fn is_internal(&self, op: OpId) -> bool {
        self.node_map
            .get(&op)
            .is_some_and(|&idx| self.graph[idx].internal)
    }

    /// Loop operations in insertion (program) order
    pub fn internal_ops(&self) -> impl Iterator<Item = OpId> + '_ {
        self.graph
            .node_weights()
            .filter(|n| n.internal)
            .map(|n| n.op)
    }

    pub fn external_ops(&self) -> impl Iterator<Item = OpId> + '_ {
        self.graph
            .node_weights()
            .filter(|n| !n.internal)
            .map(|n| n.op)
    }

    pub fn num_internal(&self) -> usize {
        self.graph.node_weights().filter(|n| n.internal).count()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Edges
    // ═══════════════════════════════════════════════════════════════════

    /// Returns `true` when the dependence is new. Missing endpoints are added
    /// as external nodes.
    pub fn add_dependence(&mut self, dep: Dependence) -> bool {
        let from = self.add_node(dep.src, false);
        let to = self.add_node(dep.dst, false);
        match self.graph.find_edge(from, to) {
            Some(e) => self.graph[e].insert(dep.kind, dep.loop_carried),
            None => {
                self.graph
                    .add_edge(from, to, DepBits::single(dep.kind, dep.loop_carried));
                true
            }
        }
    }

    /// Drop one dependence flavour (an empty pair edge is removed)
    pub fn remove_dependence(&mut self, dep: &Dependence) -> bool {
        let (Some(&from), Some(&to)) = (self.node_map.get(&dep.src), self.node_map.get(&dep.dst))
        else {
            return false;
        };
        let Some(e) = self.graph.find_edge(from, to) else {
            return false;
        };
        let removed = self.graph[e].remove(dep.kind, dep.loop_carried);
        if self.graph[e].is_empty() {
            self.graph.remove_edge(e);
        }
        self.removal_cost.remove(dep);
        removed
    }

    pub fn has_dependence(&self, dep: &Dependence) -> bool {
        self.deps_between(dep.src, dep.dst)
            .contains(dep.kind, dep.loop_carried)
    }

    pub fn deps_between(&self, src: OpId, dst: OpId) -> DepBits {
        let (Some(&from), Some(&to)) = (self.node_map.get(&src), self.node_map.get(&dst)) else {
            return DepBits::EMPTY;
        };
        self.graph
            .find_edge(from, to)
            .map_or(DepBits::EMPTY, |e| self.graph[e])
    }

    /// Every dependence, grouped by pair
    pub fn dependences(&self) -> impl Iterator<Item = Dependence> + '_ {
        self.graph.edge_references().flat_map(move |e| {
            e.weight()
                .dependences(self.graph[e.source()].op, self.graph[e.target()].op)
        })
    }

    /// Dependences between two loop operations
    pub fn internal_dependences(&self) -> impl Iterator<Item = Dependence> + '_ {
        self.dependences()
            .filter(move |d| self.is_internal(d.src) && self.is_internal(d.dst))
    }

    pub fn outgoing(&self, op: OpId) -> Vec<Dependence> {
        self.adjacent(op, Direction::Outgoing)
    }

    pub fn incoming(&self, op: OpId) -> Vec<Dependence> {
        self.adjacent(op, Direction::Incoming)
    }

    fn adjacent(&self, op: OpId, dir: Direction) -> Vec<Dependence> {
        let Some(&idx) = self.node_map.get(&op) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, dir)
            .flat_map(|e| {
                e.weight()
                    .dependences(self.graph[e.source()].op, self.graph[e.target()].op)
            })
            .collect()
    }

    pub fn edge_pairs(&self) -> impl Iterator<Item = (OpId, OpId, DepBits)> + '_ {
        self.graph
            .edge_references()
            .map(move |e| (self.graph[e.source()].op, self.graph[e.target()].op, *e.weight()))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Removability
    // ═══════════════════════════════════════════════════════════════════

    /// Record that `dep` can be removed; keeps the cheapest cost seen
    pub fn mark_removable(&mut self, dep: Dependence, cost: u64) {
        self.removal_cost
            .entry(dep)
            .and_modify(|c| *c = (*c).min(cost))
            .or_insert(cost);
    }

    pub fn is_removable(&self, dep: &Dependence) -> bool {
        self.removal_cost.contains_key(dep)
    }

    /// Cheapest known removal cost
    pub fn removal_cost(&self, dep: &Dependence) -> Option<u64> {
        self.removal_cost.get(dep).copied()
    }

    pub fn clear_removability(&mut self) {
        self.removal_cost.clear();
    }

    /// Copy without any removable dependence: the best case every critic
    /// partitions against
    pub fn optimistic(&self) -> ProgramDependenceGraph {
        let mut pdg = ProgramDependenceGraph::new(self.loop_id);
        for n in self.graph.node_weights() {
            pdg.add_node(n.op, n.internal);
        }
        for dep in self.dependences() {
            if !self.is_removable(&dep) {
                pdg.add_dependence(dep);
            }
        }
        pdg
    }

    // ═══════════════════════════════════════════════════════════════════
    // Slices
    // ═══════════════════════════════════════════════════════════════════

    /// Loop operations `op` transitively depends on (including `op`),
    /// following only dependences `follow` accepts
    pub fn backward_slice<F>(&self, op: OpId, follow: F) -> FxHashSet<OpId>
    where
        F: Fn(&Dependence) -> bool,
    {
        self.slice(op, Direction::Incoming, follow)
    }

    /// Loop operations transitively depending on `op` (including `op`)
    pub fn forward_slice<F>(&self, op: OpId, follow: F) -> FxHashSet<OpId>
    where
        F: Fn(&Dependence) -> bool,
    {
        self.slice(op, Direction::Outgoing, follow)
    }

    fn slice<F>(&self, op: OpId, dir: Direction, follow: F) -> FxHashSet<OpId>
    where
        F: Fn(&Dependence) -> bool,
    {
        let mut visited = FxHashSet::default();
        let mut worklist: VecDeque<OpId> = VecDeque::new();
        if self.is_internal(op) {
            worklist.push_back(op);
        }
        while let Some(current) = worklist.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for dep in self.adjacent(current, dir) {
                let next = match dir {
                    Direction::Incoming => dep.src,
                    Direction::Outgoing => dep.dst,
                };
                if self.is_internal(next) && !visited.contains(&next) && follow(&dep) {
                    worklist.push_back(next);
                }
            }
        }
        visited
    }

    /// Get statistics
    pub fn stats(&self) -> PdgStats {
        let mut stats = PdgStats {
            internal_nodes: self.num_internal(),
            external_nodes: self.graph.node_count() - self.num_internal(),
            ..PdgStats::default()
        };
        for dep in self.dependences() {
            match dep.kind {
                DepKind::Register => stats.register += 1,
                DepKind::Control => stats.control += 1,
                _ => stats.memory += 1,
            }
            if dep.loop_carried {
                stats.loop_carried += 1;
            }
            if self.is_removable(&dep) {
                stats.removable += 1;
            }
        }
        stats
    }
}
