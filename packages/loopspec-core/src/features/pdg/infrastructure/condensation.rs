//! SCC condensation of a loop PDG
//!
//! Strongly connected components over the loop's own operations (external
//! nodes are ignored), numbered in topological order of the component DAG:
//! every cross-component dependence goes from a lower id to a higher one.
//!
//! Components come from `petgraph::algo::tarjan_scc`, which emits them in
//! reverse topological order.

use super::pdg::ProgramDependenceGraph;
use crate::define_id;
use crate::features::pdg::domain::{DepBits, Dependence};
use crate::shared::models::OpId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::FxHashMap;
use serde::Serialize;

define_id!(
    /// Strongly connected component id (topological position)
    SccId,
    "scc"
);

#[derive(Debug, Clone, Serialize)]
pub struct Scc {
    pub id: SccId,
    /// Members in program order
    pub ops: Vec<OpId>,
    /// Some retained dependence between two members is loop-carried
    pub loop_carried: bool,
}

impl Scc {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Condensation {
    sccs: Vec<Scc>,
    scc_of: FxHashMap<OpId, SccId>,
    /// Node `i` is `SccId(i)`; edge weights merge every dependence flavour
    /// between the two components
    dag: DiGraph<SccId, DepBits>,
}

impl Condensation {
    /// Condense over every dependence of the graph
    pub fn new(pdg: &ProgramDependenceGraph) -> Self {
        Self::with_filter(pdg, |_| true)
    }

    /// Condense over the dependences `keep` accepts
    pub fn with_filter<F>(pdg: &ProgramDependenceGraph, keep: F) -> Self
    where
        F: Fn(&Dependence) -> bool,
    {
        let mut graph: DiGraph<OpId, ()> = DiGraph::new();
        let mut index: FxHashMap<OpId, NodeIndex> = FxHashMap::default();
        for op in pdg.internal_ops() {
            index.insert(op, graph.add_node(op));
        }
        let kept: Vec<Dependence> = pdg
            .internal_dependences()
            .filter(|d| keep(d))
            .collect();
        for d in &kept {
            let (from, to) = (index[&d.src], index[&d.dst]);
            if graph.find_edge(from, to).is_none() {
                graph.add_edge(from, to, ());
            }
        }

        let mut components = tarjan_scc(&graph);
        components.reverse();

        let mut sccs = Vec::with_capacity(components.len());
        let mut scc_of = FxHashMap::default();
        for (i, mut members) in components.into_iter().enumerate() {
            members.sort_unstable();
            let id = SccId(i as u32);
            let ops: Vec<OpId> = members.iter().map(|n| graph[*n]).collect();
            for op in &ops {
                scc_of.insert(*op, id);
            }
            sccs.push(Scc {
                id,
                ops,
                loop_carried: false,
            });
        }

        let mut dag: DiGraph<SccId, DepBits> = DiGraph::with_capacity(sccs.len(), 0);
        for scc in &sccs {
            dag.add_node(scc.id);
        }
        for d in &kept {
            let (a, b) = (scc_of[&d.src], scc_of[&d.dst]);
            if a == b {
                if d.loop_carried {
                    sccs[a.index()].loop_carried = true;
                }
                continue;
            }
            let (na, nb) = (NodeIndex::new(a.index()), NodeIndex::new(b.index()));
            match dag.find_edge(na, nb) {
                Some(e) => {
                    dag[e].insert(d.kind, d.loop_carried);
                }
                None => {
                    dag.add_edge(na, nb, DepBits::single(d.kind, d.loop_carried));
                }
            }
        }

        Self { sccs, scc_of, dag }
    }

    pub fn len(&self) -> usize {
        self.sccs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sccs.is_empty()
    }

    /// Components in topological order
    pub fn sccs(&self) -> &[Scc] {
        &self.sccs
    }

    pub fn scc(&self, id: SccId) -> &Scc {
        &self.sccs[id.index()]
    }

    pub fn scc_of(&self, op: OpId) -> Option<SccId> {
        self.scc_of.get(&op).copied()
    }

    pub fn successors(&self, id: SccId) -> Vec<SccId> {
        self.neighbors(id, Direction::Outgoing)
    }

    pub fn predecessors(&self, id: SccId) -> Vec<SccId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: SccId, dir: Direction) -> Vec<SccId> {
        let mut out: Vec<SccId> = self
            .dag
            .neighbors_directed(NodeIndex::new(id.index()), dir)
            .map(|n| self.dag[n])
            .collect();
        out.sort_unstable();
        out
    }

    /// Cross-component edges `(from, to, flavours)`
    pub fn edges(&self) -> impl Iterator<Item = (SccId, SccId, DepBits)> + '_ {
        self.dag
            .edge_references()
            .map(move |e| (self.dag[e.source()], self.dag[e.target()], *e.weight()))
    }

    pub fn edge(&self, from: SccId, to: SccId) -> DepBits {
        self.dag
            .find_edge(NodeIndex::new(from.index()), NodeIndex::new(to.index()))
            .map_or(DepBits::EMPTY, |e| self.dag[e])
    }

    /// Any retained loop-carried dependence, inside or across components
    pub fn has_loop_carried(&self) -> bool {
        self.sccs.iter().any(|s| s.loop_carried) || self.edges().any(|(_, _, b)| b.has_loop_carried())
    }

    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.dag)
    }
}
