//! Which candidate loops may be parallelized together
//!
//! Two loops are compatible unless they can be active at the same time or
//! their heap classifications disagree. A loop is active at the same time
//! as another when one contains the other's header, or when either may
//! call into the function holding the other.

use crate::shared::models::{LoopId, ProgramContext};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Conflict {
    /// One loop's header lies inside the other
    Nested,
    /// One loop may call into the other's function
    Calls,
    /// Some object is classified differently by the two loops
    HeapClasses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Incompatibility {
    pub a: LoopId,
    pub b: LoopId,
    pub conflict: Conflict,
}

/// First reason `a` and `b` cannot both be parallelized
pub fn conflict(ctx: ProgramContext<'_>, a: LoopId, b: LoopId) -> Option<Conflict> {
    let program = ctx.program;
    let (la, lb) = (program.loop_info(a), program.loop_info(b));
    if program.loop_contains_block(a, lb.header) || program.loop_contains_block(b, la.header) {
        return Some(Conflict::Nested);
    }
    if program.loop_may_call(a, lb.function) || program.loop_may_call(b, la.function) {
        return Some(Conflict::Calls);
    }
    if !ctx.heap.compatible(a, b) {
        return Some(Conflict::HeapClasses);
    }
    None
}

/// Undirected compatibility graph; vertex `v` is `loops[v]`
#[derive(Debug, Clone)]
pub struct CompatibilityGraph {
    loops: Vec<LoopId>,
    adjacency: Vec<BTreeSet<usize>>,
    conflicts: Vec<Incompatibility>,
}

impl CompatibilityGraph {
    pub fn build(ctx: ProgramContext<'_>, loops: Vec<LoopId>) -> Self {
        let n = loops.len();
        let mut adjacency = vec![BTreeSet::new(); n];
        let mut conflicts = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (loops[i], loops[j]);
                match conflict(ctx, a, b) {
                    Some(conflict) => {
                        debug!(a = %a, b = %b, ?conflict, "loops incompatible");
                        conflicts.push(Incompatibility { a, b, conflict });
                    }
                    None => {
                        adjacency[i].insert(j);
                        adjacency[j].insert(i);
                    }
                }
            }
        }
        Self {
            loops,
            adjacency,
            conflicts,
        }
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn loop_at(&self, vertex: usize) -> LoopId {
        self.loops[vertex]
    }

    pub fn adjacency(&self) -> &[BTreeSet<usize>] {
        &self.adjacency
    }

    pub fn compatible(&self, u: usize, v: usize) -> bool {
        self.adjacency[u].contains(&v)
    }

    pub fn conflicts(&self) -> &[Incompatibility] {
        &self.conflicts
    }

    pub fn into_conflicts(self) -> Vec<Incompatibility> {
        self.conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::fixtures::{loop_nest, Inputs};
    use crate::shared::models::{HeapAssignment, HeapClass, ObjectId};

    #[test]
    fn test_nested_loops_conflict() {
        let program = loop_nest();
        let inputs = Inputs::default();
        let ctx = inputs.context(&program);
        assert_eq!(conflict(ctx, LoopId(0), LoopId(1)), Some(Conflict::Nested));
        assert_eq!(conflict(ctx, LoopId(1), LoopId(0)), Some(Conflict::Nested));
        assert_eq!(conflict(ctx, LoopId(0), LoopId(2)), None);
    }

    #[test]
    fn test_calling_loop_conflicts_with_callee_loop() {
        let program = loop_nest();
        let inputs = Inputs::default();
        let ctx = inputs.context(&program);
        assert_eq!(conflict(ctx, LoopId(2), LoopId(3)), Some(Conflict::Calls));
        assert_eq!(conflict(ctx, LoopId(3), LoopId(2)), Some(Conflict::Calls));
        assert_eq!(conflict(ctx, LoopId(1), LoopId(3)), None);
    }

    #[test]
    fn test_heap_conflict() {
        let program = loop_nest();
        let inputs = Inputs {
            heap: HeapAssignment::new()
                .with(LoopId(0), ObjectId(0), HeapClass::Private)
                .with(LoopId(2), ObjectId(0), HeapClass::Shared),
            ..Inputs::default()
        };
        let ctx = inputs.context(&program);
        assert_eq!(conflict(ctx, LoopId(0), LoopId(2)), Some(Conflict::HeapClasses));
    }

    #[test]
    fn test_graph_edges_are_symmetric() {
        let program = loop_nest();
        let inputs = Inputs::default();
        let graph = CompatibilityGraph::build(
            inputs.context(&program),
            (0..4).map(LoopId).collect(),
        );
        assert_eq!(graph.len(), 4);
        assert!(graph.compatible(0, 2) && graph.compatible(2, 0));
        assert!(!graph.compatible(0, 1));
        assert!(!graph.compatible(2, 3));
        assert_eq!(graph.conflicts().len(), 2);
        for (v, neighbors) in graph.adjacency().iter().enumerate() {
            assert!(!neighbors.contains(&v));
        }
    }
}
