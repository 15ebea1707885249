//! Single-iteration view of a loop's control flow
//!
//! The loop body is cut open: back edges to the header and edges leaving the
//! loop are redirected to one virtual exit node. On that graph we answer
//! - intra-iteration reachability between blocks and operations
//! - post-dominance frontiers (control dependence within one iteration)
//!
//! Post-dominators come from `petgraph::algo::dominators` on the reversed
//! graph rooted at the virtual exit.

use crate::shared::models::{BlockId, LoopId, OpId, Program};
use petgraph::algo::dominators;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Reversed;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Cut-open loop CFG
#[derive(Debug, Clone)]
pub struct LoopCfg {
    loop_id: LoopId,
    /// `None` is the virtual exit
    graph: DiGraph<Option<BlockId>, ()>,
    node_of: FxHashMap<BlockId, NodeIndex>,
    exit: NodeIndex,
    /// Blocks reachable through one or more edges, within one iteration
    reach: FxHashMap<BlockId, FxHashSet<BlockId>>,
    /// Branch blocks each block is control dependent on
    frontier: FxHashMap<BlockId, Vec<BlockId>>,
}

impl LoopCfg {
    pub fn new(program: &Program, loop_id: LoopId) -> Self {
        Self::with_edge_filter(program, loop_id, |_, _| true)
    }

    /// Build while dropping the CFG edges `keep` rejects (speculated-dead
    /// edges, for instance)
    pub fn with_edge_filter<F>(program: &Program, loop_id: LoopId, keep: F) -> Self
    where
        F: Fn(BlockId, BlockId) -> bool,
    {
        let info = program.loop_info(loop_id);
        let mut graph = DiGraph::new();
        let mut node_of = FxHashMap::default();
        for b in &info.blocks {
            node_of.insert(*b, graph.add_node(Some(*b)));
        }
        let exit = graph.add_node(None);

        for b in &info.blocks {
            let from = node_of[b];
            for s in program.succs(*b) {
                if !keep(*b, *s) {
                    continue;
                }
                let to = match node_of.get(s) {
                    Some(n) if *s != info.header => *n,
                    _ => exit,
                };
                if graph.find_edge(from, to).is_none() {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut cfg = Self {
            loop_id,
            graph,
            node_of,
            exit,
            reach: FxHashMap::default(),
            frontier: FxHashMap::default(),
        };
        cfg.compute_reachability();
        cfg.compute_frontiers();
        cfg
    }

    pub fn loop_id(&self) -> LoopId {
        self.loop_id
    }

    fn compute_reachability(&mut self) {
        for (block, start) in &self.node_of {
            let mut seen = FxHashSet::default();
            let mut queue: VecDeque<NodeIndex> = self
                .graph
                .neighbors_directed(*start, Direction::Outgoing)
                .collect();
            while let Some(n) = queue.pop_front() {
                if let Some(b) = self.graph[n] {
                    if seen.insert(b) {
                        queue.extend(self.graph.neighbors_directed(n, Direction::Outgoing));
                    }
                }
            }
            self.reach.insert(*block, seen);
        }
    }

    fn compute_frontiers(&mut self) {
        let post_doms = dominators::simple_fast(Reversed(&self.graph), self.exit);
        for edge in self.graph.edge_indices() {
            let Some((a, b)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let Some(a_block) = self.graph[a] else {
                continue;
            };
            let stop = post_doms.immediate_dominator(a);
            let mut runner = Some(b);
            while let Some(r) = runner {
                if Some(r) == stop || r == self.exit {
                    break;
                }
                if let Some(r_block) = self.graph[r] {
                    let deps = self.frontier.entry(r_block).or_default();
                    if !deps.contains(&a_block) {
                        deps.push(a_block);
                    }
                }
                runner = post_doms.immediate_dominator(r);
            }
        }
        for deps in self.frontier.values_mut() {
            deps.sort();
        }
    }

    /// Blocks whose branch decides, within one iteration, whether `block`
    /// executes
    pub fn post_dominance_frontier(&self, block: BlockId) -> &[BlockId] {
        self.frontier.get(&block).map_or(&[], |v| v.as_slice())
    }

    /// `to` is reachable from `from` through at least one edge without
    /// taking the back edge
    pub fn block_reaches(&self, from: BlockId, to: BlockId) -> bool {
        self.reach.get(&from).is_some_and(|s| s.contains(&to))
    }

    /// Whether some execution of `src` can be followed by `dst` within the
    /// same iteration
    pub fn op_reaches(&self, program: &Program, src: OpId, dst: OpId) -> bool {
        let (sb, db) = (program.op(src).block, program.op(dst).block);
        if sb == db && program.position(src) < program.position(dst) {
            return true;
        }
        self.block_reaches(sb, db)
    }

    /// Whether the block has an incoming edge in this view (the header is
    /// always live)
    pub fn is_live(&self, program: &Program, block: BlockId) -> bool {
        let header = program.loop_info(self.loop_id).header;
        block == header || self.block_reaches(header, block)
    }

    pub fn contains(&self, block: BlockId) -> bool {
        self.node_of.contains_key(&block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::*;

    /// bb0: header, cond branch to bb1 / bb2
    /// bb1: then, jumps to bb2
    /// bb2: latch, cond branch back to bb0 or out to bb3
    fn diamond_loop() -> Program {
        let blocks = vec![
            (vec![BlockId(1), BlockId(2)], vec![OpId(0)]),
            (vec![BlockId(2)], vec![OpId(1), OpId(2)]),
            (vec![BlockId(0), BlockId(3)], vec![OpId(3)]),
            (vec![], vec![OpId(4)]),
        ];
        let def = ProgramDef {
            functions: vec![Function {
                id: FunctionId(0),
                name: "f".into(),
                blocks: (0..4).map(BlockId).collect(),
                arguments: vec![],
            }],
            blocks: blocks
                .into_iter()
                .enumerate()
                .map(|(i, (succs, ops))| Block {
                    id: BlockId(i as u32),
                    function: FunctionId(0),
                    name: None,
                    ops,
                    succs,
                })
                .collect(),
            operations: vec![
                Operation::new(OpId(0), BlockId(0), OpKind::Branch { conditional: true }),
                Operation::new(OpId(1), BlockId(1), OpKind::Compute),
                Operation::new(OpId(2), BlockId(1), OpKind::Branch { conditional: false }),
                Operation::new(OpId(3), BlockId(2), OpKind::Branch { conditional: true }),
                Operation::new(OpId(4), BlockId(3), OpKind::Return),
            ],
            loops: vec![Loop {
                id: LoopId(0),
                function: FunctionId(0),
                header: BlockId(0),
                blocks: vec![BlockId(0), BlockId(1), BlockId(2)],
                parent: None,
                induction: None,
                reductions: vec![],
            }],
            pointers: vec![],
            objects: vec![],
        };
        Program::new(def).unwrap()
    }

    #[test]
    fn test_then_block_depends_on_header_branch() {
        let p = diamond_loop();
        let cfg = LoopCfg::new(&p, LoopId(0));
        assert_eq!(cfg.post_dominance_frontier(BlockId(1)), &[BlockId(0)]);
        assert!(cfg.post_dominance_frontier(BlockId(2)).is_empty());
        assert!(cfg.post_dominance_frontier(BlockId(0)).is_empty());
    }

    #[test]
    fn test_reachability_ignores_back_edge() {
        let p = diamond_loop();
        let cfg = LoopCfg::new(&p, LoopId(0));
        assert!(cfg.block_reaches(BlockId(0), BlockId(2)));
        assert!(!cfg.block_reaches(BlockId(2), BlockId(0)));
        assert!(!cfg.op_reaches(&p, OpId(3), OpId(1)));
        assert!(cfg.op_reaches(&p, OpId(1), OpId(2)));
        assert!(!cfg.op_reaches(&p, OpId(2), OpId(1)));
    }

    #[test]
    fn test_edge_filter_kills_block() {
        let p = diamond_loop();
        let cfg = LoopCfg::with_edge_filter(&p, LoopId(0), |from, to| {
            !(from == BlockId(0) && to == BlockId(1))
        });
        assert!(!cfg.is_live(&p, BlockId(1)));
        assert!(cfg.is_live(&p, BlockId(2)));
        // only one live successor left: no control dependence
        assert!(cfg.post_dominance_frontier(BlockId(2)).is_empty());
    }
}
