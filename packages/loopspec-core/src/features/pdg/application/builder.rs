//! PDG construction for one loop
//!
//! Register edges:
//! - def -> use inside the loop, loop-carried iff the use is a header phi
//! - live-in definitions and live-out users become external nodes
//!
//! Control edges (on the cut-open loop CFG, speculatable operations are
//! never control dependent):
//! - branch -> operations of the blocks in its post-dominance frontier
//! - conditional branch -> multi-input phis of its in-loop successors
//!   (loop-carried when the successor is the header)
//! - exiting branch -> every operation not already intra-iteration control
//!   dependent on it, loop-carried
//!
//! Sub-loop constraint (optional): the operations of every immediate
//! sub-loop are chained into one intra-iteration register ring so each
//! sub-loop lands in a single SCC.
//!
//! Memory edges: every ordered pair of memory operations is queried
//! loop-carried (Before, then After in reverse) and, when one can reach the
//! other within an iteration, intra-iteration (Same both ways). Flow, anti
//! and output edges follow from the forward and reverse answers.

use crate::features::dependence_oracle::{ModRef, ModRefQuery, TemporalRelation};
use crate::features::pdg::domain::{DepKind, Dependence};
use crate::features::pdg::infrastructure::ProgramDependenceGraph;
use crate::features::pdg::ports::MemoryDependenceOracle;
use crate::shared::analysis::LoopCfg;
use crate::shared::models::{LoopId, OpId, OpKind, Program};
use serde::Serialize;
use tracing::debug;

/// Counters of the last build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PdgBuildStats {
    pub memory_queries: u64,
    pub timed_out_queries: u64,
    pub register_edges: u64,
    pub control_edges: u64,
    pub memory_edges: u64,
}

pub struct PdgBuilder<'a> {
    program: &'a Program,
    oracle: &'a dyn MemoryDependenceOracle,
    constrain_sub_loops: bool,
    stats: PdgBuildStats,
}

impl<'a> PdgBuilder<'a> {
    pub fn new(program: &'a Program, oracle: &'a dyn MemoryDependenceOracle) -> Self {
        Self {
            program,
            oracle,
            constrain_sub_loops: false,
            stats: PdgBuildStats::default(),
        }
    }

    /// Keep every immediate sub-loop inside one SCC
    pub fn constrain_sub_loops(mut self, enabled: bool) -> Self {
        self.constrain_sub_loops = enabled;
        self
    }

    pub fn stats(&self) -> PdgBuildStats {
        self.stats
    }

    pub fn build(&mut self, loop_id: LoopId) -> ProgramDependenceGraph {
        self.stats = PdgBuildStats::default();
        let mut pdg = ProgramDependenceGraph::new(loop_id);
        for op in self.program.loop_ops(loop_id) {
            pdg.add_node(op, true);
        }
        let cfg = LoopCfg::new(self.program, loop_id);

        self.register_edges(&mut pdg, loop_id);
        self.control_edges(&mut pdg, loop_id, &cfg);
        if self.constrain_sub_loops {
            self.sub_loop_rings(&mut pdg, loop_id);
        }
        self.memory_edges(&mut pdg, loop_id, &cfg);

        debug!(
            loop_name = %self.program.loop_name(loop_id),
            nodes = pdg.num_internal(),
            register = self.stats.register_edges,
            control = self.stats.control_edges,
            memory = self.stats.memory_edges,
            queries = self.stats.memory_queries,
            "built loop PDG"
        );
        pdg
    }

    fn add(&mut self, pdg: &mut ProgramDependenceGraph, dep: Dependence) {
        if pdg.add_dependence(dep) {
            match dep.kind {
                DepKind::Register => self.stats.register_edges += 1,
                DepKind::Control => self.stats.control_edges += 1,
                _ => self.stats.memory_edges += 1,
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Register dependences
    // ═══════════════════════════════════════════════════════════════════

    fn register_edges(&mut self, pdg: &mut ProgramDependenceGraph, loop_id: LoopId) {
        let program = self.program;
        let ops: Vec<OpId> = program.loop_ops(loop_id).collect();
        for &user in &ops {
            let loop_carried = program.is_header_phi(loop_id, user);
            for &def in &program.op(user).operands {
                let carried = loop_carried && program.loop_contains_op(loop_id, def);
                self.add(pdg, Dependence::new(def, user, DepKind::Register, carried));
            }
        }
        // live-outs
        for op in program.operations() {
            if program.loop_contains_op(loop_id, op.id) {
                continue;
            }
            for &def in &op.operands {
                if program.loop_contains_op(loop_id, def) {
                    self.add(pdg, Dependence::new(def, op.id, DepKind::Register, false));
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Control dependences
    // ═══════════════════════════════════════════════════════════════════

    fn sub_loop_rings(&mut self, pdg: &mut ProgramDependenceGraph, loop_id: LoopId) {
        for sub in self.program.subloops(loop_id) {
            let ops: Vec<OpId> = self.program.loop_ops(sub).collect();
            let (Some(&first), Some(&last)) = (ops.first(), ops.last()) else {
                continue;
            };
            for pair in ops.windows(2) {
                self.add(pdg, Dependence::new(pair[0], pair[1], DepKind::Register, false));
            }
            self.add(pdg, Dependence::new(last, first, DepKind::Register, false));
        }
    }

    fn control_edges(&mut self, pdg: &mut ProgramDependenceGraph, loop_id: LoopId, cfg: &LoopCfg) {
        let program = self.program;
        let info = program.loop_info(loop_id);

        for &block in &info.blocks {
            for &branch_block in cfg.post_dominance_frontier(block) {
                let Some(term) = program.terminator(branch_block) else {
                    continue;
                };
                for &op in &program.block(block).ops {
                    if !program.op(op).is_safe_to_speculate() {
                        self.add(pdg, Dependence::new(term, op, DepKind::Control, false));
                    }
                }
            }
        }

        // branches select the incoming value of phis in their successors
        for &block in &info.blocks {
            let Some(term) = program.terminator(block) else {
                continue;
            };
            let conditional = match program.op(term).kind {
                OpKind::Branch { conditional } => conditional,
                OpKind::Switch => true,
                _ => false,
            };
            if !conditional {
                continue;
            }
            for &succ in program.succs(block) {
                if !program.loop_contains_block(loop_id, succ) {
                    continue;
                }
                let loop_carried = succ == info.header;
                for &op in &program.block(succ).ops {
                    let phi = program.op(op);
                    if !phi.is_phi() {
                        break;
                    }
                    if phi.operands.len() > 1 {
                        self.add(pdg, Dependence::new(term, op, DepKind::Control, loop_carried));
                    }
                }
            }
        }

        // an exit decides whether the next iteration runs at all
        for exiting in program.exiting_blocks(loop_id) {
            let Some(term) = program.terminator(exiting) else {
                continue;
            };
            for op in program.loop_ops(loop_id) {
                if program.op(op).is_safe_to_speculate() {
                    continue;
                }
                let intra = Dependence::new(term, op, DepKind::Control, false);
                if pdg.has_dependence(&intra) {
                    continue;
                }
                self.add(pdg, Dependence::new(term, op, DepKind::Control, true));
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Memory dependences
    // ═══════════════════════════════════════════════════════════════════

    fn memory_edges(&mut self, pdg: &mut ProgramDependenceGraph, loop_id: LoopId, cfg: &LoopCfg) {
        let program = self.program;
        let mem_ops: Vec<OpId> = program
            .loop_ops(loop_id)
            .filter(|op| program.touches_memory(*op))
            .collect();
        for &src in &mem_ops {
            for &dst in &mem_ops {
                self.query_memory_dep(
                    pdg,
                    loop_id,
                    src,
                    dst,
                    TemporalRelation::Before,
                    TemporalRelation::After,
                );
                if cfg.op_reaches(program, src, dst) {
                    self.query_memory_dep(
                        pdg,
                        loop_id,
                        src,
                        dst,
                        TemporalRelation::Same,
                        TemporalRelation::Same,
                    );
                }
            }
        }
    }

    /// Answer restricted to what `op` can do at all
    fn clamp(&self, answer: ModRef, op: OpId) -> ModRef {
        let effects = self.program.op_effects(op);
        let mut answer = answer;
        if !effects.writes {
            answer = answer.without_mod();
        }
        if !effects.reads {
            answer = answer.without_ref();
        }
        answer
    }

    fn ask(&mut self, op: OpId, rel: TemporalRelation, target: OpId, loop_id: LoopId) -> ModRef {
        self.stats.memory_queries += 1;
        let answer = self
            .oracle
            .modref(&ModRefQuery::ops(op, rel, target, Some(loop_id)));
        if answer.timed_out {
            self.stats.timed_out_queries += 1;
        }
        answer.result
    }

    fn query_memory_dep(
        &mut self,
        pdg: &mut ProgramDependenceGraph,
        loop_id: LoopId,
        src: OpId,
        dst: OpId,
        forward_rel: TemporalRelation,
        reverse_rel: TemporalRelation,
    ) {
        let program = self.program;
        if !program.may_write_memory(src) && !program.may_write_memory(dst) {
            return;
        }
        let loop_carried = forward_rel != reverse_rel;

        let forward = self.ask(src, forward_rel, dst, loop_id);
        let forward = self.clamp(forward, src);

        let mut reverse = forward;
        if (loop_carried || src != dst) && forward != ModRef::NoModRef {
            reverse = self.ask(dst, reverse_rel, src, loop_id);
        }
        let reverse = self.clamp(reverse, dst);

        let raw = forward.is_mod() && reverse.is_ref();
        let war = forward.is_ref() && reverse.is_mod();
        let waw = forward.is_mod() && reverse.is_mod();

        for (present, kind) in [(raw, DepKind::Flow), (war, DepKind::Anti), (waw, DepKind::Output)] {
            if present {
                self.add(pdg, Dependence::new(src, dst, kind, loop_carried));
            }
        }
    }
}
