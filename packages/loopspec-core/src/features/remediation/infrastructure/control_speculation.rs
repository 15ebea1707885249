//! Control speculation
//!
//! Profile-dead blocks and never-taken edges are speculated away. A
//! dependence disappears when an endpoint is speculatively dead, when two
//! memory operations can no longer reach each other within one iteration,
//! or when a control dependence only exists through a dead edge.
//!
//! Control dependences that survive on the speculative CFG are kept in an
//! "unremovable" set per loop:
//! - post-dominance frontier: a live branch still decides whether a block
//!   runs
//! - phi selection: a branch with two or more live successors feeds the
//!   choice of a multi-input phi
//! - loop exit: a live exit decides whether any operation runs again

use crate::config::RemediatorKind;
use crate::features::dependence_oracle::speculative_loop_cfg;
use crate::features::pdg::DepKind;
use crate::features::remediation::domain::{Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::analysis::LoopCfg;
use crate::shared::constants::remedy_costs;
use crate::shared::models::{ExecutionProfile, LoopId, OpId, OpKind, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::Rc;

struct SpeculativeLoop {
    cfg: LoopCfg,
    unremovable: FxHashSet<(OpId, OpId)>,
}

impl SpeculativeLoop {
    fn new(program: &Program, profile: &ExecutionProfile, loop_id: LoopId) -> Self {
        let cfg = speculative_loop_cfg(program, profile, loop_id);
        let info = program.loop_info(loop_id);
        let live_succs = |block| -> Vec<_> {
            program
                .succs(block)
                .iter()
                .copied()
                .filter(|s| !profile.is_dead_edge(block, *s))
                .collect()
        };
        let mut unremovable = FxHashSet::default();

        for &block in &info.blocks {
            if !cfg.is_live(program, block) {
                continue;
            }
            for &branch_block in cfg.post_dominance_frontier(block) {
                let Some(term) = program.terminator(branch_block) else {
                    continue;
                };
                for &op in &program.block(block).ops {
                    unremovable.insert((term, op));
                }
            }
        }

        for &block in &info.blocks {
            if !cfg.is_live(program, block) {
                continue;
            }
            let Some(term) = program.terminator(block) else {
                continue;
            };
            let succs = live_succs(block);
            if succs.len() > 1 {
                for s in succs.iter().filter(|s| program.loop_contains_block(loop_id, **s)) {
                    for &op in &program.block(*s).ops {
                        if let OpKind::Phi { incoming } = &program.op(op).kind {
                            if incoming.len() > 1 {
                                unremovable.insert((term, op));
                            }
                        }
                    }
                }
            }
            let exits = succs
                .iter()
                .any(|s| !program.loop_contains_block(loop_id, *s));
            if exits {
                for op in program.loop_ops(loop_id) {
                    unremovable.insert((term, op));
                }
            }
        }

        Self { cfg, unremovable }
    }

    fn is_dead(&self, program: &Program, profile: &ExecutionProfile, op: OpId) -> bool {
        let block = program.op(op).block;
        profile.is_dead_block(block) || !self.cfg.is_live(program, block)
    }
}

#[derive(Default)]
pub struct ControlSpeculationRemediator {
    loops: RefCell<FxHashMap<LoopId, Rc<SpeculativeLoop>>>,
}

impl ControlSpeculationRemediator {
    pub fn new() -> Self {
        Self::default()
    }

    fn speculative_loop(&self, cx: &RemediationContext<'_>) -> Rc<SpeculativeLoop> {
        self.loops
            .borrow_mut()
            .entry(cx.loop_id)
            .or_insert_with(|| {
                Rc::new(SpeculativeLoop::new(
                    cx.program.program,
                    cx.program.profile,
                    cx.loop_id,
                ))
            })
            .clone()
    }

    fn remedy(branch: Option<OpId>) -> Remedy {
        Remedy::new(
            RemediatorKind::ControlSpeculation,
            remedy_costs::CONTROL_SPECULATION,
            RemedyPayload::ControlSpeculation { branch },
        )
    }

    fn either_dead(&self, a: OpId, b: OpId, cx: &RemediationContext<'_>) -> bool {
        let spec = self.speculative_loop(cx);
        let (program, profile) = (cx.program.program, cx.program.profile);
        spec.is_dead(program, profile, a) || spec.is_dead(program, profile, b)
    }
}

impl Remediator for ControlSpeculationRemediator {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::ControlSpeculation
    }

    fn memdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        _kind: DepKind,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        if self.either_dead(a, b, cx) {
            return RemedyResponse::removed(Self::remedy(None));
        }
        let spec = self.speculative_loop(cx);
        if !loop_carried && !spec.cfg.op_reaches(cx.program.program, a, b) {
            return RemedyResponse::removed(Self::remedy(None));
        }
        RemedyResponse::dependent()
    }

    fn regdep(
        &self,
        a: OpId,
        b: OpId,
        _loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        if self.either_dead(a, b, cx) {
            return RemedyResponse::removed(Self::remedy(None));
        }
        // a phi that only receives `a` along dead edges
        let (program, profile) = (cx.program.program, cx.program.profile);
        let spec = self.speculative_loop(cx);
        let dead_edge = |from, to| {
            profile.is_dead_edge(from, to)
                || profile.is_dead_block(from)
                || (spec.cfg.contains(from) && !spec.cfg.is_live(program, from))
        };
        let user = program.op(b);
        if user.is_phi() {
            let mut uses = user
                .operands
                .iter()
                .enumerate()
                .filter(|(_, v)| **v == a)
                .filter_map(|(i, _)| user.phi_incoming_block(i))
                .peekable();
            if uses.peek().is_some() && uses.all(|from| dead_edge(from, user.block)) {
                return RemedyResponse::removed(Self::remedy(None));
            }
        }
        RemedyResponse::dependent()
    }

    fn ctrldep(
        &self,
        a: OpId,
        b: OpId,
        _loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        let spec = self.speculative_loop(cx);
        if spec.unremovable.contains(&(a, b)) {
            return RemedyResponse::dependent();
        }
        RemedyResponse::removed(Self::remedy(Some(a)))
    }
}
