//! Control-speculation aware oracle
//!
//! Blocks and edges the profile never executed are assumed dead. An
//! operation in a dead block has no effect; two operations that can no
//! longer reach each other within one iteration have no intra-iteration
//! dependence.

use crate::features::dependence_oracle::domain::{
    ModRef, ModRefQuery, ModuleAnswer, TemporalRelation,
};
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};
use crate::shared::analysis::LoopCfg;
use crate::shared::constants::oracle_costs;
use crate::shared::models::{ExecutionProfile, LoopId, OpId, Program, ProgramContext};
use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// Loop view with every speculatively dead edge removed
pub fn speculative_loop_cfg(
    program: &Program,
    profile: &ExecutionProfile,
    loop_id: LoopId,
) -> LoopCfg {
    LoopCfg::with_edge_filter(program, loop_id, |from, to| {
        !profile.is_dead_block(from) && !profile.is_dead_edge(from, to)
    })
}

#[derive(Default)]
pub struct ControlSpeculationModule {
    speculative: RefCell<FxHashMap<LoopId, LoopCfg>>,
    exact: RefCell<FxHashMap<LoopId, LoopCfg>>,
}

impl ControlSpeculationModule {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_dead(program: &Program, profile: &ExecutionProfile, op: OpId) -> bool {
        profile.is_dead_block(program.op(op).block)
    }

    /// Whether `a` and `b` are ordered within one iteration under the
    /// exact (`speculative == false`) or speculative control flow
    fn ordered(
        &self,
        program: &Program,
        profile: &ExecutionProfile,
        loop_id: LoopId,
        a: OpId,
        b: OpId,
        speculative: bool,
    ) -> bool {
        let cache = if speculative { &self.speculative } else { &self.exact };
        let mut cache = cache.borrow_mut();
        let cfg = cache.entry(loop_id).or_insert_with(|| {
            if speculative {
                speculative_loop_cfg(program, profile, loop_id)
            } else {
                LoopCfg::new(program, loop_id)
            }
        });
        cfg.op_reaches(program, a, b) || cfg.op_reaches(program, b, a)
    }

    fn live(&self, program: &Program, profile: &ExecutionProfile, loop_id: LoopId, op: OpId) -> bool {
        let mut cache = self.speculative.borrow_mut();
        let cfg = cache
            .entry(loop_id)
            .or_insert_with(|| speculative_loop_cfg(program, profile, loop_id));
        cfg.is_live(program, program.op(op).block)
    }
}

impl OracleModule for ControlSpeculationModule {
    fn name(&self) -> &'static str {
        "control_speculation"
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        let ProgramContext { program, profile, .. } = cx.program;
        let dead = ModuleAnswer::speculative(ModRef::NoModRef, oracle_costs::CONTROL_SPECULATION);

        if Self::is_dead(program, profile, query.op) {
            return dead;
        }
        let Some(target) = query.target_op() else {
            return ModuleAnswer::certain(ModRef::ModRef);
        };
        if Self::is_dead(program, profile, target) {
            return dead;
        }

        let Some(loop_id) = query.loop_id else {
            return ModuleAnswer::certain(ModRef::ModRef);
        };
        let in_loop = |op| program.loop_contains_op(loop_id, op);
        if !in_loop(query.op) || !in_loop(target) {
            return ModuleAnswer::certain(ModRef::ModRef);
        }
        if !self.live(program, profile, loop_id, query.op)
            || !self.live(program, profile, loop_id, target)
        {
            return dead;
        }
        if query.rel == TemporalRelation::Same
            && !self.ordered(program, profile, loop_id, query.op, target, true)
        {
            if !self.ordered(program, profile, loop_id, query.op, target, false) {
                return ModuleAnswer::certain(ModRef::NoModRef);
            }
            return dead;
        }
        ModuleAnswer::certain(ModRef::ModRef)
    }
}
