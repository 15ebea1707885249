//! Control-speculation aware pruning: effects in profile-dead blocks, or
//! reached through a call site in a dead block, never happen

use crate::features::footprint::domain::{ContextArena, CtxId};
use crate::features::footprint::ports::KillOracle;
use crate::shared::models::{ExecutionProfile, OpId, Program};

pub struct DeadBlockKill<'a> {
    program: &'a Program,
    profile: &'a ExecutionProfile,
}

impl<'a> DeadBlockKill<'a> {
    pub fn new(program: &'a Program, profile: &'a ExecutionProfile) -> Self {
        Self { program, profile }
    }

    fn is_dead(&self, op: OpId) -> bool {
        self.profile.is_dead_block(self.program.op(op).block)
    }
}

impl KillOracle for DeadBlockKill<'_> {
    fn is_killed(&self, op: OpId, ctx: CtxId, arena: &ContextArena) -> bool {
        self.is_dead(op) || arena.callsites(ctx).into_iter().any(|site| self.is_dead(site))
    }
}
