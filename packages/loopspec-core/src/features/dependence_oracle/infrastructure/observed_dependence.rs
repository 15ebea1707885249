//! Profile-driven oracle over observed memory dependences
//!
//! A loop-carried dependence the profiler saw at most `threshold` times is
//! assumed absent. Only loops that were dependence-profiled are answered,
//! and only for operations inside the loop. Intra-iteration dependences are
//! never speculated here.

use crate::features::dependence_oracle::domain::{
    ModRef, ModRefQuery, ModuleAnswer, SchedulingPreference, TemporalRelation,
};
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};
use crate::shared::constants::oracle_costs;

#[derive(Debug, Clone)]
pub struct ObservedDependenceModule {
    threshold: u64,
}

impl ObservedDependenceModule {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }
}

impl OracleModule for ObservedDependenceModule {
    fn name(&self) -> &'static str {
        "observed_dependence"
    }

    // the most expensive assumption: asked only when nothing else helps
    fn preference(&self) -> SchedulingPreference {
        SchedulingPreference::BOTTOM
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        let program = cx.program.program;
        let (Some(loop_id), Some(target)) = (query.loop_id, query.target_op()) else {
            return ModuleAnswer::certain(ModRef::ModRef);
        };
        if !program.loop_contains_op(loop_id, query.op) || !program.loop_contains_op(loop_id, target) {
            return ModuleAnswer::certain(ModRef::ModRef);
        }
        let (src, dst) = match query.rel {
            TemporalRelation::Before => (query.op, target),
            TemporalRelation::After => (target, query.op),
            TemporalRelation::Same => return ModuleAnswer::certain(ModRef::ModRef),
        };
        match cx.program.profile.observed_count(loop_id, src, dst, true) {
            Some(count) if count <= self.threshold => {
                ModuleAnswer::speculative(ModRef::NoModRef, oracle_costs::OBSERVED_DEPENDENCE)
            }
            _ => ModuleAnswer::certain(ModRef::ModRef),
        }
    }
}
