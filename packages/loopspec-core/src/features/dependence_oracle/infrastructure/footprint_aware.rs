//! Footprint-aware oracle
//!
//! Decomposes a query about an internal call into queries about the memory
//! effects its callees may expose, and re-asks the full chain for each. The
//! union of the sub-answers bounds the call's answer. A search cut short by
//! the deadline answers conservatively.
//!
//! The speculative flavour prunes effects in profile-dead blocks; an answer
//! that needed such pruning carries the control-speculation price.

use crate::features::dependence_oracle::domain::{
    ModRef, ModRefQuery, ModRefTarget, ModuleAnswer, SchedulingPreference,
};
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};
use crate::features::footprint::{DeadBlockKill, FootprintSearch, SearchOrder};
use crate::shared::constants::oracle_costs;
use crate::shared::models::{Callee, OpId, Program};

#[derive(Debug, Clone)]
pub struct FootprintAwareModule {
    max_depth: u32,
    speculative: bool,
}

/// Outcome of expanding one side of a query
struct Expansion {
    result: ModRef,
    truncated: bool,
    pruned: u64,
}

impl FootprintAwareModule {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            speculative: false,
        }
    }

    /// Prune effects in blocks the profile never executed
    pub fn speculative(max_depth: u32) -> Self {
        Self {
            max_depth,
            speculative: true,
        }
    }

    fn is_internal_call(program: &Program, op: OpId) -> bool {
        matches!(program.op(op).callee(), Some(Callee::Internal { .. }))
    }

    /// Visit the footprint of `root`, folding one answer per entry.
    /// `per_entry` returns `None` for opaque entries it cannot refine.
    fn expand<F>(&self, root: OpId, cx: &QueryContext<'_>, mut per_entry: F) -> Expansion
    where
        F: FnMut(OpId, bool) -> (ModRef, bool),
    {
        let program = cx.program.program;
        let kill = DeadBlockKill::new(program, cx.program.profile);
        let mut search = FootprintSearch::new(program, root, SearchOrder::Forward)
            .max_depth(self.max_depth)
            .deadline(cx.deadline);
        if self.speculative {
            search = search.kill_oracle(&kill);
        }

        let mut result = ModRef::NoModRef;
        let mut truncated = false;
        for entry in search.by_ref() {
            let (answer, timed_out) = per_entry(entry.op, entry.opaque);
            result = result | answer;
            truncated |= timed_out;
            if result == ModRef::ModRef || truncated {
                break;
            }
        }
        Expansion {
            result,
            truncated: truncated || search.truncated(),
            pruned: search.pruned(),
        }
    }

    fn finish(&self, e: Expansion, cap: ModRef) -> ModuleAnswer<ModRef> {
        if e.truncated {
            return ModuleAnswer::timed_out(ModRef::ModRef);
        }
        let result = e.result & cap;
        if self.speculative && e.pruned > 0 && result != cap {
            ModuleAnswer::speculative(result, oracle_costs::CONTROL_SPECULATION)
        } else {
            ModuleAnswer::certain(result)
        }
    }
}

impl OracleModule for FootprintAwareModule {
    fn name(&self) -> &'static str {
        if self.speculative {
            "speculative_footprint"
        } else {
            "footprint_aware"
        }
    }

    fn preference(&self) -> SchedulingPreference {
        SchedulingPreference::LOW
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        let program = cx.program.program;
        let effects = program.op_effects(query.op);
        let cap = ModRef::from_effects(effects.reads, effects.writes);

        if Self::is_internal_call(program, query.op) {
            let expansion = self.expand(query.op, cx, |op, opaque| {
                if opaque {
                    let e = program.op_effects(op);
                    return (ModRef::from_effects(e.reads, e.writes), false);
                }
                let sub = ModRefQuery { op, ..*query };
                let answer = cx.chain.modref_nested(&sub, cx);
                (answer.result, answer.timed_out)
            });
            return self.finish(expansion, cap);
        }

        if let ModRefTarget::Op(target) = query.target {
            if Self::is_internal_call(program, target) {
                let expansion = self.expand(target, cx, |op, opaque| {
                    if opaque {
                        return (cap, false);
                    }
                    let sub = ModRefQuery {
                        target: ModRefTarget::Op(op),
                        ..*query
                    };
                    let answer = cx.chain.modref_nested(&sub, cx);
                    (answer.result, answer.timed_out)
                });
                return self.finish(expansion, cap);
            }
        }

        ModuleAnswer::certain(ModRef::ModRef)
    }
}
