//! Value-prediction oracle
//!
//! A load whose value is predictable across iterations does not need the
//! stores of earlier iterations: the loop-carried flow into it can be
//! replaced by the prediction.

use crate::features::dependence_oracle::domain::{
    ModRef, ModRefQuery, ModuleAnswer, TemporalRelation,
};
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};
use crate::shared::constants::oracle_costs;
use crate::shared::models::{OpKind, ProgramContext};

#[derive(Debug, Default)]
pub struct ValuePredictionModule;

impl OracleModule for ValuePredictionModule {
    fn name(&self) -> &'static str {
        "value_prediction"
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        let ProgramContext { program, profile, .. } = cx.program;
        let (Some(loop_id), Some(target)) = (query.loop_id, query.target_op()) else {
            return ModuleAnswer::certain(ModRef::ModRef);
        };
        let predictable = |op| {
            matches!(program.op(op).kind, OpKind::Load { .. })
                && profile.is_predictable_load(loop_id, op)
        };
        let effects = program.op_effects(query.op);
        let full = ModRef::from_effects(effects.reads, effects.writes);
        let narrowed = match query.rel {
            // writes of this iteration reach the target in a later one
            TemporalRelation::Before if predictable(target) => full.without_mod(),
            // this load reads what the target wrote in an earlier iteration
            TemporalRelation::After if predictable(query.op) => full.without_ref(),
            _ => return ModuleAnswer::certain(ModRef::ModRef),
        };
        if narrowed == full {
            return ModuleAnswer::certain(ModRef::ModRef);
        }
        ModuleAnswer::speculative(narrowed, oracle_costs::VALUE_PREDICTION)
    }
}
