//! Conservative default: answers from declared memory effects alone

use crate::features::dependence_oracle::domain::{
    ModRef, ModRefQuery, ModRefTarget, ModuleAnswer, SchedulingPreference,
};
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};

#[derive(Debug, Default)]
pub struct ConservativeModule;

impl OracleModule for ConservativeModule {
    fn name(&self) -> &'static str {
        "conservative"
    }

    fn preference(&self) -> SchedulingPreference {
        SchedulingPreference::LAST
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        let program = cx.program.program;
        let effects = program.op_effects(query.op);
        if let ModRefTarget::Op(target) = query.target {
            if !program.touches_memory(target) {
                return ModuleAnswer::certain(ModRef::NoModRef);
            }
        }
        ModuleAnswer::certain(ModRef::from_effects(effects.reads, effects.writes))
    }
}
