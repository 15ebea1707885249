//! Points-to oracle
//!
//! Two accesses cannot overlap when their pointers address disjoint object
//! sets, or the same single object at constant, non-overlapping offsets. The
//! same pointer value with equal size must-aliases itself, but only within
//! one iteration: across iterations the value may have moved.

use super::{known_targets, target_access};
use crate::features::dependence_oracle::domain::{
    AliasQuery, AliasResult, ModRef, ModRefQuery, ModRefTarget, ModuleAnswer,
    SchedulingPreference, TemporalRelation,
};
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};
use crate::shared::models::{MemAccess, Program};

#[derive(Debug, Default)]
pub struct PointsToModule;

impl PointsToModule {
    pub fn alias_accesses(
        program: &Program,
        a: MemAccess,
        rel: TemporalRelation,
        b: MemAccess,
    ) -> AliasResult {
        if a.ptr == b.ptr && rel == TemporalRelation::Same && a.size == b.size {
            return AliasResult::MustAlias;
        }
        let (Some(ta), Some(tb)) = (known_targets(program, a), known_targets(program, b)) else {
            return AliasResult::MayAlias;
        };
        if ta.iter().all(|o| !tb.contains(o)) {
            return AliasResult::NoAlias;
        }
        if ta.len() == 1 && ta == tb {
            let (oa, ob) = (program.pointer(a.ptr).offset, program.pointer(b.ptr).offset);
            if let (Some(oa), Some(ob)) = (oa, ob) {
                let (sa, sb) = (a.size as i64, b.size as i64);
                if oa + sa <= ob || ob + sb <= oa {
                    return AliasResult::NoAlias;
                }
                if rel == TemporalRelation::Same && oa == ob && sa == sb {
                    return AliasResult::MustAlias;
                }
            }
        }
        AliasResult::MayAlias
    }
}

impl OracleModule for PointsToModule {
    fn name(&self) -> &'static str {
        "points_to"
    }

    fn preference(&self) -> SchedulingPreference {
        SchedulingPreference::TOP
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        let program = cx.program.program;
        if !program.touches_memory(query.op) {
            return ModuleAnswer::certain(ModRef::NoModRef);
        }
        if let ModRefTarget::Op(target) = query.target {
            if !program.touches_memory(target) {
                return ModuleAnswer::certain(ModRef::NoModRef);
            }
        }
        let (Some(a), Some(b)) = (
            program.op(query.op).direct_access(),
            target_access(program, query.target),
        ) else {
            return ModuleAnswer::certain(ModRef::ModRef);
        };
        match Self::alias_accesses(program, a, query.rel, b) {
            AliasResult::NoAlias => ModuleAnswer::certain(ModRef::NoModRef),
            _ => {
                let e = program.op_effects(query.op);
                ModuleAnswer::certain(ModRef::from_effects(e.reads, e.writes))
            }
        }
    }

    fn alias(&self, query: &AliasQuery, cx: &QueryContext<'_>) -> ModuleAnswer<AliasResult> {
        ModuleAnswer::certain(Self::alias_accesses(
            cx.program.program,
            query.a,
            query.rel,
            query.b,
        ))
    }
}
