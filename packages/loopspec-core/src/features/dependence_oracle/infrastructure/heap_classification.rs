//! Heap-classification oracle
//!
//! Reads the per-loop heap assignment. Accesses are separable when
//! - both only touch read-only objects
//! - they touch objects of different classes
//! - the query is loop-carried and one side only touches iteration-local or
//!   private objects

use super::{known_targets, target_access};
use crate::features::dependence_oracle::domain::{
    AliasQuery, AliasResult, ModRef, ModRefQuery, ModuleAnswer,
};
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};
use crate::shared::constants::oracle_costs;
use crate::shared::models::{HeapClass, LoopId, MemAccess, ProgramContext};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct HeapClassificationModule;

impl HeapClassificationModule {
    /// Classes of every object an access may touch; `None` if any object is
    /// unknown or unclassified
    fn classes(cx: ProgramContext<'_>, loop_id: LoopId, access: MemAccess) -> Option<BTreeSet<HeapClass>> {
        known_targets(cx.program, access)?
            .iter()
            .map(|obj| cx.heap.class_of(loop_id, *obj))
            .collect()
    }

    pub fn separated(
        cx: ProgramContext<'_>,
        loop_id: LoopId,
        a: MemAccess,
        b: MemAccess,
        loop_carried: bool,
    ) -> bool {
        let (Some(ca), Some(cb)) = (
            Self::classes(cx, loop_id, a),
            Self::classes(cx, loop_id, b),
        ) else {
            return false;
        };
        fn read_only(set: &BTreeSet<HeapClass>) -> bool {
            set.iter().all(|c| *c == HeapClass::ReadOnly)
        }
        fn iteration_private(set: &BTreeSet<HeapClass>) -> bool {
            set.iter()
                .all(|c| matches!(c, HeapClass::Local | HeapClass::Private))
        }

        if read_only(&ca) && read_only(&cb) {
            return true;
        }
        if ca.is_disjoint(&cb) {
            return true;
        }
        loop_carried && (iteration_private(&ca) || iteration_private(&cb))
    }
}

impl OracleModule for HeapClassificationModule {
    fn name(&self) -> &'static str {
        "heap_classification"
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        let program = cx.program.program;
        let Some(loop_id) = query.loop_id else {
            return ModuleAnswer::certain(ModRef::ModRef);
        };
        let (Some(a), Some(b)) = (
            program.op(query.op).direct_access(),
            target_access(program, query.target),
        ) else {
            return ModuleAnswer::certain(ModRef::ModRef);
        };
        if Self::separated(cx.program, loop_id, a, b, query.is_loop_carried()) {
            ModuleAnswer::speculative(ModRef::NoModRef, oracle_costs::HEAP_CLASSIFICATION)
        } else {
            ModuleAnswer::certain(ModRef::ModRef)
        }
    }

    fn alias(&self, query: &AliasQuery, cx: &QueryContext<'_>) -> ModuleAnswer<AliasResult> {
        let separated = query.loop_id.is_some_and(|l| {
            Self::separated(cx.program, l, query.a, query.b, query.rel.is_loop_carried())
        });
        if separated {
            ModuleAnswer::speculative(AliasResult::NoAlias, oracle_costs::HEAP_CLASSIFICATION)
        } else {
            ModuleAnswer::certain(AliasResult::MayAlias)
        }
    }
}
