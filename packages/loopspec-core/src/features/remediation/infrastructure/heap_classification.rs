//! Heap classification
//!
//! Accesses are classified by the heap class their pointer targets share in
//! the loop. Separation checks make accesses to different classes
//! independent, read-only objects never carry a dependence, and private,
//! local or reduction objects carry none across iterations. Private and
//! local accesses pay for the extra instrumentation they need.

use crate::config::RemediatorKind;
use crate::features::pdg::DepKind;
use crate::features::remediation::domain::{Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::constants::remedy_costs;
use crate::shared::models::{HeapClass, LoopId, OpId, ProgramContext};

#[derive(Debug, Default)]
pub struct HeapClassificationRemediator;

impl HeapClassificationRemediator {
    /// Common class of every object the access may touch
    fn class_of(ctx: ProgramContext<'_>, loop_id: LoopId, op: OpId) -> Option<HeapClass> {
        let access = ctx.program.op(op).direct_access()?;
        let pointer = ctx.program.pointer(access.ptr);
        if pointer.is_unknown() {
            return None;
        }
        let mut classes = pointer
            .targets
            .iter()
            .map(|obj| ctx.heap.class_of(loop_id, *obj));
        let first = classes.next()??;
        classes.all(|c| c == Some(first)).then_some(first)
    }

    fn remedy(cost: u64, private: Option<OpId>, local: Option<OpId>) -> Remedy {
        Remedy::new(
            RemediatorKind::HeapClassification,
            cost,
            RemedyPayload::HeapClassification { private, local },
        )
    }
}

impl Remediator for HeapClassificationRemediator {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::HeapClassification
    }

    fn memdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        _kind: DepKind,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        let (Some(t1), Some(t2)) = (
            Self::class_of(cx.program, cx.loop_id, a),
            Self::class_of(cx.program, cx.loop_id, b),
        ) else {
            return RemedyResponse::dependent();
        };

        if t1 == HeapClass::ReadOnly || t2 == HeapClass::ReadOnly || t1 != t2 {
            return RemedyResponse::removed(Self::remedy(remedy_costs::HEAP_SEPARATION, None, None));
        }
        if !loop_carried {
            return RemedyResponse::dependent();
        }
        match t1 {
            HeapClass::Private => RemedyResponse::removed(Self::remedy(
                remedy_costs::HEAP_SEPARATION + remedy_costs::PRIVATE_ACCESS,
                Some(a),
                None,
            )),
            HeapClass::Local => RemedyResponse::removed(Self::remedy(
                remedy_costs::HEAP_SEPARATION + remedy_costs::LOCAL_ACCESS,
                None,
                Some(a),
            )),
            HeapClass::Reduction(_) => {
                RemedyResponse::removed(Self::remedy(remedy_costs::HEAP_SEPARATION, None, None))
            }
            HeapClass::ReadOnly | HeapClass::Shared => RemedyResponse::dependent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pdg::Dependence;
    use crate::features::remediation::infrastructure::test_support::*;
    use crate::shared::fixtures::{streaming_loop, Inputs};
    use crate::shared::models::{HeapAssignment, ObjectId};

    fn response(heap: HeapAssignment, dep: Dependence) -> RemedyResponse {
        let p = streaming_loop();
        let inputs = Inputs {
            heap,
            ..Inputs::default()
        };
        let ctx = inputs.context(&p);
        let pdg = built_pdg(ctx);
        let config = Default::default();
        let cx = context(ctx, &pdg, &config);
        HeapClassificationRemediator.remediate(&dep, &cx)
    }

    fn classified(obj1: HeapClass) -> HeapAssignment {
        HeapAssignment::new()
            .with(LoopId(0), ObjectId(0), HeapClass::ReadOnly)
            .with(LoopId(0), ObjectId(1), obj1)
    }

    #[test]
    fn test_private_store_pays_for_instrumentation() {
        let waw = Dependence::new(OpId(5), OpId(5), DepKind::Output, true);
        let r = response(classified(HeapClass::Private), waw);
        assert!(r.is_removed());
        let remedy = r.remedy.unwrap();
        assert_eq!(remedy.cost, 140);
        assert_eq!(
            remedy.payload,
            RemedyPayload::HeapClassification {
                private: Some(OpId(5)),
                local: None
            }
        );
    }

    #[test]
    fn test_read_only_and_separated_classes() {
        let war = Dependence::new(OpId(4), OpId(5), DepKind::Anti, false);
        let r = response(classified(HeapClass::Shared), war);
        assert_eq!(r.remedy.map(|r| r.cost), Some(40));
    }

    #[test]
    fn test_shared_and_unclassified_stay_dependent() {
        let waw = Dependence::new(OpId(5), OpId(5), DepKind::Output, true);
        assert!(!response(classified(HeapClass::Shared), waw).is_removed());
        assert!(!response(HeapAssignment::new(), waw).is_removed());
        let intra = Dependence::new(OpId(5), OpId(5), DepKind::Output, false);
        assert!(!response(classified(HeapClass::Private), intra).is_removed());
    }
}
