//! Reductions
//!
//! Workers accumulate into private copies that are combined after the
//! loop, so the loop-carried dependences of a reduction vanish: the update
//! edge of a register reduction declared by the host, and memory edges
//! between accesses to objects reduced with one operator.

use crate::config::RemediatorKind;
use crate::features::pdg::DepKind;
use crate::features::remediation::domain::{ReductionTarget, Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::constants::remedy_costs;
use crate::shared::models::{HeapClass, ObjectId, OpId, ReductionOperator};

#[derive(Debug, Default)]
pub struct ReductionRemediator;

impl ReductionRemediator {
    fn remedy(target: ReductionTarget) -> RemedyResponse {
        RemedyResponse::removed(Remedy::new(
            RemediatorKind::Reduction,
            remedy_costs::REDUCTION,
            RemedyPayload::Reduction { target },
        ))
    }

    /// Reduction operator shared by every object the access touches, and
    /// the first such object
    fn reduced(op: OpId, cx: &RemediationContext<'_>) -> Option<(ReductionOperator, ObjectId)> {
        let ctx = cx.program;
        let access = ctx.program.op(op).direct_access()?;
        let targets = &ctx.program.pointer(access.ptr).targets;
        let first = *targets.first()?;
        let mut operator = None;
        for obj in targets {
            let HeapClass::Reduction(found) = ctx.heap.class_of(cx.loop_id, *obj)? else {
                return None;
            };
            if operator.is_some_and(|seen| seen != found) {
                return None;
            }
            operator = Some(found);
        }
        operator.map(|found| (found, first))
    }
}

impl Remediator for ReductionRemediator {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::Reduction
    }

    fn memdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        _kind: DepKind,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        if !loop_carried {
            return RemedyResponse::dependent();
        }
        match (Self::reduced(a, cx), Self::reduced(b, cx)) {
            (Some((x, obj)), Some((y, _))) if x == y => Self::remedy(ReductionTarget::Object(obj)),
            _ => RemedyResponse::dependent(),
        }
    }

    fn regdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        if !loop_carried {
            return RemedyResponse::dependent();
        }
        let info = cx.program.program.loop_info(cx.loop_id);
        match info.reductions.iter().find(|r| r.update == a && r.phi == b) {
            Some(r) => Self::remedy(ReductionTarget::Register(r.phi)),
            None => RemedyResponse::dependent(),
        }
    }
}
