//! Counted induction variables
//!
//! When the trip count is computable, every worker derives the induction
//! variable from its iteration number and evaluates the exit condition
//! locally. The carried edges of the induction cycle and the control
//! dependences of the exit branch it governs cost nothing to remove.

use crate::config::RemediatorKind;
use crate::features::pdg::{DepKind, Dependence};
use crate::features::remediation::domain::{Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::constants::remedy_costs;
use crate::shared::models::{InductionVariable, OpId};

#[derive(Debug, Default)]
pub struct CountedIvRemediator;

impl CountedIvRemediator {
    fn counted<'a>(cx: &RemediationContext<'a>) -> Option<&'a InductionVariable> {
        let iv = cx.program.program.loop_info(cx.loop_id).induction.as_ref()?;
        iv.exit_branch.is_some().then_some(iv)
    }

    fn remedy(phi: OpId) -> RemedyResponse {
        RemedyResponse::removed(Remedy::new(
            RemediatorKind::CountedIv,
            remedy_costs::COUNTED_IV,
            RemedyPayload::CountedIv { phi },
        ))
    }
}

impl Remediator for CountedIvRemediator {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::CountedIv
    }

    fn regdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        let Some(iv) = Self::counted(cx) else {
            return RemedyResponse::dependent();
        };
        if !loop_carried {
            return RemedyResponse::dependent();
        }
        // phi -> ... -> step over intra-iteration register edges
        let intra_reg = |d: &Dependence| d.kind == DepKind::Register && !d.loop_carried;
        let from_phi = cx.pdg.forward_slice(iv.phi, intra_reg);
        let to_step = cx.pdg.backward_slice(iv.step, intra_reg);
        let in_cycle = |op| from_phi.contains(&op) && to_step.contains(&op);
        if in_cycle(a) && in_cycle(b) {
            return Self::remedy(iv.phi);
        }
        RemedyResponse::dependent()
    }

    fn ctrldep(
        &self,
        a: OpId,
        _b: OpId,
        _loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        match Self::counted(cx) {
            Some(iv) if iv.exit_branch == Some(a) => Self::remedy(iv.phi),
            _ => RemedyResponse::dependent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::remediation::infrastructure::test_support::*;
    use crate::shared::fixtures::{streaming_loop, Inputs};

    #[test]
    fn test_induction_cycle_and_exit_control() {
        let p = streaming_loop();
        let inputs = Inputs::default();
        let ctx = inputs.context(&p);
        let pdg = built_pdg(ctx);
        let config = Default::default();
        let cx = context(ctx, &pdg, &config);
        let remed = CountedIvRemediator;

        let back = remed.remediate(&Dependence::new(OpId(7), OpId(2), DepKind::Register, true), &cx);
        assert_eq!(
            back.remedy.map(|r| (r.cost, r.payload)),
            Some((0, RemedyPayload::CountedIv { phi: OpId(2) }))
        );
        let sum = Dependence::new(OpId(6), OpId(3), DepKind::Register, true);
        assert!(!remed.remediate(&sum, &cx).is_removed());

        let exit = Dependence::new(OpId(8), OpId(5), DepKind::Control, true);
        assert!(remed.remediate(&exit, &cx).is_removed());
        let other = Dependence::new(OpId(4), OpId(5), DepKind::Control, false);
        assert!(!remed.remediate(&other, &cx).is_removed());
    }
}
