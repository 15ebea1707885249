//! Value prediction
//!
//! A loop-carried value the profile found invariant across iterations is
//! replaced by its predicted value plus a check. Applies to header phis
//! (register edges) and to loads (memory flow edges).

use crate::config::RemediatorKind;
use crate::features::pdg::DepKind;
use crate::features::remediation::domain::{Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::constants::remedy_costs;
use crate::shared::models::{OpId, OpKind};

#[derive(Debug, Default)]
pub struct ValuePredictionRemediator;

impl ValuePredictionRemediator {
    fn remedy(predicted: OpId) -> Remedy {
        Remedy::new(
            RemediatorKind::ValuePrediction,
            remedy_costs::VALUE_PREDICTION,
            RemedyPayload::ValuePrediction { predicted },
        )
    }
}

impl Remediator for ValuePredictionRemediator {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::ValuePrediction
    }

    fn memdep(
        &self,
        _a: OpId,
        b: OpId,
        loop_carried: bool,
        kind: DepKind,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        let is_load = matches!(cx.program.program.op(b).kind, OpKind::Load { .. });
        if loop_carried
            && kind == DepKind::Flow
            && is_load
            && cx.program.profile.is_predictable_load(cx.loop_id, b)
        {
            return RemedyResponse::removed(Self::remedy(b));
        }
        RemedyResponse::dependent()
    }

    fn regdep(
        &self,
        _a: OpId,
        b: OpId,
        loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        if loop_carried
            && cx.program.program.is_header_phi(cx.loop_id, b)
            && cx.program.profile.is_predictable_phi(cx.loop_id, b)
        {
            return RemedyResponse::removed(Self::remedy(b));
        }
        RemedyResponse::dependent()
    }
}
