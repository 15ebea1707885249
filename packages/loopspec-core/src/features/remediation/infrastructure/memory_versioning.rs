//! Memory versioning
//!
//! Each worker runs in its own copy of memory, so a loop-carried
//! write-after-read cannot be observed. Write-after-write would be handled
//! the same way, but merging the last writer back is not supported by code
//! generation: that remedy is computed and then withheld.

use crate::config::RemediatorKind;
use crate::features::pdg::DepKind;
use crate::features::remediation::domain::{Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::constants::remedy_costs;
use crate::shared::models::OpId;
use tracing::trace;

#[derive(Debug, Default)]
pub struct MemoryVersioningRemediator;

impl Remediator for MemoryVersioningRemediator {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::MemoryVersioning
    }

    fn memdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        kind: DepKind,
        _cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        if !loop_carried {
            return RemedyResponse::dependent();
        }
        let remedy = Remedy::new(
            RemediatorKind::MemoryVersioning,
            remedy_costs::MEMORY_VERSIONING,
            RemedyPayload::MemoryVersioning { src: a, dst: b },
        );
        match kind {
            DepKind::Anti => RemedyResponse::removed(remedy),
            DepKind::Output => {
                trace!(src = %a, dst = %b, "write-after-write versioning withheld");
                RemedyResponse::suppressed(remedy)
            }
            _ => RemedyResponse::dependent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pdg::Dependence;
    use crate::features::remediation::infrastructure::test_support::*;
    use crate::shared::fixtures::{streaming_loop, Inputs};

    #[test]
    fn test_only_carried_war_is_removed() {
        let p = streaming_loop();
        let inputs = Inputs::default();
        let ctx = inputs.context(&p);
        let pdg = built_pdg(ctx);
        let config = Default::default();
        let cx = context(ctx, &pdg, &config);
        let remed = MemoryVersioningRemediator;
        let dep = |kind, lc| Dependence::new(OpId(4), OpId(5), kind, lc);

        assert!(remed.remediate(&dep(DepKind::Anti, true), &cx).is_removed());
        assert!(!remed.remediate(&dep(DepKind::Anti, false), &cx).is_removed());
        assert!(!remed.remediate(&dep(DepKind::Flow, true), &cx).is_removed());

        let waw = remed.remediate(&dep(DepKind::Output, true), &cx);
        assert!(waw.dependent);
        assert_eq!(waw.remedy.map(|r| r.cost), Some(0));

        let criticisms = [dep(DepKind::Output, true)].into_iter().collect();
        assert!(remed.satisfy(&cx, &criticisms).is_empty());
    }
}
