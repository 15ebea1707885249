//! Loop fission
//!
//! A loop-carried register or control dependence `a -> b` disappears from
//! the parallel part of the loop when everything `a` needs can run ahead in
//! a sequential prefix. The prefix is the backward closure of `a`'s
//! component over the condensation of non-removable dependences. It is
//! acceptable when it:
//! - stays within `loop_fission_max_sccs` components
//! - performs no memory write (it is replayed, not communicated)
//! - does not contain `b`
//! - weighs less than `loop_fission_max_weight_percent` of the loop
//!
//! Removable dependences entering the prefix from the rest of the loop must
//! be removed as well; the remedy lists them as requirements.

use crate::config::RemediatorKind;
use crate::features::pdg::{Condensation, Criticisms, DepKind};
use crate::features::remediation::domain::{Remedies, Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::constants::remedy_costs;
use crate::shared::models::OpId;
use rustc_hash::FxHashSet;
use std::collections::{BTreeSet, VecDeque};
use tracing::trace;

#[derive(Debug, Default)]
pub struct LoopFissionRemediator;

impl LoopFissionRemediator {
    fn condensation(cx: &RemediationContext<'_>) -> Condensation {
        Condensation::with_filter(cx.pdg, |dep| !cx.pdg.is_removable(dep))
    }

    /// Components `a` transitively depends on, `None` past the bound
    fn closure(a: OpId, cond: &Condensation, max_sccs: usize) -> Option<BTreeSet<OpId>> {
        let start = cond.scc_of(a)?;
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([start]);
        let mut ops = BTreeSet::new();
        while let Some(scc) = queue.pop_front() {
            if !seen.insert(scc) {
                continue;
            }
            if seen.len() > max_sccs {
                return None;
            }
            ops.extend(cond.scc(scc).ops.iter().copied());
            queue.extend(cond.predecessors(scc));
        }
        Some(ops)
    }

    fn fission(
        &self,
        a: OpId,
        b: OpId,
        cond: &Condensation,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        let program = cx.program.program;
        let Some(prefix) = Self::closure(a, cond, cx.config.loop_fission_max_sccs) else {
            trace!(src = %a, "fission closure exceeds bound");
            return RemedyResponse::dependent();
        };
        if prefix.contains(&b) || prefix.iter().any(|op| program.may_write_memory(*op)) {
            return RemedyResponse::dependent();
        }

        let weight = cx.estimator.weight_of(program, &mut prefix.iter().copied());
        let loop_weight = cx.estimator.loop_weight(program, cx.loop_id);
        let limit = u64::from(cx.config.loop_fission_max_weight_percent).saturating_mul(loop_weight);
        if weight.saturating_mul(100) >= limit {
            trace!(src = %a, weight, loop_weight, "fission prefix too heavy");
            return RemedyResponse::dependent();
        }

        let requires: Vec<_> = prefix
            .iter()
            .flat_map(|op| cx.pdg.incoming(*op))
            .filter(|d| cx.pdg.is_internal(d.src) && !prefix.contains(&d.src))
            .filter(|d| cx.pdg.is_removable(d))
            .collect();

        let remedy = Remedy::new(
            RemediatorKind::LoopFission,
            remedy_costs::LOOP_FISSION,
            RemedyPayload::LoopFission {
                produce: a,
                replicated: prefix,
            },
        )
        .requiring(requires);
        RemedyResponse::removed(remedy)
    }

    fn carried(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        if !loop_carried {
            return RemedyResponse::dependent();
        }
        self.fission(a, b, &Self::condensation(cx), cx)
    }
}

impl Remediator for LoopFissionRemediator {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::LoopFission
    }

    fn needs_removability(&self) -> bool {
        true
    }

    fn regdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        self.carried(a, b, loop_carried, cx)
    }

    fn ctrldep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        self.carried(a, b, loop_carried, cx)
    }

    /// One condensation for the whole batch
    fn satisfy(&self, cx: &RemediationContext<'_>, criticisms: &Criticisms) -> Remedies {
        let cond = Self::condensation(cx);
        let mut remedies = Remedies::new();
        for c in criticisms {
            if !c.loop_carried || !matches!(c.kind, DepKind::Register | DepKind::Control) {
                continue;
            }
            if let RemedyResponse {
                dependent: false,
                remedy: Some(remedy),
            } = self.fission(c.src, c.dst, &cond, cx)
            {
                remedies.insert(remedy.resolving(*c));
            }
        }
        remedies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemediationConfig;
    use crate::features::pdg::{Dependence, ProgramDependenceGraph};
    use crate::features::remediation::infrastructure::test_support::*;
    use crate::shared::fixtures::{streaming_loop, Inputs};

    /// Induction edges and exit control already removable, as counted-IV
    /// remediation leaves them
    fn marked(mut pdg: ProgramDependenceGraph) -> ProgramDependenceGraph {
        let deps: Vec<_> = pdg.dependences().collect();
        for d in deps {
            let iv_back = d == Dependence::new(OpId(7), OpId(2), DepKind::Register, true);
            if d.kind == DepKind::Control || iv_back {
                pdg.mark_removable(d, 0);
            }
        }
        pdg
    }

    #[test]
    fn test_exit_branch_prefix_is_replicated() {
        let p = streaming_loop();
        let inputs = Inputs::default();
        let ctx = inputs.context(&p);
        let pdg = marked(built_pdg(ctx));
        let config = RemediationConfig::default().loop_fission_max_weight_percent(50);
        let cx = context(ctx, &pdg, &config);
        let remed = LoopFissionRemediator;

        let exit_to_store = Dependence::new(OpId(8), OpId(5), DepKind::Control, true);
        let response = remed.remediate(&exit_to_store, &cx);
        assert!(response.is_removed());
        let remedy = response.remedy.unwrap();
        assert_eq!(
            remedy.payload,
            RemedyPayload::LoopFission {
                produce: OpId(8),
                replicated: [OpId(2), OpId(7), OpId(8)].into_iter().collect(),
            }
        );
        assert!(remedy.requires.is_empty());

        // the reduction consumes its own update
        let sum = Dependence::new(OpId(6), OpId(3), DepKind::Register, true);
        assert!(!remed.remediate(&sum, &cx).is_removed());
        // intra-iteration edges are never split this way
        let intra = Dependence::new(OpId(7), OpId(8), DepKind::Register, false);
        assert!(!remed.remediate(&intra, &cx).is_removed());
    }

    #[test]
    fn test_heavy_prefix_rejected() {
        let p = streaming_loop();
        let inputs = Inputs::default();
        let ctx = inputs.context(&p);
        let pdg = marked(built_pdg(ctx));
        let config = RemediationConfig::default();
        let cx = context(ctx, &pdg, &config);

        let exit_to_store = Dependence::new(OpId(8), OpId(5), DepKind::Control, true);
        let criticisms = [exit_to_store].into_iter().collect();
        assert!(LoopFissionRemediator.satisfy(&cx, &criticisms).is_empty());
    }
}
