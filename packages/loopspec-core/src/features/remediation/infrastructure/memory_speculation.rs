//! Memory speculation
//!
//! Re-asks the speculative oracle chain whether a loop-carried memory
//! dependence can occur at all, and if not, validates the assumption at run
//! time with a conflict check. Expensive: the last resort of the
//! remediators. Intra-iteration dependences are never speculated.

use crate::config::{OracleConfig, RemediatorKind};
use crate::features::dependence_oracle::{build_chain, ModRefQuery, OracleChain, TemporalRelation};
use crate::features::pdg::DepKind;
use crate::features::remediation::domain::{Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::constants::remedy_costs;
use crate::shared::models::{OpId, ProgramContext};
use tracing::trace;

pub struct MemorySpeculationRemediator<'p> {
    chain: OracleChain<'p>,
}

impl<'p> MemorySpeculationRemediator<'p> {
    pub fn new(ctx: ProgramContext<'p>, oracle: &OracleConfig) -> Self {
        Self {
            chain: build_chain(ctx, oracle, true),
        }
    }
}

impl Remediator for MemorySpeculationRemediator<'_> {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::MemorySpeculation
    }

    fn memdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        kind: DepKind,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        if !loop_carried {
            return RemedyResponse::dependent();
        }
        let l = Some(cx.loop_id);
        let forward = self
            .chain
            .modref(&ModRefQuery::ops(a, TemporalRelation::Before, b, l))
            .result;
        let reverse = self
            .chain
            .modref(&ModRefQuery::ops(b, TemporalRelation::After, a, l))
            .result;
        let absent = match kind {
            DepKind::Flow => !forward.is_mod() || !reverse.is_ref(),
            DepKind::Anti => !forward.is_ref() || !reverse.is_mod(),
            DepKind::Output => !forward.is_mod() || !reverse.is_mod(),
            DepKind::Register | DepKind::Control => false,
        };
        trace!(src = %a, dst = %b, kind = kind.as_str(), ?forward, ?reverse, absent, "memory speculation");
        if !absent {
            return RemedyResponse::dependent();
        }
        RemedyResponse::removed(Remedy::new(
            RemediatorKind::MemorySpeculation,
            remedy_costs::MEMORY_SPECULATION,
            RemedyPayload::MemorySpeculation { src: a, dst: b },
        ))
    }
}
