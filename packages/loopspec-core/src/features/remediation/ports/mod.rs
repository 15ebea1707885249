//! Remediation ports
//!
//! A remediator is offered disputed dependences one at a time. For each it
//! either proves the dependence impossible under a named speculative
//! assumption (a `Remedy`) or abstains. Abstaining is the default for every
//! dependence kind.

use crate::config::{RemediationConfig, RemediatorKind};
use crate::features::partitioning::ports::PerformanceEstimator;
use crate::features::pdg::{Criticism, Criticisms, DepKind, ProgramDependenceGraph};
use crate::features::remediation::domain::{Remedies, Remedy};
use crate::shared::models::{LoopId, OpId, ProgramContext};

/// Inputs shared by every query about one loop
pub struct RemediationContext<'a> {
    pub program: ProgramContext<'a>,
    pub loop_id: LoopId,
    /// Dependence graph; removability marks of earlier remediators are
    /// visible to the ones that need them
    pub pdg: &'a ProgramDependenceGraph,
    pub estimator: &'a dyn PerformanceEstimator,
    pub config: &'a RemediationConfig,
}

/// Answer to one disputed dependence
#[derive(Debug, Clone)]
pub struct RemedyResponse {
    /// The dependence may still exist
    pub dependent: bool,
    /// The justification; present with `dependent == true` only when a
    /// remedy was computed but must not be used
    pub remedy: Option<Remedy>,
}

impl RemedyResponse {
    pub fn dependent() -> Self {
        Self {
            dependent: true,
            remedy: None,
        }
    }

    pub fn removed(remedy: Remedy) -> Self {
        Self {
            dependent: false,
            remedy: Some(remedy),
        }
    }

    /// Remedy computed but withheld
    pub fn suppressed(remedy: Remedy) -> Self {
        Self {
            dependent: true,
            remedy: Some(remedy),
        }
    }

    pub fn is_removed(&self) -> bool {
        !self.dependent && self.remedy.is_some()
    }
}

pub trait Remediator {
    fn kind(&self) -> RemediatorKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Remediators that reason about which dependences other remediators
    /// can remove run after those marks exist
    fn needs_removability(&self) -> bool {
        false
    }

    fn memdep(
        &self,
        _a: OpId,
        _b: OpId,
        _loop_carried: bool,
        _kind: DepKind,
        _cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        RemedyResponse::dependent()
    }

    fn regdep(
        &self,
        _a: OpId,
        _b: OpId,
        _loop_carried: bool,
        _cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        RemedyResponse::dependent()
    }

    fn ctrldep(
        &self,
        _a: OpId,
        _b: OpId,
        _loop_carried: bool,
        _cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        RemedyResponse::dependent()
    }

    /// Dispatch one criticism by kind
    fn remediate(&self, criticism: &Criticism, cx: &RemediationContext<'_>) -> RemedyResponse {
        let (a, b, lc) = (criticism.src, criticism.dst, criticism.loop_carried);
        match criticism.kind {
            DepKind::Register => self.regdep(a, b, lc, cx),
            DepKind::Control => self.ctrldep(a, b, lc, cx),
            kind => self.memdep(a, b, lc, kind, cx),
        }
    }

    /// Remedies for every criticism this remediator can remove. Equal
    /// remedies merge, so each returned remedy lists all criticisms it
    /// resolves.
    fn satisfy(&self, cx: &RemediationContext<'_>, criticisms: &Criticisms) -> Remedies {
        let mut remedies = Remedies::new();
        for criticism in criticisms {
            let response = self.remediate(criticism, cx);
            if response.dependent {
                continue;
            }
            if let Some(remedy) = response.remedy {
                remedies.insert(remedy.resolving(*criticism));
            }
        }
        remedies
    }
}
