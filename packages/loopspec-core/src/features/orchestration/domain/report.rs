//! What the orchestrator reports for one loop

use super::phase::{PlanningPhase, RejectReason};
use crate::config::{CriticKind, RemediatorKind};
use crate::features::dependence_oracle::ModuleStats;
use crate::features::partitioning::ParallelizationPlan;
use crate::features::pdg::infrastructure::PdgStats;
use crate::features::pdg::PdgBuildStats;
use crate::features::remediation::{CatalogEntry, RemediatorStats, RemedySelection};
use crate::shared::models::LoopId;
use serde::Serialize;
use std::collections::BTreeMap;

/// A plan whose criticisms are all covered by the selected remedies
#[derive(Debug, Clone, Serialize)]
pub struct LoopStrategy {
    pub plan: ParallelizationPlan,
    pub remedies: RemedySelection,
    /// Expected saving once the remedies are paid for
    pub net_saving: u64,
}

impl LoopStrategy {
    pub fn critic(&self) -> CriticKind {
        self.plan.critic
    }

    pub fn expected_speedup(&self) -> f64 {
        self.plan.expected_speedup
    }
}

/// One critic's plan as it went through pricing
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub critic: CriticKind,
    pub stages: usize,
    pub criticisms: usize,
    pub expected_saving: u64,
    pub expected_speedup: f64,
    /// `None` when some criticism has no remedy
    pub remedy_cost: Option<u64>,
    pub net_saving: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum LoopOutcome {
    Accepted { strategy: LoopStrategy },
    Rejected { reason: RejectReason },
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopReport {
    pub loop_id: LoopId,
    pub loop_name: String,
    /// Estimated sequential weight of one iteration
    pub loop_weight: u64,
    pub outcome: LoopOutcome,
    /// Phases visited, the terminal one last
    pub phases: Vec<PlanningPhase>,
    pub candidates: Vec<CandidateSummary>,
    pub pdg: PdgStats,
    pub build: PdgBuildStats,
    pub oracle: Vec<ModuleStats>,
    pub remediators: Vec<RemediatorStats>,
    /// Every removable dependence with all its remedy alternatives
    pub catalog: Vec<CatalogEntry>,
    /// Selected remedies per remediator, over the accepted strategy
    pub remediator_selection_count: BTreeMap<RemediatorKind, u64>,
}

impl LoopReport {
    /// Report of a loop nothing has been tried on yet
    pub fn new(loop_id: LoopId, loop_name: String, loop_weight: u64) -> Self {
        Self {
            loop_id,
            loop_name,
            loop_weight,
            outcome: LoopOutcome::Rejected {
                reason: RejectReason::NoPlan,
            },
            phases: Vec::new(),
            candidates: Vec::new(),
            pdg: PdgStats::default(),
            build: PdgBuildStats::default(),
            oracle: Vec::new(),
            remediators: Vec::new(),
            catalog: Vec::new(),
            remediator_selection_count: BTreeMap::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, LoopOutcome::Accepted { .. })
    }

    pub fn strategy(&self) -> Option<&LoopStrategy> {
        match &self.outcome {
            LoopOutcome::Accepted { strategy } => Some(strategy),
            LoopOutcome::Rejected { .. } => None,
        }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self.outcome {
            LoopOutcome::Accepted { .. } => None,
            LoopOutcome::Rejected { reason } => Some(reason),
        }
    }

    /// Terminal phase
    pub fn phase(&self) -> PlanningPhase {
        self.phases.last().copied().unwrap_or(PlanningPhase::BuildPdg)
    }

    /// Net saving of the accepted strategy, 0 when rejected
    pub fn expected_saving(&self) -> u64 {
        self.strategy().map_or(0, |s| s.net_saving)
    }
}
