//! Per-loop planning phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the orchestrator is with one loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningPhase {
    /// Dependence graph built and removability marked
    BuildPdg,
    RunCritics,
    /// Criticisms of every candidate looked up in the remedy catalog
    PriceCriticisms,
    SelectRemedies,
    Evaluate,
    Done,
    Rejected,
}

impl PlanningPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PlanningPhase::Done | PlanningPhase::Rejected)
    }

    /// Phase reached when the current one succeeds
    pub fn next(self) -> PlanningPhase {
        match self {
            PlanningPhase::BuildPdg => PlanningPhase::RunCritics,
            PlanningPhase::RunCritics => PlanningPhase::PriceCriticisms,
            PlanningPhase::PriceCriticisms => PlanningPhase::SelectRemedies,
            PlanningPhase::SelectRemedies => PlanningPhase::Evaluate,
            PlanningPhase::Evaluate | PlanningPhase::Done => PlanningPhase::Done,
            PlanningPhase::Rejected => PlanningPhase::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanningPhase::BuildPdg => "build_pdg",
            PlanningPhase::RunCritics => "run_critics",
            PlanningPhase::PriceCriticisms => "price_criticisms",
            PlanningPhase::SelectRemedies => "select_remedies",
            PlanningPhase::Evaluate => "evaluate",
            PlanningPhase::Done => "done",
            PlanningPhase::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PlanningPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a loop is not parallelized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Every critic declined
    NoPlan,
    /// Some criticism of every plan has no remedy
    UncoveredCriticisms,
    /// No covered plan beats sequential execution
    NoSpeedup,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoPlan => write!(f, "no critic produced a plan"),
            RejectReason::UncoveredCriticisms => write!(f, "criticisms left without remedy"),
            RejectReason::NoSpeedup => write!(f, "no expected speedup"),
        }
    }
}
