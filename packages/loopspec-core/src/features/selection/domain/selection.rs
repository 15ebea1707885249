//! Outcome of whole-program loop selection

use super::compatibility::Incompatibility;
use crate::features::orchestration::{LoopReport, LoopStrategy};
use crate::shared::models::{ExecutionProfile, FunctionId, LoopId, OpId, Program};
use serde::Serialize;

/// Heavy call site in a sequential stage that inlining might open up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InliningOpportunity {
    pub loop_id: LoopId,
    pub call_site: OpId,
    pub callee: FunctionId,
    pub weight: u64,
    /// Weight of the stage the call site runs in
    pub stage_weight: u64,
}

/// Program rewritten by late inlining, with the profile carried over to
/// the cloned operations and blocks
#[derive(Debug, Clone)]
pub struct InlinedProgram {
    pub program: Program,
    pub profile: ExecutionProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopSelection {
    /// Planning rounds run, late inlining between consecutive ones
    pub rounds: u32,
    /// Loops hot enough to plan, in the last round
    pub candidates: Vec<LoopId>,
    pub reports: Vec<LoopReport>,
    /// Pairs of accepted loops that cannot be parallelized together
    pub incompatible: Vec<Incompatibility>,
    pub selected: Vec<LoopId>,
    /// Sum of the selected loops' net savings
    pub total_saving: u64,
    /// Whole-program speedup the selection is expected to give
    pub expected_speedup: f64,
    pub inlined: Vec<InliningOpportunity>,
    /// Program after late inlining; absent when nothing was inlined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<Program>,
    /// Profile of `program`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ExecutionProfile>,
}

impl LoopSelection {
    pub fn empty() -> Self {
        Self {
            rounds: 0,
            candidates: Vec::new(),
            reports: Vec::new(),
            incompatible: Vec::new(),
            selected: Vec::new(),
            total_saving: 0,
            expected_speedup: 1.0,
            inlined: Vec::new(),
            program: None,
            profile: None,
        }
    }

    pub fn is_selected(&self, loop_id: LoopId) -> bool {
        self.selected.contains(&loop_id)
    }

    pub fn report(&self, loop_id: LoopId) -> Option<&LoopReport> {
        self.reports.iter().find(|r| r.loop_id == loop_id)
    }

    /// Strategies of the selected loops, in selection order
    pub fn strategies(&self) -> impl Iterator<Item = (LoopId, &LoopStrategy)> + '_ {
        self.selected
            .iter()
            .filter_map(|id| Some((*id, self.report(*id)?.strategy()?)))
    }
}
