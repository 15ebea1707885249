//! Partitioning ports
//!
//! - `PerformanceEstimator`: operation weights every critic and the loop
//!   fission remediator reason with
//! - `Critic`: one partitioning policy

use crate::config::{CriticKind, PartitioningConfig};
use crate::features::partitioning::domain::{index_stages, stages_respect, ParallelizationPlan, Stage};
use crate::features::pdg::{
    Condensation, Criticisms, DepKind, Dependence, ProgramDependenceGraph, Scc,
};
use crate::shared::constants::cost_model::FIXED_POINT;
use crate::shared::models::{LoopId, OpId, Program, ProgramContext};
use tracing::debug;

/// Relative cost of operations
pub trait PerformanceEstimator {
    fn op_weight(&self, program: &Program, op: OpId) -> u64;

    fn weight_of(&self, program: &Program, ops: &mut dyn Iterator<Item = OpId>) -> u64 {
        ops.fold(0u64, |acc, op| acc.saturating_add(self.op_weight(program, op)))
    }

    fn loop_weight(&self, program: &Program, loop_id: LoopId) -> u64 {
        self.weight_of(program, &mut program.loop_ops(loop_id))
    }

    /// Weight of the slowest stage: a parallel stage divides its own
    /// operations among its workers, replicated copies are paid in full
    fn pipeline_weight(&self, program: &Program, stages: &[Stage]) -> u64 {
        stages
            .iter()
            .map(|stage| {
                let own = self.weight_of(program, &mut stage.ops.iter().copied());
                let own = if stage.parallel_factor > 1 {
                    own.div_ceil(u64::from(stage.parallel_factor))
                } else {
                    own
                };
                own.saturating_add(self.weight_of(program, &mut stage.replicated.iter().copied()))
            })
            .max()
            .unwrap_or(0)
    }
}

/// Inputs of one critic run
pub struct CriticInput<'a> {
    pub program: ProgramContext<'a>,
    pub loop_id: LoopId,
    /// Dependence graph with removability marks
    pub pdg: &'a ProgramDependenceGraph,
    pub estimator: &'a dyn PerformanceEstimator,
    pub config: &'a PartitioningConfig,
}

impl CriticInput<'_> {
    /// Dependences the critic has to honor at all (anti and output ones
    /// can be configured away)
    pub fn considers(&self, dep: &Dependence) -> bool {
        !(self.config.ignore_anti_output && matches!(dep.kind, DepKind::Anti | DepKind::Output))
    }

    pub fn op_weight(&self, op: OpId) -> u64 {
        self.estimator.op_weight(self.program.program, op)
    }

    /// Fixed-point weight of a set of operations
    pub fn weight_of<'o>(&self, ops: impl IntoIterator<Item = &'o OpId>) -> u64 {
        ops.into_iter()
            .fold(0u64, |acc, op| acc.saturating_add(self.op_weight(*op)))
            .saturating_mul(FIXED_POINT)
    }

    pub fn scc_weight(&self, scc: &Scc) -> u64 {
        self.weight_of(&scc.ops)
    }

    /// Condensation over the dependences no remediator can remove
    pub fn optimistic_condensation(&self) -> Condensation {
        Condensation::with_filter(self.pdg, |d| self.considers(d) && !self.pdg.is_removable(d))
    }

    /// Dependences the stages do not respect, as criticisms; `None` when one
    /// of them cannot be removed
    pub fn criticisms_for(&self, stages: &[Stage]) -> Option<Criticisms> {
        let index = index_stages(stages);
        let mut criticisms = Criticisms::new();
        for dep in self.pdg.internal_dependences() {
            if !self.considers(&dep) || stages_respect(stages, &index, &dep) {
                continue;
            }
            if !self.pdg.is_removable(&dep) {
                debug!(dep = %dep, "partition violates a non-removable dependence");
                return None;
            }
            criticisms.insert(dep);
        }
        Some(criticisms)
    }
}

/// One partitioning policy
pub trait Critic {
    fn kind(&self) -> CriticKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Stages for the loop and the criticisms they rely on removing; `None`
    /// when the policy finds no valid plan
    fn critique(&self, input: &CriticInput<'_>) -> Option<ParallelizationPlan>;
}
