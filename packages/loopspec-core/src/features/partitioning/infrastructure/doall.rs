//! Independent-iteration critic
//!
//! The whole loop becomes one parallel stage. Every loop-carried dependence
//! has to go: removable ones are criticized, a single non-removable one
//! rejects the loop.

use crate::config::CriticKind;
use crate::features::partitioning::domain::{ParallelizationPlan, Stage};
use crate::features::partitioning::ports::{Critic, CriticInput};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct DoallCritic;

impl Critic for DoallCritic {
    fn kind(&self) -> CriticKind {
        CriticKind::Doall
    }

    fn critique(&self, input: &CriticInput<'_>) -> Option<ParallelizationPlan> {
        let optimistic = input.optimistic_condensation();
        if optimistic.has_loop_carried() {
            debug!(critic = self.name(), "non-removable loop-carried dependence");
            return None;
        }
        let stages = vec![Stage::parallel(
            input.pdg.internal_ops(),
            input.config.thread_budget,
        )];
        let criticisms = input.criticisms_for(&stages)?;
        debug!(critic = self.name(), criticisms = criticisms.len(), "parallel loop");
        Some(ParallelizationPlan::new(self.kind(), stages, criticisms))
    }
}
