//! Running the enabled critics over one loop

use super::speedup::evaluate;
use crate::config::CriticKind;
use crate::features::partitioning::domain::ParallelizationPlan;
use crate::features::partitioning::infrastructure::create_critic;
use crate::features::partitioning::ports::CriticInput;
use tracing::debug;

/// Every plan the critics in `kinds` produce, in the given order, with
/// forwarded dependences and expected saving filled in
pub fn run_critics(input: &CriticInput<'_>, kinds: &[CriticKind]) -> Vec<ParallelizationPlan> {
    let mut plans = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let critic = create_critic(*kind);
        let Some(mut plan) = critic.critique(input) else {
            debug!(critic = critic.name(), "critic declined");
            continue;
        };
        plan.record_cross_stage(input.pdg.internal_dependences());
        let estimate = evaluate(input, &mut plan);
        debug!(
            critic = critic.name(),
            stages = plan.stages.len(),
            criticisms = plan.criticisms.len(),
            saving = estimate.expected_saving,
            speedup = estimate.expected_speedup,
            "critic proposed a plan"
        );
        plans.push(plan);
    }
    plans
}
