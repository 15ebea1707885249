//! Late-inlining opportunities in an accepted strategy

use crate::features::orchestration::LoopStrategy;
use crate::features::partitioning::{PerformanceEstimator, Stage};
use crate::features::selection::domain::InliningOpportunity;
use crate::shared::models::{Callee, LoopId, OpId, Program};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Call sites with an internal callee in the strategy's non-parallel
/// stages, each weighing at least `min_coverage_percent` of its stage
pub fn find_opportunities(
    program: &Program,
    loop_id: LoopId,
    strategy: &LoopStrategy,
    estimator: &dyn PerformanceEstimator,
    min_coverage_percent: u32,
    found: &mut Vec<InliningOpportunity>,
) {
    let mut seen: FxHashSet<OpId> = found.iter().map(|o| o.call_site).collect();
    for stage in strategy.plan.stages.iter().filter(|s| !s.is_parallel()) {
        let stage_weight = stage_weight(program, stage, estimator);
        for op in stage.replicated.iter().chain(stage.ops.iter()) {
            let Some(Callee::Internal { function }) = program.op(*op).callee() else {
                continue;
            };
            if program.function(*function).blocks.is_empty() || seen.contains(op) {
                continue;
            }
            let weight = estimator.op_weight(program, *op);
            let covered = u128::from(weight) * 100
                >= u128::from(stage_weight) * u128::from(min_coverage_percent);
            if !covered {
                continue;
            }
            debug!(
                loop_name = %program.loop_name(loop_id),
                call_site = %op,
                weight,
                stage_weight,
                "recommended for late inlining"
            );
            seen.insert(*op);
            found.push(InliningOpportunity {
                loop_id,
                call_site: *op,
                callee: *function,
                weight,
                stage_weight,
            });
        }
    }
}

fn stage_weight(program: &Program, stage: &Stage, estimator: &dyn PerformanceEstimator) -> u64 {
    estimator
        .weight_of(program, &mut stage.ops.iter().copied())
        .saturating_add(estimator.weight_of(program, &mut stage.replicated.iter().copied()))
}
