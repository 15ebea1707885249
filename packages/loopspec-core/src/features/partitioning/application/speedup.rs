//! Expected saving of a plan
//!
//! Weights are estimator units, scaled by `FIXED_POINT` before any
//! subtraction. Deeper loops pay `PENALIZE_LOOP_NEST` per level so that an
//! outer loop wins a tie against its inner loops. The weight saved is then
//! converted to profile time by `loop time / loop weight`.

use crate::features::partitioning::domain::{ParallelizationPlan, Stage};
use crate::features::partitioning::ports::{CriticInput, PerformanceEstimator};
use crate::shared::constants::cost_model::{FIXED_POINT, PENALIZE_LOOP_NEST};
use crate::shared::models::{LoopId, ProgramContext};
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedupEstimate {
    pub loop_weight: u64,
    pub pipeline_weight: u64,
    /// Fixed-point profile time the plan is expected to save
    pub expected_saving: u64,
    pub expected_speedup: f64,
}

pub fn estimate(
    ctx: ProgramContext<'_>,
    loop_id: LoopId,
    estimator: &dyn PerformanceEstimator,
    stages: &[Stage],
) -> SpeedupEstimate {
    let program = ctx.program;
    let loop_weight = estimator.loop_weight(program, loop_id);
    let pipeline_weight = estimator.pipeline_weight(program, stages);

    let scaled = i128::from(loop_weight) * i128::from(FIXED_POINT);
    let penalty = i128::from(PENALIZE_LOOP_NEST) * i128::from(program.loop_depth(loop_id));
    let adjusted = if scaled > penalty { scaled - penalty } else { scaled };
    let saved_weight = adjusted - i128::from(pipeline_weight) * i128::from(FIXED_POINT);

    let name = program.loop_name(loop_id);
    // without a measurement the estimate stands in for the time
    let loop_time = ctx.profile.loop_time(&name).unwrap_or(loop_weight);
    let saving = if loop_weight == 0 {
        0
    } else {
        (saved_weight * i128::from(loop_time) / i128::from(loop_weight)).max(0)
    };
    let expected_saving = u64::try_from(saving).unwrap_or(u64::MAX);

    let expected_speedup = if pipeline_weight == 0 {
        1.0
    } else {
        loop_weight as f64 / pipeline_weight as f64
    };
    trace!(
        loop_name = %name,
        loop_weight,
        pipeline_weight,
        loop_time,
        expected_saving,
        "speedup estimate"
    );
    SpeedupEstimate {
        loop_weight,
        pipeline_weight,
        expected_saving,
        expected_speedup,
    }
}

/// Fill in the plan's expected saving and speedup
pub fn evaluate(input: &CriticInput<'_>, plan: &mut ParallelizationPlan) -> SpeedupEstimate {
    let estimate = estimate(input.program, input.loop_id, input.estimator, &plan.stages);
    plan.expected_saving = estimate.expected_saving;
    plan.expected_speedup = estimate.expected_speedup;
    estimate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::partitioning::infrastructure::test_support::compute_loop;
    use crate::features::partitioning::infrastructure::FlatEstimator;
    use crate::shared::fixtures::Inputs;
    use crate::shared::models::OpId;

    fn parallel(n: u32, workers: u32) -> Vec<Stage> {
        vec![Stage::parallel((0..n).map(OpId), workers)]
    }

    #[test]
    fn test_small_loop_skips_nest_penalty() {
        // 4000 does not exceed the 10000 depth penalty
        let program = compute_loop(4);
        let inputs = Inputs::default();
        let e = estimate(inputs.context(&program), LoopId(0), &FlatEstimator, &parallel(4, 4));
        assert_eq!((e.loop_weight, e.pipeline_weight), (4, 1));
        assert_eq!(e.expected_saving, 3000);
        assert_eq!(e.expected_speedup, 4.0);
    }

    #[test]
    fn test_penalty_and_profile_scaling() {
        let program = compute_loop(20);
        let mut inputs = Inputs::default();
        let e = estimate(inputs.context(&program), LoopId(0), &FlatEstimator, &parallel(20, 4));
        // 20000 - 10000 - 5000
        assert_eq!(e.expected_saving, 5000);

        inputs
            .profile
            .loop_times
            .insert(program.loop_name(LoopId(0)), 400);
        let e = estimate(inputs.context(&program), LoopId(0), &FlatEstimator, &parallel(20, 4));
        assert_eq!(e.expected_saving, 5000 * 400 / 20);
    }

    #[test]
    fn test_slower_plan_saves_nothing() {
        let program = compute_loop(4);
        let inputs = Inputs::default();
        let stages = vec![Stage::sequential((0..4).map(OpId))];
        let e = estimate(inputs.context(&program), LoopId(0), &FlatEstimator, &stages);
        assert_eq!(e.expected_saving, 0);
        assert_eq!(e.expected_speedup, 1.0);
    }
}
