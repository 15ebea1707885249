//! Whole-program loop selection
//!
//! A round plans every hot loop, then looks for heavy call sites left in
//! sequential stages. While there are some and rounds remain, they are
//! inlined and the next round starts over on the rewritten program. The
//! last round's accepted loops become the vertices of the compatibility
//! graph, weighted by net saving, and its heaviest clique is selected.

use super::opportunities::find_opportunities;
use crate::config::{PlannerConfig, ValidatedConfig};
use crate::errors::Result;
use crate::features::orchestration::{LoopPlanner, Orchestrator};
use crate::features::partitioning::estimator_for;
use crate::features::selection::domain::{
    max_weight_clique, CompatibilityGraph, InlinedProgram, LoopSelection,
};
use crate::features::selection::infrastructure::CallSiteInliner;
use crate::features::selection::ports::LateInliner;
use crate::shared::constants::cost_model::FIXED_POINT;
use crate::shared::models::{ExecutionProfile, LoopId, ProgramContext};
use std::cmp::Reverse;
use tracing::{debug, info};

pub struct LoopSelector {
    config: PlannerConfig,
    planner: Box<dyn LoopPlanner>,
    inliner: Box<dyn LateInliner>,
}

impl LoopSelector {
    pub fn new(config: ValidatedConfig) -> Self {
        Self {
            planner: Box::new(Orchestrator::new(config.clone())),
            inliner: Box::new(CallSiteInliner),
            config: config.into_inner(),
        }
    }

    pub fn with_planner(mut self, planner: impl LoopPlanner + 'static) -> Self {
        self.planner = Box::new(planner);
        self
    }

    pub fn with_inliner(mut self, inliner: impl LateInliner + 'static) -> Self {
        self.inliner = Box::new(inliner);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Loops covering at least `min_loop_coverage_percent` of the program
    /// time. Without per-loop times every loop is a candidate; otherwise a
    /// loop the profile never timed counts as cold.
    pub fn candidates(&self, ctx: ProgramContext<'_>) -> Vec<LoopId> {
        let profile = ctx.profile;
        let all = ctx.program.loops().iter().map(|l| l.id);
        if profile.total_time == 0 || profile.loop_times.is_empty() {
            return all.collect();
        }
        let percent = u128::from(self.config.selection.min_loop_coverage_percent);
        all.filter(|id| {
            let name = ctx.program.loop_name(*id);
            let time = profile.loop_time(&name).unwrap_or(0);
            let hot = u128::from(time) * 100 >= u128::from(profile.total_time) * percent;
            if !hot {
                debug!(loop_name = %name, time, "loop below coverage threshold");
            }
            hot
        })
        .collect()
    }

    pub fn select(&self, ctx: ProgramContext<'_>) -> Result<LoopSelection> {
        let selection = &self.config.selection;
        let max_rounds = selection.late_inline_max_rounds.max(1);
        let mut rewritten: Option<InlinedProgram> = None;
        let mut inlined = Vec::new();
        let mut round = 0u32;

        let (candidates, reports) = loop {
            round += 1;
            let (program, profile) = rewritten
                .as_ref()
                .map_or((ctx.program, ctx.profile), |r| (&r.program, &r.profile));
            let round_ctx = ProgramContext::new(program, profile, ctx.heap);
            let candidates = self.candidates(round_ctx);
            let reports = candidates
                .iter()
                .map(|id| self.planner.plan_loop(round_ctx, *id))
                .collect::<Result<Vec<_>>>()?;
            info!(
                round,
                candidates = candidates.len(),
                accepted = reports.iter().filter(|r| r.is_accepted()).count(),
                "selection round"
            );

            let mut opportunities = Vec::new();
            {
                let estimator = estimator_for(profile);
                for report in &reports {
                    if let Some(strategy) = report.strategy() {
                        find_opportunities(
                            program,
                            report.loop_id,
                            strategy,
                            &*estimator,
                            selection.late_inline_min_coverage_percent,
                            &mut opportunities,
                        );
                    }
                }
            }
            if opportunities.is_empty() || round >= max_rounds {
                break (candidates, reports);
            }
            match self.inliner.inline(program, profile, &opportunities)? {
                Some(next) => {
                    inlined.extend(opportunities);
                    rewritten = Some(next);
                }
                None => break (candidates, reports),
            }
        };

        let (program, profile) = rewritten
            .as_ref()
            .map_or((ctx.program, ctx.profile), |r| (&r.program, &r.profile));
        let (accepted, weights): (Vec<LoopId>, Vec<u64>) = reports
            .iter()
            .filter(|r| r.is_accepted())
            .map(|r| (r.loop_id, r.expected_saving()))
            .unzip();
        let graph = CompatibilityGraph::build(
            ProgramContext::new(program, profile, ctx.heap),
            accepted,
        );
        let clique = max_weight_clique(graph.adjacency(), &weights);
        let mut members = clique.members;
        if clique.weight < 1 && !selection.ignore_expected_speedup {
            members.clear();
        }
        if selection.parallelize_at_most_one_loop && members.len() > 1 {
            // heaviest, lowest loop id on ties
            members = members
                .iter()
                .copied()
                .max_by_key(|v| (weights[*v], Reverse(*v)))
                .into_iter()
                .collect();
        }
        let total_saving = members
            .iter()
            .fold(0u64, |acc, v| acc.saturating_add(weights[*v]));
        let selected: Vec<LoopId> = members.iter().map(|v| graph.loop_at(*v)).collect();
        let expected_speedup = program_speedup(ctx.profile, total_saving);
        info!(
            selected = selected.len(),
            total_saving,
            expected_speedup,
            "loops selected"
        );

        let incompatible = graph.into_conflicts();
        let (program, profile) = match rewritten {
            Some(InlinedProgram { program, profile }) => (Some(program), Some(profile)),
            None => (None, None),
        };
        Ok(LoopSelection {
            rounds: round,
            candidates,
            reports,
            incompatible,
            selected,
            total_saving,
            expected_speedup,
            inlined,
            program,
            profile,
        })
    }
}

/// Program time over program time minus the fixed-point saving
fn program_speedup(profile: &ExecutionProfile, saving: u64) -> f64 {
    let total = u128::from(profile.total_time) * u128::from(FIXED_POINT);
    if total == 0 {
        return 1.0;
    }
    let remaining = total.saturating_sub(u128::from(saving)).max(1);
    total as f64 / remaining as f64
}
