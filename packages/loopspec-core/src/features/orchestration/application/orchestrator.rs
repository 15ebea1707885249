//! Per-loop strategy search
//!
//! ```text
//! BuildPdg -> RunCritics -> PriceCriticisms -> SelectRemedies -> Evaluate -> Done
//!                 |               |                                  |
//!                 +---------------+------------> Rejected <----------+
//! ```
//!
//! BuildPdg also offers every dependence to the remediators, so critics see
//! which edges are removable and pricing is a catalog lookup.

use crate::config::{PlannerConfig, ValidatedConfig};
use crate::errors::{PlannerError, Result};
use crate::features::dependence_oracle::build_chain;
use crate::features::orchestration::domain::{
    CandidateSummary, LoopOutcome, LoopReport, LoopStrategy, PlanningPhase, RejectReason,
};
use crate::features::orchestration::ports::LoopPlanner;
use crate::features::partitioning::{estimator_for, run_critics, CriticInput, ParallelizationPlan};
use crate::features::pdg::PdgBuilder;
use crate::features::remediation::{create_remediators, select_cover, RemedySelection, RemovabilityPass};
use crate::shared::constants::cost_model::FIXED_POINT;
use crate::shared::models::{LoopId, ProgramContext};
use tracing::{debug, info};

pub struct Orchestrator {
    config: PlannerConfig,
}

/// Phase bookkeeping for one loop
struct Session {
    loop_name: String,
    phases: Vec<PlanningPhase>,
}

impl Session {
    fn enter(&mut self, phase: PlanningPhase) {
        let from = self.phases.last().copied();
        debug!(loop_name = %self.loop_name, from = ?from, to = %phase, "planning phase");
        self.phases.push(phase);
    }

    fn reject(mut self, mut report: LoopReport, reason: RejectReason) -> Result<LoopReport> {
        info!(loop_name = %self.loop_name, %reason, "loop rejected");
        self.enter(PlanningPhase::Rejected);
        report.phases = self.phases;
        report.outcome = LoopOutcome::Rejected { reason };
        Ok(report)
    }
}

impl Orchestrator {
    pub fn new(config: ValidatedConfig) -> Self {
        Self {
            config: config.into_inner(),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Saving left once the remedies are paid for
    fn net_saving(&self, saving: u64, remedy_cost: u64) -> u64 {
        if self.config.selection.ignore_remedy_cost {
            saving
        } else {
            saving.saturating_sub(remedy_cost.saturating_mul(FIXED_POINT))
        }
    }

    fn acceptable(&self, strategy: &LoopStrategy) -> bool {
        self.config.selection.ignore_expected_speedup
            || (strategy.expected_speedup() > 1.0 && strategy.net_saving > 0)
    }

    /// Highest expected speedup, then highest net saving; earlier critics
    /// win ties
    fn better(candidate: &LoopStrategy, best: &LoopStrategy) -> bool {
        let (a, b) = (candidate.expected_speedup(), best.expected_speedup());
        a > b || (a == b && candidate.net_saving > best.net_saving)
    }

    fn summarize(
        &self,
        plan: &ParallelizationPlan,
        selection: Option<&RemedySelection>,
    ) -> CandidateSummary {
        CandidateSummary {
            critic: plan.critic,
            stages: plan.stages.len(),
            criticisms: plan.criticisms.len(),
            expected_saving: plan.expected_saving,
            expected_speedup: plan.expected_speedup,
            remedy_cost: selection.map(|s| s.cost),
            net_saving: selection.map(|s| self.net_saving(plan.expected_saving, s.cost)),
        }
    }
}

impl LoopPlanner for Orchestrator {
    fn plan_loop(&self, ctx: ProgramContext<'_>, loop_id: LoopId) -> Result<LoopReport> {
        let program = ctx.program;
        if loop_id.index() >= program.loops().len() {
            return Err(PlannerError::malformed(format!(
                "{} is not a loop of the program ({} loops)",
                loop_id,
                program.loops().len()
            )));
        }
        let mut session = Session {
            loop_name: program.loop_name(loop_id),
            phases: Vec::new(),
        };
        info!(loop_name = %session.loop_name, "planning loop");

        session.enter(PlanningPhase::BuildPdg);
        let chain = build_chain(ctx, &self.config.oracle, false);
        let mut builder = PdgBuilder::new(program, &chain)
            .constrain_sub_loops(self.config.partitioning.constrain_sub_loops);
        let mut pdg = builder.build(loop_id);
        let estimator = estimator_for(ctx.profile);
        let remediators =
            create_remediators(&self.config.remediation.remediators, ctx, &self.config.oracle);
        let (catalog, remediator_stats) = RemovabilityPass::new(&remediators).run(
            ctx,
            &mut pdg,
            &*estimator,
            &self.config.remediation,
        );

        let mut report = LoopReport::new(
            loop_id,
            session.loop_name.clone(),
            estimator.loop_weight(program, loop_id),
        );
        report.pdg = pdg.stats();
        report.build = builder.stats();
        report.oracle = chain.stats();
        report.remediators = remediator_stats;
        report.catalog = catalog.entries();

        session.enter(PlanningPhase::RunCritics);
        let input = CriticInput {
            program: ctx,
            loop_id,
            pdg: &pdg,
            estimator: &*estimator,
            config: &self.config.partitioning,
        };
        let plans = run_critics(&input, &self.config.partitioning.critics);
        if plans.is_empty() {
            return session.reject(report, RejectReason::NoPlan);
        }

        session.enter(PlanningPhase::PriceCriticisms);
        let priced: Vec<(ParallelizationPlan, Option<RemedySelection>)> = plans
            .into_iter()
            .map(|plan| {
                let selection = select_cover(&catalog, &plan.criticisms);
                (plan, selection)
            })
            .collect();
        report.candidates = priced
            .iter()
            .map(|(plan, selection)| self.summarize(plan, selection.as_ref()))
            .collect();
        if priced.iter().all(|(_, selection)| selection.is_none()) {
            return session.reject(report, RejectReason::UncoveredCriticisms);
        }

        session.enter(PlanningPhase::SelectRemedies);
        let strategies: Vec<LoopStrategy> = priced
            .into_iter()
            .filter_map(|(plan, selection)| {
                let remedies = selection?;
                let net_saving = self.net_saving(plan.expected_saving, remedies.cost);
                debug!(
                    critic = plan.critic.as_str(),
                    remedies = remedies.remedies.len(),
                    cost = remedies.cost,
                    net_saving,
                    "remedies selected"
                );
                Some(LoopStrategy {
                    plan,
                    remedies,
                    net_saving,
                })
            })
            .collect();

        session.enter(PlanningPhase::Evaluate);
        let mut best: Option<LoopStrategy> = None;
        for strategy in strategies {
            if !self.acceptable(&strategy) {
                debug!(
                    critic = strategy.critic().as_str(),
                    speedup = strategy.expected_speedup(),
                    net_saving = strategy.net_saving,
                    "not profitable"
                );
                continue;
            }
            if best.as_ref().map_or(true, |b| Self::better(&strategy, b)) {
                best = Some(strategy);
            }
        }
        let Some(best) = best else {
            return session.reject(report, RejectReason::NoSpeedup);
        };

        info!(
            loop_name = %session.loop_name,
            critic = best.critic().as_str(),
            stages = best.plan.stages.len(),
            speedup = best.expected_speedup(),
            net_saving = best.net_saving,
            "loop accepted"
        );
        session.enter(PlanningPhase::Done);
        report.remediator_selection_count = best.remedies.per_remediator.clone();
        report.phases = session.phases;
        report.outcome = LoopOutcome::Accepted { strategy: best };
        Ok(report)
    }
}
