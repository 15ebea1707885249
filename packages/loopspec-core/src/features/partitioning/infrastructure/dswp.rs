//! Balanced pipeline critic
//!
//! Greedy topological bin packing of the optimistic condensation: among the
//! components whose predecessors are all placed, the heaviest goes into the
//! current sequential stage until the stage holds its share of the loop
//! weight (total / workers). The last stage takes whatever is left.

use crate::config::CriticKind;
use crate::features::partitioning::domain::{ParallelizationPlan, Stage};
use crate::features::partitioning::ports::{Critic, CriticInput};
use crate::features::pdg::{Condensation, SccId};
use tracing::{debug, trace};

#[derive(Debug, Default, Clone, Copy)]
pub struct DswpCritic;

impl DswpCritic {
    /// Heaviest unplaced component with no unplaced predecessor; the lowest
    /// id wins ties
    fn next_free(pending: &[Option<usize>], weights: &[u64]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, count) in pending.iter().enumerate() {
            if *count != Some(0) {
                continue;
            }
            if best.map_or(true, |b| weights[i] > weights[b]) {
                best = Some(i);
            }
        }
        best
    }

    fn partition(condensation: &Condensation, weights: &[u64], workers: usize) -> Vec<Vec<SccId>> {
        let total: u64 = weights.iter().sum();
        // None once placed
        let mut pending: Vec<Option<usize>> = condensation
            .sccs()
            .iter()
            .map(|s| Some(condensation.predecessors(s.id).len()))
            .collect();

        let mut stages = Vec::with_capacity(workers);
        for stage_no in 0..workers {
            let mut members = Vec::new();
            let mut weight = 0u64;
            // weight < total / workers, without rounding
            while u128::from(weight) * (workers as u128) < u128::from(total) {
                let Some(next) = Self::next_free(&pending, weights) else {
                    break;
                };
                pending[next] = None;
                weight += weights[next];
                let id = SccId(next as u32);
                members.push(id);
                for succ in condensation.successors(id) {
                    if let Some(count) = pending[succ.index()].as_mut() {
                        *count -= 1;
                    }
                }
            }
            if stage_no + 1 == workers {
                for (i, p) in pending.iter().enumerate() {
                    if p.is_some() {
                        members.push(SccId(i as u32));
                    }
                }
            }
            trace!(stage = stage_no, sccs = members.len(), weight, "dswp stage");
            if !members.is_empty() {
                stages.push(members);
            }
        }
        stages
    }
}

impl Critic for DswpCritic {
    fn kind(&self) -> CriticKind {
        CriticKind::Dswp
    }

    fn critique(&self, input: &CriticInput<'_>) -> Option<ParallelizationPlan> {
        let condensation = input.optimistic_condensation();
        if condensation.is_empty() {
            return None;
        }
        let weights: Vec<u64> = condensation
            .sccs()
            .iter()
            .map(|s| input.scc_weight(s))
            .collect();
        let workers = (input.config.thread_budget as usize).min(condensation.len()).max(1);

        let stages: Vec<Stage> = Self::partition(&condensation, &weights, workers)
            .into_iter()
            .map(|members| {
                Stage::sequential(
                    members
                        .into_iter()
                        .flat_map(|id| condensation.scc(id).ops.iter().copied()),
                )
            })
            .collect();
        let criticisms = input.criticisms_for(&stages)?;
        debug!(
            critic = self.name(),
            stages = stages.len(),
            criticisms = criticisms.len(),
            "balanced pipeline"
        );
        Some(ParallelizationPlan::new(self.kind(), stages, criticisms))
    }
}
