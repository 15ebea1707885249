//! Pipeline with a maximal parallel stage
//!
//! 1. Optimistic graph: removable dependences are dropped, except carried
//!    reduction edges, which stay as intra-iteration edges so a reduction
//!    cycle lands in one component that may still run in parallel.
//! 2. The heaviest set of carried-free components that can share a stage is
//!    a min cut of a non-mergeability network: `source -> L(c)` and
//!    `R(c) -> sink` weigh `1 + 100 * weight(c)`, and `L(a) -> R(b)` is
//!    infinite whenever `a` and `b` may not share the parallel stage.
//! 3. The remaining components go before or after the parallel stage.
//! 4. Refinement: operations sinking a non-removable carried register value
//!    move to the previous stage; expensive criticisms are avoided by
//!    moving a slice to the front or back sequential stage while the weight
//!    moved off the parallel stage stays within its budget.
//! 5. A replicable front stage is recomputed by the stages it feeds.

use super::min_cut::{FlowNetwork, Vertex, INFINITY, MAX_FINITE, SINK, SOURCE};
use crate::config::CriticKind;
use crate::features::partitioning::domain::{ParallelizationPlan, Stage, StageKind};
use crate::features::partitioning::ports::{Critic, CriticInput};
use crate::features::pdg::{Condensation, DepKind, Dependence, ProgramDependenceGraph, SccId};
use crate::shared::constants::{partitioning::FLOW_WEIGHT_SCALE, remedy_costs};
use crate::shared::models::OpId;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

#[derive(Debug, Default, Clone, Copy)]
pub struct PsDswpCritic;

fn left(id: SccId) -> Vertex {
    2 * (id.index() + 1)
}

fn right(id: SccId) -> Vertex {
    2 * (id.index() + 1) + 1
}

/// Transitive successors in the component DAG
struct Reachability {
    rows: Vec<Vec<bool>>,
}

impl Reachability {
    fn new(condensation: &Condensation) -> Self {
        let n = condensation.len();
        let mut rows = vec![vec![false; n]; n];
        // successors always carry a higher id
        for i in (0..n).rev() {
            for succ in condensation.successors(SccId(i as u32)) {
                let j = succ.index();
                let (head, tail) = rows.split_at_mut(j);
                let (row, reached) = (&mut head[i], &tail[0]);
                row[j] = true;
                for (bit, r) in row.iter_mut().zip(reached) {
                    *bit |= *r;
                }
            }
        }
        Self { rows }
    }

    fn reaches(&self, from: SccId, to: SccId) -> bool {
        self.rows[from.index()][to.index()]
    }

    /// Split `all` into components ordered before some pivot, after some
    /// pivot, and unordered
    fn pivot(&self, all: &[SccId], pivots: &[SccId]) -> (Vec<SccId>, Vec<SccId>, Vec<SccId>) {
        let (mut before, mut after, mut flexible) = (Vec::new(), Vec::new(), Vec::new());
        for &scc in all {
            if pivots.iter().any(|&p| self.reaches(scc, p)) {
                before.push(scc);
            } else if pivots.iter().any(|&p| self.reaches(p, scc)) {
                after.push(scc);
            } else {
                flexible.push(scc);
            }
        }
        (before, after, flexible)
    }
}

/// Optimistic graph with carried reduction edges kept as intra-iteration
fn optimistic_graph(input: &CriticInput<'_>) -> ProgramDependenceGraph {
    let pdg = input.pdg;
    let mut graph = ProgramDependenceGraph::new(pdg.loop_id());
    for op in pdg.internal_ops() {
        graph.add_node(op, true);
    }
    for dep in pdg.internal_dependences() {
        if !input.considers(&dep) {
            continue;
        }
        match pdg.removal_cost(&dep) {
            None => {
                graph.add_dependence(dep);
            }
            Some(remedy_costs::REDUCTION) if dep.loop_carried => {
                graph.add_dependence(Dependence {
                    loop_carried: false,
                    ..dep
                });
            }
            Some(_) => {}
        }
    }
    graph
}

/// Heaviest mergeable subset of carried-free components, and the rest
fn max_parallel_stage(
    condensation: &Condensation,
    reach: &Reachability,
    weights: &[u64],
) -> Option<(Vec<SccId>, Vec<SccId>)> {
    let (good, bad): (Vec<SccId>, Vec<SccId>) = condensation
        .sccs()
        .iter()
        .map(|s| s.id)
        .partition(|id| !condensation.scc(*id).loop_carried);
    if good.is_empty() {
        return None;
    }

    let mut network = FlowNetwork::new();
    for &g in &good {
        let capacity = weights[g.index()]
            .saturating_mul(FLOW_WEIGHT_SCALE)
            .saturating_add(1)
            .min(MAX_FINITE);
        network.add_edge(SOURCE, left(g), capacity);
        network.add_edge(right(g), SINK, capacity);
    }
    let mut separate = |a: &[SccId], b: &[SccId]| {
        for &x in a {
            for &y in b {
                network.add_edge(left(x), right(y), INFINITY);
            }
        }
    };

    // a sequential component between two members would make the
    // pipeline cyclic
    for &b in &bad {
        let (before, after, _) = reach.pivot(&good, &[b]);
        separate(&before, &after);
    }
    // no carried dependence inside the parallel stage: a member carrying a
    // value to another one keeps everything before it apart from
    // everything after the receiver
    for &x in &good {
        for &y in &good {
            if !condensation.edge(x, y).has_loop_carried() {
                continue;
            }
            let (mut first, _, _) = reach.pivot(&good, &[x]);
            first.push(x);
            let (_, mut second, _) = reach.pivot(&good, &[y]);
            second.push(y);
            separate(&first, &second);
        }
    }

    let cut = network.min_cut();
    let selected: Vec<SccId> = good
        .into_iter()
        .filter(|g| !cut.contains(&left(*g)) && !cut.contains(&right(*g)))
        .collect();
    if selected.is_empty() {
        return None;
    }
    let rest = condensation
        .sccs()
        .iter()
        .map(|s| s.id)
        .filter(|id| !selected.contains(id))
        .collect();
    Some((selected, rest))
}

/// Pending moves of one refinement step
#[derive(Default)]
struct Moves {
    to_front: FxHashSet<OpId>,
    to_back: FxHashSet<OpId>,
    /// Criticisms kept in the graph because their endpoints moved instead
    kept: FxHashSet<Dependence>,
}

struct Refiner<'i, 'a> {
    input: &'i CriticInput<'a>,
    parallel_weight: u64,
    off_weight: u64,
}

impl Refiner<'_, '_> {
    fn over_budget(&self, off_weight: u64) -> bool {
        let percent = u128::from(self.input.config.off_parallel_stage_percent);
        u128::from(off_weight) * 100 > percent * u128::from(self.parallel_weight)
    }

    fn front(stages: &[Stage]) -> Option<usize> {
        (stages.first()?.kind == StageKind::Sequential).then_some(0)
    }

    fn back(stages: &[Stage]) -> Option<usize> {
        let last = stages.len().checked_sub(1)?;
        (last > 0 && stages[last].kind == StageKind::Sequential).then_some(last)
    }

    /// Weight moved off the parallel stage when `op` and its slice go to
    /// the front (backward slice) or back (forward slice) stage; `None` when
    /// the move is impossible or over budget
    fn move_off(
        &self,
        stages: &[Stage],
        op: OpId,
        to_front: bool,
        visited: &mut FxHashSet<OpId>,
        moves: &Moves,
        moved_so_far: u64,
    ) -> Option<u64> {
        let (target, other, moved_target, moved_other) = if to_front {
            (Self::front(stages), Self::back(stages), &moves.to_front, &moves.to_back)
        } else {
            (Self::back(stages), Self::front(stages), &moves.to_back, &moves.to_front)
        };
        if moved_other.contains(&op) {
            return None;
        }
        if moved_target.contains(&op) || target.is_some_and(|t| stages[t].ops.contains(&op)) {
            return Some(0);
        }
        if !visited.insert(op) {
            return Some(0);
        }

        let mut extra = 0u64;
        if !other.is_some_and(|o| stages[o].ops.contains(&op)) {
            extra = self.input.weight_of([&op]);
            if self.over_budget(moved_so_far.saturating_add(extra)) {
                return None;
            }
        }

        let pdg = self.input.pdg;
        let deps = if to_front { pdg.incoming(op) } else { pdg.outgoing(op) };
        for dep in deps {
            if !self.input.considers(&dep) {
                continue;
            }
            let removed = pdg
                .removal_cost(&dep)
                .is_some_and(|c| c != remedy_costs::REDUCTION);
            if removed && !moves.kept.contains(&dep) {
                continue;
            }
            let next = if to_front { dep.src } else { dep.dst };
            if next == op || !pdg.is_internal(next) {
                continue;
            }
            let cost = self.move_off(
                stages,
                next,
                to_front,
                visited,
                moves,
                moved_so_far.saturating_add(extra),
            )?;
            extra = extra.saturating_add(cost);
        }
        Some(extra)
    }

    /// Try to keep `dep` by moving operations instead of removing it
    fn avoid_elimination(&mut self, stages: &[Stage], dep: &Dependence, moves: &mut Moves) -> bool {
        if self.over_budget(self.off_weight) {
            return false;
        }
        let cost = self.input.pdg.removal_cost(dep).unwrap_or(0);
        if cost <= self.input.config.avoid_elimination_cost_threshold {
            return false;
        }
        if moves.to_front.contains(&dep.src) || moves.to_back.contains(&dep.dst) {
            return true;
        }

        let attempt = |op: OpId, to_front: bool, present: bool| {
            if !present {
                return None;
            }
            let mut visited = FxHashSet::default();
            self.move_off(stages, op, to_front, &mut visited, moves, self.off_weight)
                .map(|weight| (weight, visited))
        };
        let front = attempt(dep.src, true, Self::front(stages).is_some());
        let back = attempt(dep.dst, false, Self::back(stages).is_some());

        let (weight, moved, to_front) = match (front, back) {
            (Some((f, ops)), back) if back.as_ref().map_or(true, |(b, _)| f <= *b) => (f, ops, true),
            (_, Some((b, ops))) => (b, ops, false),
            _ => return false,
        };
        trace!(dep = %dep, cost, weight, to_front, "keeping dependence");
        if to_front {
            moves.to_front.extend(moved);
        } else {
            moves.to_back.extend(moved);
        }
        moves.kept.insert(*dep);
        self.off_weight = self.off_weight.saturating_add(weight);
        true
    }

    /// Avoid what can be avoided among `violations`, then carry out the moves
    fn settle(&mut self, stages: &mut [Stage], violations: Vec<Dependence>) {
        let mut moves = Moves::default();
        for dep in violations {
            if self.input.pdg.is_removable(&dep) {
                self.avoid_elimination(stages, &dep, &mut moves);
            }
        }
        let last = stages.len() - 1;
        for (ops, target) in [(moves.to_front, 0), (moves.to_back, last)] {
            for op in ops {
                for (i, stage) in stages.iter_mut().enumerate() {
                    if i == target {
                        stage.ops.insert(op);
                    } else {
                        stage.ops.remove(&op);
                    }
                }
            }
        }
    }

    fn refine(&mut self, stages: &mut [Stage]) {
        let pdg = self.input.pdg;
        let n = stages.len();
        // nothing may flow from a later stage back to an earlier one
        for early in 0..n {
            for late in early + 1..n {
                let violations = stages[late]
                    .ops
                    .iter()
                    .flat_map(|op| pdg.outgoing(*op))
                    .filter(|d| self.input.considers(d) && stages[early].ops.contains(&d.dst))
                    .collect();
                self.settle(stages, violations);
            }
        }
        // nothing carried inside a parallel stage
        for p in 0..n {
            if !stages[p].is_parallel() {
                continue;
            }
            let violations = stages[p]
                .ops
                .iter()
                .flat_map(|op| pdg.outgoing(*op))
                .filter(|d| {
                    d.loop_carried && self.input.considers(d) && stages[p].ops.contains(&d.dst)
                })
                .collect();
            self.settle(stages, violations);
        }
    }
}

impl PsDswpCritic {
    /// Under `abort_if_no_parallel_stage`, a parallel stage of phis and
    /// branches alone is not worth a pipeline
    fn trivial_parallel_stage<'o>(
        input: &CriticInput<'_>,
        ops: impl IntoIterator<Item = &'o OpId>,
    ) -> bool {
        let program = input.program.program;
        input.config.abort_if_no_parallel_stage
            && ops.into_iter().all(|op| program.op(*op).is_lightweight())
    }

    /// Parallel-stage operations that sink a non-removable carried register
    /// value move to the previous stage
    fn adjust_pipeline(input: &CriticInput<'_>, stages: &mut [Stage]) {
        for p in 1..stages.len() {
            if !stages[p].is_parallel() {
                continue;
            }
            let sinks: Vec<OpId> = stages[p]
                .ops
                .iter()
                .copied()
                .filter(|op| {
                    input.pdg.incoming(*op).iter().any(|d| {
                        d.loop_carried && d.kind == DepKind::Register && !input.pdg.is_removable(d)
                    })
                })
                .collect();
            for op in sinks {
                trace!(op = %op, "moving carried register sink to previous stage");
                stages[p].ops.remove(&op);
                stages[p - 1].ops.insert(op);
            }
        }
    }

    /// A write-free front stage is recomputed by every later stage it feeds
    /// instead of running on its own worker
    fn replicate_front(input: &CriticInput<'_>, stages: &mut [Stage]) {
        if stages.len() < 2 || stages[0].kind != StageKind::Sequential {
            return;
        }
        let program = input.program.program;
        if stages[0].ops.iter().any(|op| program.may_write_memory(*op)) {
            return;
        }
        let front = stages[0].ops.clone();
        let mut users = 0;
        for stage in stages.iter_mut().skip(1) {
            let fed = front.iter().any(|op| {
                input
                    .pdg
                    .outgoing(*op)
                    .iter()
                    .any(|d| input.considers(d) && stage.ops.contains(&d.dst))
            });
            if fed {
                users += 1;
                stage.replicated.extend(front.iter().copied());
                if stage.is_parallel() {
                    stage.parallel_factor += 1;
                }
            }
        }
        if users > 0 {
            stages[0].kind = StageKind::Replicated;
        }
    }
}

impl Critic for PsDswpCritic {
    fn kind(&self) -> CriticKind {
        CriticKind::PsDswp
    }

    fn critique(&self, input: &CriticInput<'_>) -> Option<ParallelizationPlan> {
        let optimistic = optimistic_graph(input);
        let condensation = Condensation::new(&optimistic);
        let reach = Reachability::new(&condensation);
        let weights: Vec<u64> = condensation
            .sccs()
            .iter()
            .map(|s| input.scc_weight(s))
            .collect();

        let Some((parallel, rest)) = max_parallel_stage(&condensation, &reach, &weights) else {
            debug!(critic = self.name(), "no parallel stage");
            return None;
        };
        let ops_of = |ids: &[SccId]| -> Vec<OpId> {
            ids.iter()
                .flat_map(|id| condensation.scc(*id).ops.iter().copied())
                .collect()
        };
        let parallel_ops = ops_of(&parallel);
        if Self::trivial_parallel_stage(input, &parallel_ops) {
            debug!(critic = self.name(), "parallel stage holds only control operations");
            return None;
        }

        let (mut before, mut after, flexible) = reach.pivot(&rest, &parallel);
        if after.is_empty() {
            before.extend(flexible);
        } else {
            after.extend(flexible);
        }
        let mut workers = input.config.thread_budget;
        let mut stages = Vec::with_capacity(3);
        if !before.is_empty() {
            workers = workers.saturating_sub(1);
            stages.push(Stage::sequential(ops_of(&before)));
        }
        if !after.is_empty() {
            workers = workers.saturating_sub(1);
        }
        stages.push(Stage::parallel(parallel_ops, workers));
        if !after.is_empty() {
            stages.push(Stage::sequential(ops_of(&after)));
        }

        let mut refiner = Refiner {
            input,
            parallel_weight: input.weight_of(&stages[usize::from(!before.is_empty())].ops),
            off_weight: 0,
        };
        Self::adjust_pipeline(input, &mut stages);
        refiner.refine(&mut stages);
        stages.retain(|s| !s.is_empty());
        let parallel_stage = stages.iter().find(|s| s.is_parallel())?;
        if Self::trivial_parallel_stage(input, &parallel_stage.ops) {
            debug!(critic = self.name(), "refinement left only control operations in parallel");
            return None;
        }
        if input.config.include_replicable_stages {
            Self::replicate_front(input, &mut stages);
        }

        let criticisms = input.criticisms_for(&stages)?;
        debug!(
            critic = self.name(),
            stages = stages.len(),
            criticisms = criticisms.len(),
            moved_off_parallel = refiner.off_weight,
            "pipeline with parallel stage"
        );
        Some(ParallelizationPlan::new(self.kind(), stages, criticisms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::partitioning::infrastructure::test_support::*;
    use crate::shared::fixtures::{branch, store, ProgramSketch};
    use crate::shared::models::{OpKind, OpId};
    use pretty_assertions::assert_eq;
    use DepKind::*;

    fn ops(stage: &Stage) -> Vec<u32> {
        stage.ops.iter().map(|op| op.0).collect()
    }

    /// 0 (carried) -> 1 -> 2 -> 3 (carried)
    fn sequential_ends() -> ProgramDependenceGraph {
        graph(
            4,
            &[
                (0, 0, Register, true),
                (0, 1, Register, false),
                (1, 2, Register, false),
                (2, 3, Flow, false),
                (3, 3, Output, true),
            ],
        )
    }

    #[test]
    fn test_sequential_parallel_sequential() {
        let plan = critique(&PsDswpCritic, &sequential_ends(), |c| {
            c.include_replicable_stages = false
        })
        .unwrap();
        let shape: Vec<(StageKind, Vec<u32>)> =
            plan.stages.iter().map(|s| (s.kind, ops(s))).collect();
        assert_eq!(
            shape,
            vec![
                (StageKind::Sequential, vec![0]),
                (StageKind::Parallel, vec![1, 2]),
                (StageKind::Sequential, vec![3]),
            ]
        );
        assert_eq!(plan.stages[1].parallel_factor, 23);
        assert!(plan.criticisms.is_empty());
        assert!(plan.covers_exactly((0..4).map(OpId)));
    }

    #[test]
    fn test_write_free_front_is_replicated() {
        let plan = critique(&PsDswpCritic, &sequential_ends(), |_| {}).unwrap();
        assert_eq!(plan.stages[0].kind, StageKind::Replicated);
        assert_eq!(plan.stages[1].replicated.iter().map(|o| o.0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(plan.stages[1].parallel_factor, 24);
        // the back stage is not fed by the front one
        assert!(plan.stages[2].replicated.is_empty());
    }

    #[test]
    fn test_writing_front_stays_sequential() {
        let program = ProgramSketch::new()
            .object()
            .pointer(&[0])
            .block("body", &[0])
            .op(0, store(0), &[])
            .op(0, OpKind::Compute, &[0])
            .op(0, OpKind::Compute, &[1])
            .op(0, OpKind::Compute, &[2])
            .natural_loop(0, &[0], None)
            .build();
        let plan = critique_in(&program, &PsDswpCritic, &sequential_ends(), |_| {}).unwrap();
        assert_eq!(plan.stages[0].kind, StageKind::Sequential);
    }

    #[test]
    fn test_carried_pair_is_split_by_min_cut() {
        // {1, 4} and {2} are both carried-free but 1 -lc-> 2 keeps them
        // apart; the receiver goes to a later sequential stage
        let pdg = graph(
            5,
            &[
                (0, 1, Register, false),
                (1, 4, Register, false),
                (4, 1, Register, false),
                (1, 2, Flow, true),
                (3, 2, Register, false),
            ],
        );
        let plan = critique(&PsDswpCritic, &pdg, |c| c.include_replicable_stages = false).unwrap();
        let parallel = plan.parallel_stage().unwrap();
        assert!(parallel.ops.contains(&OpId(1)) && parallel.ops.contains(&OpId(4)));
        assert!(!parallel.ops.contains(&OpId(2)));
        let index = plan.stage_index();
        assert!(index[&OpId(2)] > index[&OpId(1)]);
        assert!(plan.criticisms.is_empty());
    }

    #[test]
    fn test_reduction_cycle_stays_parallel() {
        let carried = Dependence::new(OpId(1), OpId(0), Register, true);
        let mut pdg = graph(3, &[(0, 1, Register, false), (1, 0, Register, true)]);
        pdg.mark_removable(carried, remedy_costs::REDUCTION);
        let plan = critique(&PsDswpCritic, &pdg, |_| {}).unwrap();
        assert_eq!(plan.stages.len(), 1);
        assert_eq!(ops(&plan.stages[0]), vec![0, 1, 2]);
        assert_eq!(plan.criticisms.into_iter().collect::<Vec<_>>(), vec![carried]);
    }

    /// op0 carried; ops 1..=40 fed by op0; an expensive 1 -lc-> 2
    fn wide_loop() -> (ProgramDependenceGraph, Dependence) {
        let mut edges = vec![(0, 0, Register, true)];
        edges.extend((1..=40).map(|i| (0, i, Register, false)));
        edges.push((1, 2, Flow, true));
        let mut pdg = graph(41, &edges);
        let expensive = Dependence::new(OpId(1), OpId(2), Flow, true);
        pdg.mark_removable(expensive, remedy_costs::MEMORY_SPECULATION);
        (pdg, expensive)
    }

    #[test]
    fn test_expensive_criticism_avoided_by_moving_source() {
        let (pdg, _) = wide_loop();
        let plan = critique(&PsDswpCritic, &pdg, |c| c.include_replicable_stages = false).unwrap();
        assert_eq!(ops(&plan.stages[0]), vec![0, 1]);
        assert_eq!(plan.stages[1].len(), 39);
        assert!(plan.criticisms.is_empty());
    }

    #[test]
    fn test_cheap_enough_criticism_is_kept() {
        let (pdg, expensive) = wide_loop();
        let plan = critique(&PsDswpCritic, &pdg, |c| {
            c.include_replicable_stages = false;
            c.avoid_elimination_cost_threshold = 5000;
        })
        .unwrap();
        assert_eq!(ops(&plan.stages[0]), vec![0]);
        assert!(plan.criticisms.contains(&expensive));
    }

    #[test]
    fn test_parallel_stage_emptied_by_refinement_aborts() {
        // op1 sinks a carried register value and moves to the front stage,
        // leaving only the exit branch in parallel
        let program = ProgramSketch::new()
            .block("body", &[0])
            .op(0, OpKind::Compute, &[])
            .op(0, OpKind::Compute, &[0])
            .op(0, branch(true), &[])
            .natural_loop(0, &[0], None)
            .build();
        let pdg = graph(3, &[(0, 0, Register, true), (0, 1, Register, true)]);

        assert!(critique_in(&program, &PsDswpCritic, &pdg, |c| {
            c.abort_if_no_parallel_stage = true
        })
        .is_none());

        let plan = critique_in(&program, &PsDswpCritic, &pdg, |c| {
            c.abort_if_no_parallel_stage = false;
            c.include_replicable_stages = false;
        })
        .unwrap();
        assert_eq!(ops(&plan.stages[0]), vec![0, 1]);
        assert_eq!(ops(plan.parallel_stage().unwrap()), vec![2]);
    }

    #[test]
    fn test_no_parallel_component() {
        let pdg = graph(2, &[(0, 1, Register, false), (1, 0, Flow, true)]);
        assert!(critique(&PsDswpCritic, &pdg, |_| {}).is_none());
    }

    /// Parallel-stage components with no carried edge between any two
    fn stage_is_carried_free(c: &Condensation, selected: &[SccId]) -> bool {
        selected
            .iter()
            .all(|x| selected.iter().all(|y| !c.edge(*x, *y).has_loop_carried()))
    }

    #[test]
    fn test_heavy_components_keep_carried_pairs_apart() {
        // 0 -lc-> 1 -lc-> 2: any two neighbours must be split
        let pdg = graph(3, &[(0, 1, Flow, true), (1, 2, Flow, true)]);
        let c = Condensation::new(&pdg);
        let reach = Reachability::new(&c);
        for weight in [5, u64::MAX / 50, u64::MAX] {
            let (selected, rest) = max_parallel_stage(&c, &reach, &[weight; 3]).unwrap();
            assert!(!selected.is_empty());
            assert_eq!(selected.len() + rest.len(), 3);
            assert!(stage_is_carried_free(&c, &selected), "weight {}", weight);
        }
    }

    #[test]
    fn test_reachability_is_transitive() {
        let pdg = graph(3, &[(0, 1, Register, false), (1, 2, Register, false)]);
        let c = Condensation::new(&pdg);
        let reach = Reachability::new(&c);
        let id = |op| c.scc_of(OpId(op)).unwrap();
        assert!(reach.reaches(id(0), id(2)));
        assert!(!reach.reaches(id(2), id(0)));
        let (before, after, flexible) = reach.pivot(&[id(0), id(2)], &[id(1)]);
        assert_eq!((before, after, flexible), (vec![id(0)], vec![id(2)], vec![]));
    }
}
