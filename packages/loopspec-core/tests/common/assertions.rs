//! Custom assertions for test verification

use loopspec_core::features::orchestration::LoopStrategy;
use loopspec_core::features::partitioning::ParallelizationPlan;
use loopspec_core::features::pdg::{Condensation, Criticisms, ProgramDependenceGraph};
use loopspec_core::features::selection::LoopSelection;
use loopspec_core::shared::models::{LoopId, OpId, Program};

/// Every operation of the loop lands in exactly one stage
pub fn assert_plan_covers_loop(plan: &ParallelizationPlan, program: &Program, loop_id: LoopId) {
    let ops: Vec<OpId> = program.loop_ops(loop_id).collect();
    assert!(
        plan.covers_exactly(ops.iter().copied()),
        "{} plan does not partition {} ops of {}: stages {:?}",
        plan.critic.as_str(),
        ops.len(),
        program.loop_name(loop_id),
        plan.stages.iter().map(|s| &s.ops).collect::<Vec<_>>()
    );
}

/// No retained dependence flows from a later stage to an earlier one, and
/// no parallel stage keeps a loop-carried one
pub fn assert_no_backward_edges(plan: &ParallelizationPlan, pdg: &ProgramDependenceGraph) {
    let index = plan.stage_index();
    for dep in pdg.internal_dependences() {
        if plan.criticisms.contains(&dep) {
            continue;
        }
        assert!(
            plan.respects(&dep, &index),
            "{} plan violates {} (stages {:?} -> {:?})",
            plan.critic.as_str(),
            dep,
            index.get(&dep.src),
            index.get(&dep.dst)
        );
    }
}

/// Each criticism is resolved by exactly one selected remedy
pub fn assert_remedies_cover(strategy: &LoopStrategy) {
    let mut resolved = Criticisms::new();
    for remedy in strategy.remedies.remedies.iter() {
        for c in &remedy.resolved {
            assert!(resolved.insert(*c), "{} resolved twice", c);
        }
    }
    for c in &strategy.plan.criticisms {
        assert!(resolved.contains(c), "criticism {} has no remedy", c);
    }
}

/// The selected loops are pairwise compatible
pub fn assert_clique_valid(selection: &LoopSelection) {
    for pair in &selection.incompatible {
        assert!(
            !(selection.is_selected(pair.a) && selection.is_selected(pair.b)),
            "{} and {} selected together despite {:?}",
            pair.a,
            pair.b,
            pair.conflict
        );
    }
    for id in &selection.selected {
        let report = selection
            .report(*id)
            .unwrap_or_else(|| panic!("selected {} has no report", id));
        assert!(report.is_accepted(), "selected {} was not accepted", id);
    }
}

/// The component graph has no cycle and every node sits in one component
pub fn assert_condensation_sound(cond: &Condensation, pdg: &ProgramDependenceGraph) {
    assert!(cond.is_acyclic(), "condensation has a cycle");
    let total: usize = cond.sccs().iter().map(|s| s.len()).sum();
    assert_eq!(total, pdg.num_internal(), "components do not partition the loop");
    for op in pdg.internal_ops() {
        assert!(cond.scc_of(op).is_some(), "{} belongs to no component", op);
    }
}
