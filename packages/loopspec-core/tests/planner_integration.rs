//! End-to-end planning of single loops
//!
//! Each scenario runs the orchestrator on a small host program and checks
//! the structural guarantees of the strategy it returns.

mod common;

use common::*;
use loopspec_core::config::{CriticKind, PlannerConfig, Preset, RemediatorKind};
use loopspec_core::features::dependence_oracle::{build_chain, ModRef, ModRefQuery, TemporalRelation};
use loopspec_core::features::orchestration::{LoopPlanner, Orchestrator, PlanningPhase, RejectReason};
use loopspec_core::features::pdg::{DepKind, PdgBuilder, ProgramDependenceGraph};
use loopspec_core::shared::models::{LoopId, OpId, Program, ProgramContext};
use loopspec_core::PlannerError;
use pretty_assertions::assert_eq;

fn orchestrator(config: PlannerConfig) -> Orchestrator {
    Orchestrator::new(config.build().unwrap())
}

fn static_pdg(ctx: ProgramContext<'_>, config: &PlannerConfig, loop_id: LoopId) -> ProgramDependenceGraph {
    let chain = build_chain(ctx, &config.oracle, false);
    PdgBuilder::new(ctx.program, &chain)
        .constrain_sub_loops(config.partitioning.constrain_sub_loops)
        .build(loop_id)
}

fn has_memory_dep(pdg: &ProgramDependenceGraph, a: u32, b: u32) -> bool {
    pdg.deps_between(OpId(a), OpId(b)).has_memory() || pdg.deps_between(OpId(b), OpId(a)).has_memory()
}

#[test]
fn test_memory_free_loop_is_doall() {
    let program = counted_loop();
    let inputs = Inputs::default();
    let config = PlannerConfig::preset(Preset::Balanced);
    let report = orchestrator(config.clone())
        .plan_loop(inputs.context(&program), LoopId(0))
        .unwrap();

    assert!(report.is_accepted(), "rejected: {:?}", report.reject_reason());
    assert_eq!(report.phase(), PlanningPhase::Done);
    let strategy = report.strategy().unwrap();
    assert_eq!(strategy.plan.stages.len(), 1);
    assert!(strategy.plan.stages[0].is_parallel());
    assert!(strategy.expected_speedup() > 1.0);

    let pdg = static_pdg(inputs.context(&program), &config, LoopId(0));
    assert_plan_covers_loop(&strategy.plan, &program, LoopId(0));
    assert_no_backward_edges(&strategy.plan, &pdg);
    assert_remedies_cover(strategy);
}

#[test]
fn test_disjoint_objects_leave_no_memory_edge() {
    let program = copy_loop();
    let inputs = Inputs::default();
    let ctx = inputs.context(&program);
    let config = PlannerConfig::preset(Preset::Balanced);

    let chain = build_chain(ctx, &config.oracle, false);
    for rel in [TemporalRelation::Before, TemporalRelation::Same, TemporalRelation::After] {
        let answer = chain.modref(&ModRefQuery::ops(OpId(4), rel, OpId(3), Some(LoopId(0))));
        assert_eq!(answer.result, ModRef::NoModRef, "store vs load under {}", rel);
    }

    let pdg = static_pdg(ctx, &config, LoopId(0));
    assert!(!has_memory_dep(&pdg, 3, 4));
    // the address feeds both accesses
    assert!(pdg.deps_between(OpId(2), OpId(3)).contains(DepKind::Register, false));
}

#[test]
fn test_accumulator_keeps_carried_flow() {
    let program = accumulator_loop();
    let inputs = Inputs::default();
    let config = PlannerConfig::preset(Preset::Balanced);
    let pdg = static_pdg(inputs.context(&program), &config, LoopId(0));

    let store_to_load = pdg.deps_between(OpId(5), OpId(3));
    assert!(store_to_load.contains(DepKind::Flow, true), "got {:?}", store_to_load);
}

#[test]
fn test_unremovable_carried_flow_blocks_doall() {
    let program = accumulator_loop();
    let inputs = Inputs::default();
    let config = PlannerConfig::preset(Preset::Balanced)
        .remediation(|c| c.remediators(vec![RemediatorKind::CountedIv]))
        .partitioning(|c| c.critics(vec![CriticKind::Doall]));
    let report = orchestrator(config)
        .plan_loop(inputs.context(&program), LoopId(0))
        .unwrap();
    assert_eq!(report.reject_reason(), Some(RejectReason::NoPlan));
    assert_eq!(report.phase(), PlanningPhase::Rejected);
}

#[test]
fn test_pipeline_respects_carried_flow() {
    let program = accumulator_loop();
    let inputs = Inputs::default();
    let config = PlannerConfig::preset(Preset::Balanced)
        .remediation(|c| c.remediators(vec![RemediatorKind::CountedIv]))
        .partitioning(|c| c.critics(vec![CriticKind::Dswp]))
        .selection(|c| c.ignore_expected_speedup(true));
    let report = orchestrator(config.clone())
        .plan_loop(inputs.context(&program), LoopId(0))
        .unwrap();
    let strategy = report.strategy().expect("dswp always has a pipeline");

    let pdg = static_pdg(inputs.context(&program), &config, LoopId(0));
    assert_plan_covers_loop(&strategy.plan, &program, LoopId(0));
    assert_no_backward_edges(&strategy.plan, &pdg);
    assert_remedies_cover(strategy);
    // load, update and store share one component
    let stage = strategy.plan.stage_of(OpId(3));
    assert_eq!(stage, strategy.plan.stage_of(OpId(4)));
    assert_eq!(stage, strategy.plan.stage_of(OpId(5)));
}

#[test]
fn test_accumulator_gets_only_pipeline_plans() {
    let program = accumulator_loop();
    let inputs = Inputs::default();
    let config = PlannerConfig::preset(Preset::Balanced)
        .remediation(|c| c.remediators(vec![RemediatorKind::CountedIv]))
        .partitioning(|c| {
            c.critics(vec![CriticKind::Doall, CriticKind::Dswp, CriticKind::PsDswp])
                .thread_budget(4)
        })
        .selection(|c| c.ignore_expected_speedup(true));
    let report = orchestrator(config.clone())
        .plan_loop(inputs.context(&program), LoopId(0))
        .unwrap();

    // DOALL declines on the carried store-to-load flow
    assert!(!report.candidates.is_empty());
    assert!(report.candidates.iter().all(|c| c.critic != CriticKind::Doall));
    assert!(report.candidates.iter().all(|c| c.stages > 1));

    let strategy = report.strategy().expect("a pipeline is always possible");
    assert_ne!(strategy.critic(), CriticKind::Doall);
    let pdg = static_pdg(inputs.context(&program), &config, LoopId(0));
    assert_plan_covers_loop(&strategy.plan, &program, LoopId(0));
    assert_no_backward_edges(&strategy.plan, &pdg);
    assert_remedies_cover(strategy);

    // the accumulator component runs whole in one sequential stage
    let stage = strategy.plan.stage_of(OpId(3)).unwrap();
    assert_eq!(strategy.plan.stage_of(OpId(4)), Some(stage));
    assert_eq!(strategy.plan.stage_of(OpId(5)), Some(stage));
    assert!(!strategy.plan.stages[stage].is_parallel());
}

#[test]
fn test_every_preset_plans_the_copy_loop() {
    let program = copy_loop();
    let inputs = Inputs::default();
    for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough] {
        let config = PlannerConfig::preset(preset);
        let report = orchestrator(config.clone())
            .plan_loop(inputs.context(&program), LoopId(0))
            .unwrap();
        assert!(report.phase().is_terminal());
        assert_eq!(report.phases.first(), Some(&PlanningPhase::BuildPdg));
        if let Some(strategy) = report.strategy() {
            let pdg = static_pdg(inputs.context(&program), &config, LoopId(0));
            assert_plan_covers_loop(&strategy.plan, &program, LoopId(0));
            assert_no_backward_edges(&strategy.plan, &pdg);
            assert_remedies_cover(strategy);
        }
    }
}

#[test]
fn test_report_serializes() {
    let program = counted_loop();
    let inputs = Inputs::default();
    let report = orchestrator(PlannerConfig::preset(Preset::Fast))
        .plan_loop(inputs.context(&program), LoopId(0))
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["loop_name"], "f::body");
    assert!(json["phases"].is_array());
}

#[test]
fn test_program_json_matches_builder() {
    let parsed = Program::from_json_str(COUNTED_LOOP_JSON).unwrap();
    assert_eq!(parsed.definition(), counted_loop().definition());

    let text = serde_json::to_string(&parsed).unwrap();
    let again = Program::from_json_str(&text).unwrap();
    assert_eq!(again.definition(), parsed.definition());
}

#[test]
fn test_program_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.json");
    std::fs::write(&path, COUNTED_LOOP_JSON).unwrap();
    let program = Program::from_json_file(&path).unwrap();
    assert_eq!(program.loops().len(), 1);
    assert_eq!(program.loop_name(LoopId(0)), "f::body");
}

#[test]
fn test_malformed_inputs_are_errors() {
    assert!(Program::from_json_str("{").is_err());

    let mut def = counted_loop_builder().build_def();
    def.operations[3].operands.push(OpId(99));
    let err = Program::new(def).unwrap_err();
    assert!(matches!(err, PlannerError::MalformedInput(_)), "got {}", err);

    let program = counted_loop();
    let inputs = Inputs::default();
    let err = orchestrator(PlannerConfig::preset(Preset::Fast))
        .plan_loop(inputs.context(&program), LoopId(1))
        .unwrap_err();
    assert!(matches!(err, PlannerError::MalformedInput(_)));
}

#[test]
fn test_profile_must_fit_program() {
    let program = counted_loop();
    let good = ProfileBuilder::new(100)
        .with_loop_time("f::body", 80)
        .with_op_count(3, 10)
        .build();
    assert!(good.validate_against(&program).is_ok());

    let unknown_op = ProfileBuilder::new(100).with_op_count(42, 1).build();
    assert!(matches!(
        unknown_op.validate_against(&program),
        Err(PlannerError::Profile(_))
    ));

    let too_long = ProfileBuilder::new(100).with_loop_time("f::body", 200).build();
    assert!(too_long.validate_against(&program).is_err());
}
