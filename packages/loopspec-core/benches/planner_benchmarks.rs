//! Planner benchmarks
//!
//! - PDG construction over loops of growing size
//! - Edmonds-Karp on layered networks
//! - Full per-loop planning
//! - Preset build

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use loopspec_core::config::{PlannerConfig, Preset};
use loopspec_core::features::dependence_oracle::build_chain;
use loopspec_core::features::orchestration::{LoopPlanner, Orchestrator};
use loopspec_core::features::partitioning::FlowNetwork;
use loopspec_core::features::partitioning::infrastructure::{SINK, SOURCE};
use loopspec_core::features::pdg::PdgBuilder;
use loopspec_core::shared::models::*;

// ============================================================================
// Synthetic programs
// ============================================================================

/// Counted loop whose body cycles through load, compute and store over
/// `objects` globals
fn synthetic_loop(body: u32, objects: u32) -> Program {
    let mut def = ProgramDef::default();
    def.functions.push(Function {
        id: FunctionId(0),
        name: "bench".into(),
        blocks: vec![BlockId(0), BlockId(1), BlockId(2)],
        arguments: vec![],
    });
    for (i, (name, succs)) in [("entry", vec![1]), ("body", vec![1, 2]), ("exit", vec![])]
        .into_iter()
        .enumerate()
    {
        def.blocks.push(Block {
            id: BlockId(i as u32),
            function: FunctionId(0),
            name: Some(name.into()),
            ops: vec![],
            succs: succs.into_iter().map(BlockId).collect(),
        });
    }
    for o in 0..objects {
        def.objects.push(AbstractObject {
            id: ObjectId(o),
            name: None,
            kind: ObjectKind::Global,
            owner: None,
            escapes: true,
        });
        def.pointers.push(PointerInfo {
            id: PtrId(o),
            name: None,
            targets: vec![ObjectId(o)],
            offset: Some(0),
        });
    }

    let step = 3 + body;
    let push = |def: &mut ProgramDef, block: u32, kind: OpKind, operands: Vec<u32>| {
        let id = OpId(def.operations.len() as u32);
        def.blocks[block as usize].ops.push(id);
        def.operations.push(
            Operation::new(id, BlockId(block), kind)
                .with_operands(operands.into_iter().map(OpId).collect()),
        );
    };
    push(&mut def, 0, OpKind::Compute, vec![]);
    push(&mut def, 0, OpKind::Branch { conditional: false }, vec![]);
    push(
        &mut def,
        1,
        OpKind::Phi {
            incoming: vec![BlockId(0), BlockId(1)],
        },
        vec![0, step],
    );
    let mut last = 2;
    for i in 0..body {
        let id = 3 + i;
        let access = MemAccess::new(PtrId(i % objects.max(1)), 4);
        match i % 3 {
            0 if objects > 0 => {
                push(&mut def, 1, OpKind::Load { access }, vec![]);
                last = id;
            }
            2 if objects > 0 => push(&mut def, 1, OpKind::Store { access }, vec![last]),
            _ => {
                push(&mut def, 1, OpKind::Compute, vec![last]);
                last = id;
            }
        }
    }
    push(&mut def, 1, OpKind::Compute, vec![2]);
    push(&mut def, 1, OpKind::Branch { conditional: true }, vec![step]);
    push(&mut def, 2, OpKind::Return, vec![]);
    def.loops.push(Loop {
        id: LoopId(0),
        function: FunctionId(0),
        header: BlockId(1),
        blocks: vec![BlockId(1)],
        parent: None,
        induction: Some(InductionVariable {
            phi: OpId(2),
            step: OpId(step),
            exit_branch: Some(OpId(step + 1)),
        }),
        reductions: vec![],
    });
    Program::new(def).expect("synthetic loop is well formed")
}

/// `layers` layers of `width` vertices, fully connected layer to layer
fn layered_network(layers: usize, width: usize) -> FlowNetwork {
    let mut net = FlowNetwork::new();
    let vertex = |layer: usize, i: usize| 2 + layer * width + i;
    for i in 0..width {
        net.add_edge(SOURCE, vertex(0, i), 10 + i as u64);
        net.add_edge(vertex(layers - 1, i), SINK, 10 + i as u64);
    }
    for layer in 0..layers - 1 {
        for i in 0..width {
            for j in 0..width {
                net.add_edge(vertex(layer, i), vertex(layer + 1, j), 1 + ((i * j) % 7) as u64);
            }
        }
    }
    net
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_pdg_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("pdg_construction");
    let config = PlannerConfig::preset(Preset::Balanced);
    let profile = ExecutionProfile::new(1000);
    let heap = HeapAssignment::new();

    for body in [8u32, 32, 96] {
        let program = synthetic_loop(body, 4);
        group.throughput(Throughput::Elements(u64::from(body)));
        group.bench_with_input(BenchmarkId::from_parameter(body), &program, |b, program| {
            b.iter(|| {
                let ctx = ProgramContext::new(program, &profile, &heap);
                let chain = build_chain(ctx, &config.oracle, false);
                let pdg = PdgBuilder::new(program, &chain).build(LoopId(0));
                black_box(pdg.stats())
            });
        });
    }
    group.finish();
}

fn bench_min_cut(c: &mut Criterion) {
    let mut group = c.benchmark_group("min_cut");
    for width in [4usize, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                let mut net = layered_network(4, width);
                black_box(net.max_flow());
                black_box(net.min_cut())
            });
        });
    }
    group.finish();
}

fn bench_plan_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_loop");
    let profile = ExecutionProfile::new(1000);
    let heap = HeapAssignment::new();

    for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough] {
        let orchestrator = Orchestrator::new(
            PlannerConfig::preset(preset)
                .build()
                .expect("presets validate"),
        );
        let program = synthetic_loop(24, 3);
        group.bench_function(BenchmarkId::from_parameter(format!("{:?}", preset)), |b| {
            b.iter(|| {
                let ctx = ProgramContext::new(&program, &profile, &heap);
                black_box(orchestrator.plan_loop(ctx, LoopId(0)))
            });
        });
    }
    group.finish();
}

fn bench_preset_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("preset_build");
    for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", preset)),
            &preset,
            |b, &preset| b.iter(|| black_box(PlannerConfig::preset(preset).build())),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_pdg_construction,
    bench_min_cut,
    bench_plan_loop,
    bench_preset_build
);
criterion_main!(benches);
