//! Canonical programs for integration tests

use super::builders::*;
use loopspec_core::shared::models::*;

/// Profile and heap classes with no measurements
pub struct Inputs {
    pub profile: ExecutionProfile,
    pub heap: HeapAssignment,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            profile: ExecutionProfile::new(1000),
            heap: HeapAssignment::default(),
        }
    }
}

impl Inputs {
    pub fn with_profile(profile: ExecutionProfile) -> Self {
        Self {
            profile,
            heap: HeapAssignment::default(),
        }
    }

    pub fn context<'a>(&'a self, program: &'a Program) -> ProgramContext<'a> {
        ProgramContext::new(program, &self.profile, &self.heap)
    }
}

/// ```text
/// bb0 entry: op0 init; op1 br bb1
/// bb1 body:  op2 i = phi [bb0: op0, bb1: op4]; op3 a = compute i
///            op4 i' = compute i; op5 b = compute a; op6 br? bb1, bb2
/// bb2 exit:  op7 ret
/// ```
/// Loop 0 = {bb1}, no memory, counted IV (op2, op4, exit op6)
pub fn counted_loop() -> Program {
    counted_loop_builder().build()
}

pub fn counted_loop_builder() -> ProgramBuilder {
    ProgramBuilder::new()
        .with_block("entry", &[1])
        .with_block("body", &[1, 2])
        .with_block("exit", &[])
        .with_op(0, OpKind::Compute, &[])
        .with_op(0, branch(false), &[])
        .with_op(1, phi(&[0, 1]), &[0, 4])
        .with_op(1, OpKind::Compute, &[2])
        .with_op(1, OpKind::Compute, &[2])
        .with_op(1, OpKind::Compute, &[3])
        .with_op(1, branch(true), &[4])
        .with_op(2, OpKind::Return, &[])
        .with_loop(1, &[1], None)
        .with_induction(2, 4, Some(6))
}

/// `counted_loop` in its serialized form
pub const COUNTED_LOOP_JSON: &str = r#"{
  "functions": [{ "id": 0, "name": "f", "blocks": [0, 1, 2] }],
  "blocks": [
    { "id": 0, "function": 0, "name": "entry", "ops": [0, 1], "succs": [1] },
    { "id": 1, "function": 0, "name": "body", "ops": [2, 3, 4, 5, 6], "succs": [1, 2] },
    { "id": 2, "function": 0, "name": "exit", "ops": [7] }
  ],
  "operations": [
    { "id": 0, "block": 0, "op": "compute" },
    { "id": 1, "block": 0, "op": "branch", "conditional": false },
    { "id": 2, "block": 1, "op": "phi", "incoming": [0, 1], "operands": [0, 4] },
    { "id": 3, "block": 1, "op": "compute", "operands": [2] },
    { "id": 4, "block": 1, "op": "compute", "operands": [2] },
    { "id": 5, "block": 1, "op": "compute", "operands": [3] },
    { "id": 6, "block": 1, "op": "branch", "conditional": true, "operands": [4] },
    { "id": 7, "block": 2, "op": "return" }
  ],
  "loops": [
    {
      "id": 0,
      "function": 0,
      "header": 1,
      "blocks": [1],
      "induction": { "phi": 2, "step": 4, "exit_branch": 6 }
    }
  ]
}"#;

/// ```text
/// bb1 body: op2 i = phi [bb0: op0, bb1: op5]; op3 x = load a[i]
///           op4 store b[i] <- x; op5 i' = compute i; op6 br? bb1, bb2
/// ```
/// `a` and `b` are distinct globals behind p0 and p1
pub fn copy_loop() -> Program {
    ProgramBuilder::new()
        .with_block("entry", &[1])
        .with_block("body", &[1, 2])
        .with_block("exit", &[])
        .with_global("a")
        .with_global("b")
        .with_pointer(&[0])
        .with_pointer(&[1])
        .with_op(0, OpKind::Compute, &[])
        .with_op(0, branch(false), &[])
        .with_op(1, phi(&[0, 1]), &[0, 5])
        .with_op(1, load(0), &[2])
        .with_op(1, store(1), &[3, 2])
        .with_op(1, OpKind::Compute, &[2])
        .with_op(1, branch(true), &[5])
        .with_op(2, OpKind::Return, &[])
        .with_loop(1, &[1], None)
        .with_induction(2, 5, Some(6))
        .build()
}

/// ```text
/// bb1 body: op2 i = phi [bb0: op0, bb1: op6]; op3 x = load g
///           op4 y = compute x; op5 store g <- y; op6 i' = compute i
///           op7 br? bb1, bb2
/// ```
/// Every iteration reads what the previous one stored through p0
pub fn accumulator_loop() -> Program {
    ProgramBuilder::new()
        .with_block("entry", &[1])
        .with_block("body", &[1, 2])
        .with_block("exit", &[])
        .with_global("g")
        .with_pointer(&[0])
        .with_op(0, OpKind::Compute, &[])
        .with_op(0, branch(false), &[])
        .with_op(1, phi(&[0, 1]), &[0, 6])
        .with_op(1, load(0), &[])
        .with_op(1, OpKind::Compute, &[3])
        .with_op(1, store(0), &[4])
        .with_op(1, OpKind::Compute, &[2])
        .with_op(1, branch(true), &[6])
        .with_op(2, OpKind::Return, &[])
        .with_loop(1, &[1], None)
        .with_induction(2, 6, Some(7))
        .build()
}

/// Two memory-free counted loops, one after the other
///
/// ```text
/// bb0 entry: op0 init; op1 br bb1
/// bb1 first:  op2..op6 (phi, compute, step, compute, br? bb1, bb2)
/// bb2 second: op7..op11 (phi, compute, step, compute, br? bb2, bb3)
/// bb3 exit:  op12 ret
/// ```
pub fn two_loops() -> Program {
    ProgramBuilder::new()
        .with_block("entry", &[1])
        .with_block("first", &[1, 2])
        .with_block("second", &[2, 3])
        .with_block("exit", &[])
        .with_op(0, OpKind::Compute, &[])
        .with_op(0, branch(false), &[])
        .with_op(1, phi(&[0, 1]), &[0, 4])
        .with_op(1, OpKind::Compute, &[2])
        .with_op(1, OpKind::Compute, &[2])
        .with_op(1, OpKind::Compute, &[3])
        .with_op(1, branch(true), &[4])
        .with_op(2, phi(&[1, 2]), &[0, 9])
        .with_op(2, OpKind::Compute, &[7])
        .with_op(2, OpKind::Compute, &[7])
        .with_op(2, OpKind::Compute, &[8])
        .with_op(2, branch(true), &[9])
        .with_op(3, OpKind::Return, &[])
        .with_loop(1, &[1], None)
        .with_induction(2, 4, Some(6))
        .with_loop(2, &[2], None)
        .with_induction(7, 9, Some(11))
        .build()
}

/// ```text
/// fn0 f:    bb0: op0 init; op1 br bb1
///           bb1: op2 i = phi [bb0: op0, bb1: op4]; op3 r = call work(i)
///                op4 i' = compute r; op5 br? bb1, bb2
///           bb2: op6 ret
/// fn1 work: bb3: op7 arg; op8 compute arg; op9 ret op8
/// ```
pub fn calling_loop() -> Program {
    let mut def = ProgramBuilder::new()
        .with_block("entry", &[1])
        .with_block("body", &[1, 2])
        .with_block("exit", &[])
        .with_function("work")
        .with_block("work", &[])
        .with_op(0, OpKind::Compute, &[])
        .with_op(0, branch(false), &[])
        .with_op(1, phi(&[0, 1]), &[0, 4])
        .with_op(1, call_internal(1), &[2])
        .with_op(1, OpKind::Compute, &[3])
        .with_op(1, branch(true), &[])
        .with_op(2, OpKind::Return, &[])
        .with_op(3, OpKind::Argument, &[])
        .with_op(3, OpKind::Compute, &[7])
        .with_op(3, OpKind::Return, &[8])
        .with_loop(1, &[1], None)
        .build_def();
    def.functions[1].arguments.push(OpId(7));
    Program::new(def).expect("calling loop is well formed")
}
