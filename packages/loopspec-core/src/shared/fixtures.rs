//! Test fixtures: a compact program builder and a few canonical loops

use crate::shared::models::*;

/// Incremental single-function program builder. Ids are assigned in
/// insertion order.
pub struct ProgramSketch {
    def: ProgramDef,
}

impl Default for ProgramSketch {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramSketch {
    pub fn new() -> Self {
        Self {
            def: ProgramDef {
                functions: vec![Function {
                    id: FunctionId(0),
                    name: "f".into(),
                    blocks: vec![],
                    arguments: vec![],
                }],
                ..ProgramDef::default()
            },
        }
    }

    pub fn function(mut self, name: &str) -> Self {
        let id = FunctionId(self.def.functions.len() as u32);
        self.def.functions.push(Function {
            id,
            name: name.into(),
            blocks: vec![],
            arguments: vec![],
        });
        self
    }

    /// Block of the most recently added function
    pub fn block(mut self, name: &str, succs: &[u32]) -> Self {
        let id = BlockId(self.def.blocks.len() as u32);
        let function = FunctionId(self.def.functions.len() as u32 - 1);
        self.def.functions[function.index()].blocks.push(id);
        self.def.blocks.push(Block {
            id,
            function,
            name: Some(name.into()),
            ops: vec![],
            succs: succs.iter().copied().map(BlockId).collect(),
        });
        self
    }

    pub fn op(mut self, block: u32, kind: OpKind, operands: &[u32]) -> Self {
        let id = OpId(self.def.operations.len() as u32);
        self.def.blocks[block as usize].ops.push(id);
        self.def.operations.push(
            Operation::new(id, BlockId(block), kind)
                .with_operands(operands.iter().copied().map(OpId).collect()),
        );
        self
    }

    /// Global object
    pub fn object(mut self) -> Self {
        let id = ObjectId(self.def.objects.len() as u32);
        self.def.objects.push(AbstractObject {
            id,
            name: None,
            kind: ObjectKind::Global,
            owner: None,
            escapes: true,
        });
        self
    }

    /// Pointer to `targets` at offset 0 (no targets = unknown)
    pub fn pointer(mut self, targets: &[u32]) -> Self {
        let id = PtrId(self.def.pointers.len() as u32);
        self.def.pointers.push(PointerInfo {
            id,
            name: None,
            targets: targets.iter().copied().map(ObjectId).collect(),
            offset: (!targets.is_empty()).then_some(0),
        });
        self
    }

    /// Declare `op` as the next parameter of `function`
    pub fn argument(mut self, function: u32, op: u32) -> Self {
        self.def.functions[function as usize].arguments.push(OpId(op));
        self
    }

    pub fn natural_loop(mut self, header: u32, blocks: &[u32], parent: Option<u32>) -> Self {
        let id = LoopId(self.def.loops.len() as u32);
        let function = self.def.blocks[header as usize].function;
        self.def.loops.push(Loop {
            id,
            function,
            header: BlockId(header),
            blocks: blocks.iter().copied().map(BlockId).collect(),
            parent: parent.map(LoopId),
            induction: None,
            reductions: vec![],
        });
        self
    }

    /// Attach a counted induction variable to the most recent loop
    pub fn induction(mut self, phi: u32, step: u32, exit_branch: Option<u32>) -> Self {
        if let Some(l) = self.def.loops.last_mut() {
            l.induction = Some(InductionVariable {
                phi: OpId(phi),
                step: OpId(step),
                exit_branch: exit_branch.map(OpId),
            });
        }
        self
    }

    /// Attach a register reduction to the most recent loop
    pub fn reduction(mut self, phi: u32, update: u32, operator: ReductionOperator) -> Self {
        if let Some(l) = self.def.loops.last_mut() {
            l.reductions.push(RegisterReduction {
                phi: OpId(phi),
                update: OpId(update),
                operator,
            });
        }
        self
    }

    pub fn build(self) -> Program {
        Program::new(self.def).unwrap()
    }
}

pub fn load(ptr: u32) -> OpKind {
    OpKind::Load {
        access: MemAccess::new(PtrId(ptr), 4),
    }
}

pub fn store(ptr: u32) -> OpKind {
    OpKind::Store {
        access: MemAccess::new(PtrId(ptr), 4),
    }
}

pub fn phi(incoming: &[u32]) -> OpKind {
    OpKind::Phi {
        incoming: incoming.iter().copied().map(BlockId).collect(),
    }
}

pub fn branch(conditional: bool) -> OpKind {
    OpKind::Branch { conditional }
}

pub fn call_external(name: &str, effect: ExternalEffect) -> OpKind {
    OpKind::Call {
        callee: Callee::External {
            name: name.into(),
            effect,
        },
    }
}

pub fn call_internal(function: u32) -> OpKind {
    OpKind::Call {
        callee: Callee::Internal {
            function: FunctionId(function),
        },
    }
}

/// ```text
/// bb0 entry:  op0 init = compute; op1 br bb1
/// bb1 header: op2 i = phi [bb0: op0, bb3: op9]; op3 x = load p0; op4 br? bb2, bb3
/// bb2 then:   op5 store p1 <- x; op6 br bb3
/// bb3 latch:  op7 y = phi [bb1: op2, bb2: op3]; op8 compute y;
///             op9 i' = compute i; op10 br? bb1, bb4
/// bb4 exit:   op11 ret
/// ```
/// Loop 0 is {bb1, bb2, bb3} with counted IV (op2, op9, exit op10);
/// p0 -> obj0, p1 -> obj1.
pub fn diamond_loop() -> Program {
    ProgramSketch::new()
        .block("entry", &[1])
        .block("header", &[2, 3])
        .block("then", &[3])
        .block("latch", &[1, 4])
        .block("exit", &[])
        .object()
        .object()
        .pointer(&[0])
        .pointer(&[1])
        .op(0, OpKind::Compute, &[])
        .op(0, branch(false), &[])
        .op(1, phi(&[0, 3]), &[0, 9])
        .op(1, load(0), &[])
        .op(1, branch(true), &[3])
        .op(2, store(1), &[3])
        .op(2, branch(false), &[])
        .op(3, phi(&[1, 2]), &[2, 3])
        .op(3, OpKind::Compute, &[7])
        .op(3, OpKind::Compute, &[2])
        .op(3, branch(true), &[9])
        .op(4, OpKind::Return, &[])
        .natural_loop(1, &[1, 2, 3], None)
        .induction(2, 9, Some(10))
        .build()
}

/// ```text
/// bb0 entry:  op0 init = compute; op1 br bb1
/// bb1 header: op2 i = phi [bb0: op0, bb1: op7]; op3 s = phi [bb0: op0, bb1: op6]
///             op4 x = load p0; op5 store p1 <- x; op6 s' = compute s, x
///             op7 i' = compute i; op8 br? bb1, bb2
/// bb2 exit:   op9 ret
/// ```
/// Loop 0 = {bb1}; counted IV (op2, op7, exit op8); register sum reduction
/// (op3, op6); p0 -> obj0, p1 -> obj1.
pub fn streaming_loop() -> Program {
    ProgramSketch::new()
        .block("entry", &[1])
        .block("body", &[1, 2])
        .block("exit", &[])
        .object()
        .object()
        .pointer(&[0])
        .pointer(&[1])
        .op(0, OpKind::Compute, &[])
        .op(0, branch(false), &[])
        .op(1, phi(&[0, 1]), &[0, 7])
        .op(1, phi(&[0, 1]), &[0, 6])
        .op(1, load(0), &[2])
        .op(1, store(1), &[4, 2])
        .op(1, OpKind::Compute, &[3, 4])
        .op(1, OpKind::Compute, &[2])
        .op(1, branch(true), &[7])
        .op(2, OpKind::Return, &[])
        .natural_loop(1, &[1], None)
        .induction(2, 7, Some(8))
        .reduction(3, 6, ReductionOperator::Add)
        .build()
}

/// Estimator-free context pieces for unit tests
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
    pub fn context<'a>(&'a self, program: &'a Program) -> ProgramContext<'a> {
        ProgramContext::new(program, &self.profile, &self.heap)
    }
}

/// ```text
/// bb0 entry:  op0 init = compute; op1 br bb1
/// bb1 body:   op2 i = phi [bb0: op0, bb1: op4]; op3 a = compute i
///             op4 i' = compute i; op5 b = compute a; op6 br? bb1, bb2
/// bb2 exit:   op7 ret
/// ```
/// Loop 0 = {bb1}, no memory; counted IV (op2, op4, exit op6).
pub fn counted_loop() -> Program {
    ProgramSketch::new()
        .block("entry", &[1])
        .block("body", &[1, 2])
        .block("exit", &[])
        .op(0, OpKind::Compute, &[])
        .op(0, branch(false), &[])
        .op(1, phi(&[0, 1]), &[0, 4])
        .op(1, OpKind::Compute, &[2])
        .op(1, OpKind::Compute, &[2])
        .op(1, OpKind::Compute, &[3])
        .op(1, branch(true), &[4])
        .op(2, OpKind::Return, &[])
        .natural_loop(1, &[1], None)
        .induction(2, 4, Some(6))
        .build()
}

/// ```text
/// fn0 f:     bb0 -> bb1 (outer) -> bb2 (inner, self loop) -> bb1 | bb3
///            bb4 -> bb4 (sibling, calls fn1) -> bb5
/// fn1 work:  bb6 -> bb6 (loop) -> bb7
/// ```
/// Loop 0 = {bb1, bb2} holds loop 1 = {bb2}; loop 2 = {bb4} calls fn1,
/// whose loop 3 = {bb6}.
pub fn loop_nest() -> Program {
    ProgramSketch::new()
        .block("entry", &[1])
        .block("outer", &[2])
        .block("inner", &[2, 1, 3])
        .block("mid", &[4])
        .block("sibling", &[4, 5])
        .block("exit", &[])
        .function("work")
        .block("work_loop", &[6, 7])
        .block("work_exit", &[])
        .op(0, branch(false), &[])
        .op(1, branch(false), &[])
        .op(2, OpKind::Compute, &[])
        .op(2, OpKind::Switch, &[])
        .op(3, branch(false), &[])
        .op(4, call_internal(1), &[])
        .op(4, branch(true), &[])
        .op(5, OpKind::Return, &[])
        .op(6, OpKind::Compute, &[])
        .op(6, branch(true), &[])
        .op(7, OpKind::Return, &[])
        .natural_loop(1, &[1, 2], None)
        .natural_loop(2, &[2], Some(0))
        .natural_loop(4, &[4], None)
        .natural_loop(6, &[6], None)
        .build()
}

/// ```text
/// fn0 f:    bb0: op0 init; op1 br bb1
///           bb1: op2 phi [bb0: op0, bb1: op4]; op3 r = call work(op2)
///                op4 compute r; op5 br? bb1, bb2
///           bb2: op6 ret
/// fn1 work: bb3: op7 arg; op8 compute op7; op9 ret op8
/// ```
/// Loop 0 = {bb1}; op7 is fn1's parameter.
pub fn calling_loop() -> Program {
    ProgramSketch::new()
        .block("entry", &[1])
        .block("body", &[1, 2])
        .block("exit", &[])
        .function("work")
        .block("work", &[])
        .op(0, OpKind::Compute, &[])
        .op(0, branch(false), &[])
        .op(1, phi(&[0, 1]), &[0, 4])
        .op(1, call_internal(1), &[2])
        .op(1, OpKind::Compute, &[3])
        .op(1, branch(true), &[])
        .op(2, OpKind::Return, &[])
        .op(3, OpKind::Argument, &[])
        .op(3, OpKind::Compute, &[7])
        .op(3, OpKind::Return, &[8])
        .argument(1, 7)
        .natural_loop(1, &[1], None)
        .build()
}
