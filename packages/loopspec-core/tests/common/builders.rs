//! Test data builders
//!
//! Programs and profiles assembled through the public model types. Ids are
//! handed out in insertion order, so a test can refer to the n-th block or
//! operation by number.

use loopspec_core::shared::models::*;

/// Builder for a multi-function `Program`
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    def: ProgramDef,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    /// Start with one empty function named `f`
    pub fn new() -> Self {
        Self {
            def: ProgramDef::default(),
        }
        .with_function("f")
    }

    pub fn with_function(mut self, name: &str) -> Self {
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
    pub fn with_block(mut self, name: &str, succs: &[u32]) -> Self {
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

    pub fn with_op(mut self, block: u32, kind: OpKind, operands: &[u32]) -> Self {
        let id = OpId(self.def.operations.len() as u32);
        self.def.blocks[block as usize].ops.push(id);
        self.def.operations.push(
            Operation::new(id, BlockId(block), kind)
                .with_operands(operands.iter().copied().map(OpId).collect()),
        );
        self
    }

    pub fn with_global(mut self, name: &str) -> Self {
        let id = ObjectId(self.def.objects.len() as u32);
        self.def.objects.push(AbstractObject {
            id,
            name: Some(name.into()),
            kind: ObjectKind::Global,
            owner: None,
            escapes: true,
        });
        self
    }

    /// Pointer to `targets` at offset 0; no targets means unknown
    pub fn with_pointer(mut self, targets: &[u32]) -> Self {
        let id = PtrId(self.def.pointers.len() as u32);
        self.def.pointers.push(PointerInfo {
            id,
            name: None,
            targets: targets.iter().copied().map(ObjectId).collect(),
            offset: (!targets.is_empty()).then_some(0),
        });
        self
    }

    pub fn with_loop(mut self, header: u32, blocks: &[u32], parent: Option<u32>) -> Self {
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

    /// Counted induction variable of the most recent loop
    pub fn with_induction(mut self, phi: u32, step: u32, exit_branch: Option<u32>) -> Self {
        if let Some(l) = self.def.loops.last_mut() {
            l.induction = Some(InductionVariable {
                phi: OpId(phi),
                step: OpId(step),
                exit_branch: exit_branch.map(OpId),
            });
        }
        self
    }

    pub fn with_reduction(mut self, phi: u32, update: u32, operator: ReductionOperator) -> Self {
        if let Some(l) = self.def.loops.last_mut() {
            l.reductions.push(RegisterReduction {
                phi: OpId(phi),
                update: OpId(update),
                operator,
            });
        }
        self
    }

    pub fn definition(&self) -> &ProgramDef {
        &self.def
    }

    pub fn build_def(self) -> ProgramDef {
        self.def
    }

    pub fn build(self) -> Program {
        Program::new(self.def).expect("builder produced a malformed program")
    }
}

/// Builder for an `ExecutionProfile`
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    profile: ExecutionProfile,
}

impl ProfileBuilder {
    pub fn new(total_time: u64) -> Self {
        Self {
            profile: ExecutionProfile::new(total_time),
        }
    }

    pub fn with_loop_time(mut self, loop_name: &str, time: u64) -> Self {
        self.profile.loop_times.insert(loop_name.into(), time);
        self
    }

    pub fn with_op_count(mut self, op: u32, count: u64) -> Self {
        self.profile.op_counts.insert(OpId(op), count);
        self
    }

    pub fn build(self) -> ExecutionProfile {
        self.profile
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

pub fn call_internal(function: u32) -> OpKind {
    OpKind::Call {
        callee: Callee::Internal {
            function: FunctionId(function),
        },
    }
}
