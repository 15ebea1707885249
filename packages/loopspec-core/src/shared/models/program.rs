//! Host program model
//!
//! Functions, blocks, operations, natural loops, pointer facts and abstract
//! objects. A `Program` is loaded from its serialized definition and indexed
//! once; every query after that is a lookup.
//!
//! Derived data:
//! - block predecessors and operation positions
//! - loop block sets and nesting depth
//! - transitive memory effects per function
//! - call-graph reachability

use super::heap::ReductionOperator;
use super::ids::{BlockId, FunctionId, LoopId, ObjectId, OpId, PtrId};
use super::operation::{Callee, OpKind, Operation};
use crate::errors::{PlannerError, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    /// First block is the entry
    pub blocks: Vec<BlockId>,
    #[serde(default)]
    pub arguments: Vec<OpId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub function: FunctionId,
    #[serde(default)]
    pub name: Option<String>,
    pub ops: Vec<OpId>,
    #[serde(default)]
    pub succs: Vec<BlockId>,
}

/// Counted induction variable of a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InductionVariable {
    /// Header phi
    pub phi: OpId,
    /// Step operation feeding the phi's back-edge operand
    pub step: OpId,
    /// Exit branch whose condition only depends on the IV
    #[serde(default)]
    pub exit_branch: Option<OpId>,
}

/// Register reduction recognized on a header phi
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterReduction {
    pub phi: OpId,
    pub update: OpId,
    pub operator: ReductionOperator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loop {
    pub id: LoopId,
    pub function: FunctionId,
    pub header: BlockId,
    pub blocks: Vec<BlockId>,
    #[serde(default)]
    pub parent: Option<LoopId>,
    #[serde(default)]
    pub induction: Option<InductionVariable>,
    #[serde(default)]
    pub reductions: Vec<RegisterReduction>,
}

/// Pointer facts: the objects a pointer may address and a constant offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerInfo {
    pub id: PtrId,
    #[serde(default)]
    pub name: Option<String>,
    /// Empty means "anything"
    #[serde(default)]
    pub targets: Vec<ObjectId>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl PointerInfo {
    pub fn is_unknown(&self) -> bool {
        self.targets.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Global,
    Stack,
    Heap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractObject {
    pub id: ObjectId,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: ObjectKind,
    /// Function whose frame or allocation site owns the object
    #[serde(default)]
    pub owner: Option<FunctionId>,
    /// Whether the object outlives or is visible outside `owner`
    #[serde(default = "default_escapes")]
    pub escapes: bool,
}

fn default_escapes() -> bool {
    true
}

/// Memory touched by a function and everything it calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryEffects {
    pub reads: bool,
    pub writes: bool,
}

impl MemoryEffects {
    fn merge(&mut self, other: MemoryEffects) -> bool {
        let before = *self;
        self.reads |= other.reads;
        self.writes |= other.writes;
        before != *self
    }
}

/// Serialized form of a program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDef {
    pub functions: Vec<Function>,
    pub blocks: Vec<Block>,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub loops: Vec<Loop>,
    #[serde(default)]
    pub pointers: Vec<PointerInfo>,
    #[serde(default)]
    pub objects: Vec<AbstractObject>,
}

/// Indexed host program
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ProgramDef", into = "ProgramDef")]
pub struct Program {
    def: ProgramDef,
    preds: Vec<Vec<BlockId>>,
    op_position: Vec<usize>,
    loop_blocks: Vec<FxHashSet<BlockId>>,
    loop_depth: Vec<u32>,
    effects: Vec<MemoryEffects>,
    direct_callees: Vec<FxHashSet<FunctionId>>,
    function_by_name: FxHashMap<String, FunctionId>,
}

impl From<Program> for ProgramDef {
    fn from(p: Program) -> Self {
        p.def
    }
}

impl TryFrom<ProgramDef> for Program {
    type Error = PlannerError;

    fn try_from(def: ProgramDef) -> Result<Self> {
        Program::new(def)
    }
}

fn check_index(kind: &str, position: usize, id: usize) -> Result<()> {
    if position != id {
        return Err(PlannerError::malformed(format!(
            "{} at position {} carries id {}",
            kind, position, id
        )));
    }
    Ok(())
}

impl Program {
    /// Validate ids and build the derived indices
    pub fn new(def: ProgramDef) -> Result<Self> {
        for (i, f) in def.functions.iter().enumerate() {
            check_index("function", i, f.id.index())?;
        }
        for (i, b) in def.blocks.iter().enumerate() {
            check_index("block", i, b.id.index())?;
        }
        for (i, o) in def.operations.iter().enumerate() {
            check_index("operation", i, o.id.index())?;
        }
        for (i, l) in def.loops.iter().enumerate() {
            check_index("loop", i, l.id.index())?;
        }
        for (i, p) in def.pointers.iter().enumerate() {
            check_index("pointer", i, p.id.index())?;
        }
        for (i, o) in def.objects.iter().enumerate() {
            check_index("object", i, o.id.index())?;
        }

        let nb = def.blocks.len();
        let no = def.operations.len();

        let mut preds = vec![Vec::new(); nb];
        for b in &def.blocks {
            if b.function.index() >= def.functions.len() {
                return Err(PlannerError::malformed(format!(
                    "block {} belongs to unknown function {}",
                    b.id, b.function
                )));
            }
            for s in &b.succs {
                if s.index() >= nb {
                    return Err(PlannerError::malformed(format!(
                        "block {} has unknown successor {}",
                        b.id, s
                    )));
                }
                preds[s.index()].push(b.id);
            }
        }

        let mut op_position = vec![0usize; no];
        for b in &def.blocks {
            for (pos, op) in b.ops.iter().enumerate() {
                let owner = def.operations.get(op.index()).ok_or_else(|| {
                    PlannerError::malformed(format!("block {} lists unknown op {}", b.id, op))
                })?;
                if owner.block != b.id {
                    return Err(PlannerError::malformed(format!(
                        "op {} listed in {} but claims block {}",
                        op, b.id, owner.block
                    )));
                }
                op_position[op.index()] = pos;
            }
        }

        for op in &def.operations {
            for operand in &op.operands {
                if operand.index() >= no {
                    return Err(PlannerError::malformed(format!(
                        "op {} uses unknown operand {}",
                        op.id, operand
                    )));
                }
            }
            if let Some(access) = op.direct_access() {
                if access.ptr.index() >= def.pointers.len() {
                    return Err(PlannerError::malformed(format!(
                        "op {} accesses unknown pointer {}",
                        op.id, access.ptr
                    )));
                }
            }
            if let OpKind::Phi { incoming } = &op.kind {
                if incoming.len() != op.operands.len() {
                    return Err(PlannerError::malformed(format!(
                        "phi {} has {} operands but {} incoming blocks",
                        op.id,
                        op.operands.len(),
                        incoming.len()
                    )));
                }
            }
        }

        let mut loop_blocks = Vec::with_capacity(def.loops.len());
        for l in &def.loops {
            let set: FxHashSet<BlockId> = l.blocks.iter().copied().collect();
            if !set.contains(&l.header) {
                return Err(PlannerError::malformed(format!(
                    "loop {} does not contain its header {}",
                    l.id, l.header
                )));
            }
            loop_blocks.push(set);
        }

        let mut loop_depth = vec![0u32; def.loops.len()];
        for l in &def.loops {
            let mut depth = 1u32;
            let mut cur = l.parent;
            while let Some(p) = cur {
                depth += 1;
                if depth as usize > def.loops.len() {
                    return Err(PlannerError::malformed(format!(
                        "loop {} has a cyclic parent chain",
                        l.id
                    )));
                }
                cur = def
                    .loops
                    .get(p.index())
                    .ok_or_else(|| {
                        PlannerError::malformed(format!("loop {} has unknown parent {}", l.id, p))
                    })?
                    .parent;
            }
            loop_depth[l.id.index()] = depth;
        }

        let mut direct_callees = vec![FxHashSet::default(); def.functions.len()];
        let mut local_effects = vec![MemoryEffects::default(); def.functions.len()];
        for op in &def.operations {
            let f = def.blocks[op.block.index()].function.index();
            match &op.kind {
                OpKind::Load { .. } => local_effects[f].reads = true,
                OpKind::Store { .. } => local_effects[f].writes = true,
                OpKind::Call { callee } => match callee {
                    Callee::Internal { function } => {
                        if function.index() >= def.functions.len() {
                            return Err(PlannerError::malformed(format!(
                                "op {} calls unknown function {}",
                                op.id, function
                            )));
                        }
                        direct_callees[f].insert(*function);
                    }
                    Callee::External { effect, .. } => {
                        local_effects[f].reads |= effect.reads;
                        local_effects[f].writes |= effect.writes;
                    }
                    Callee::Indirect => {
                        local_effects[f].reads = true;
                        local_effects[f].writes = true;
                    }
                },
                _ => {}
            }
        }

        // Fixpoint over the call graph
        let mut effects = local_effects;
        let mut changed = true;
        while changed {
            changed = false;
            for f in 0..def.functions.len() {
                let mut acc = effects[f];
                for callee in &direct_callees[f] {
                    acc.merge(effects[callee.index()]);
                }
                if effects[f].merge(acc) {
                    changed = true;
                }
            }
        }

        let function_by_name = def
            .functions
            .iter()
            .map(|f| (f.name.clone(), f.id))
            .collect();

        Ok(Self {
            def,
            preds,
            op_position,
            loop_blocks,
            loop_depth,
            effects,
            direct_callees,
            function_by_name,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let def: ProgramDef = serde_json::from_str(text)?;
        Self::new(def)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn definition(&self) -> &ProgramDef {
        &self.def
    }

    // ═══════════════════════════════════════════════════════════════════
    // Entity access
    // ═══════════════════════════════════════════════════════════════════

    pub fn functions(&self) -> &[Function] {
        &self.def.functions
    }

    pub fn blocks(&self) -> &[Block] {
        &self.def.blocks
    }

    pub fn operations(&self) -> &[Operation] {
        &self.def.operations
    }

    pub fn loops(&self) -> &[Loop] {
        &self.def.loops
    }

    pub fn op(&self, id: OpId) -> &Operation {
        &self.def.operations[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.def.blocks[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.def.functions[id.index()]
    }

    pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
        self.function_by_name.get(name).copied()
    }

    pub fn loop_info(&self, id: LoopId) -> &Loop {
        &self.def.loops[id.index()]
    }

    pub fn pointer(&self, id: PtrId) -> &PointerInfo {
        &self.def.pointers[id.index()]
    }

    pub fn object(&self, id: ObjectId) -> Option<&AbstractObject> {
        self.def.objects.get(id.index())
    }

    pub fn preds(&self, block: BlockId) -> &[BlockId] {
        &self.preds[block.index()]
    }

    pub fn succs(&self, block: BlockId) -> &[BlockId] {
        &self.def.blocks[block.index()].succs
    }

    pub fn function_of_op(&self, op: OpId) -> FunctionId {
        self.block(self.op(op).block).function
    }

    /// Position of `op` inside its block
    pub fn position(&self, op: OpId) -> usize {
        self.op_position[op.index()]
    }

    pub fn terminator(&self, block: BlockId) -> Option<OpId> {
        let last = *self.block(block).ops.last()?;
        self.op(last).is_terminator().then_some(last)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Loops
    // ═══════════════════════════════════════════════════════════════════

    pub fn loop_contains_block(&self, loop_id: LoopId, block: BlockId) -> bool {
        self.loop_blocks[loop_id.index()].contains(&block)
    }

    pub fn loop_contains_op(&self, loop_id: LoopId, op: OpId) -> bool {
        self.loop_contains_block(loop_id, self.op(op).block)
    }

    /// Operations of the loop in block order
    pub fn loop_ops(&self, loop_id: LoopId) -> impl Iterator<Item = OpId> + '_ {
        self.loop_info(loop_id)
            .blocks
            .iter()
            .flat_map(move |b| self.block(*b).ops.iter().copied())
    }

    /// Nesting depth; outermost loops have depth 1
    pub fn loop_depth(&self, loop_id: LoopId) -> u32 {
        self.loop_depth[loop_id.index()]
    }

    /// "function::header" key used by profiles and reports
    pub fn loop_name(&self, loop_id: LoopId) -> String {
        let l = self.loop_info(loop_id);
        let header = self.block(l.header);
        let header_name = header
            .name
            .clone()
            .unwrap_or_else(|| header.id.to_string());
        format!("{}::{}", self.function(l.function).name, header_name)
    }

    /// Loop blocks with a successor outside the loop
    pub fn exiting_blocks(&self, loop_id: LoopId) -> Vec<BlockId> {
        self.loop_info(loop_id)
            .blocks
            .iter()
            .copied()
            .filter(|b| {
                self.succs(*b)
                    .iter()
                    .any(|s| !self.loop_contains_block(loop_id, *s))
            })
            .collect()
    }

    pub fn is_header_phi(&self, loop_id: LoopId, op: OpId) -> bool {
        let o = self.op(op);
        o.is_phi() && o.block == self.loop_info(loop_id).header
    }

    /// Loops nested at any depth inside `loop_id`
    pub fn subloops(&self, loop_id: LoopId) -> Vec<LoopId> {
        self.def
            .loops
            .iter()
            .filter(|l| {
                let mut cur = l.parent;
                while let Some(p) = cur {
                    if p == loop_id {
                        return true;
                    }
                    cur = self.loop_info(p).parent;
                }
                false
            })
            .map(|l| l.id)
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Memory effects
    // ═══════════════════════════════════════════════════════════════════

    pub fn function_effects(&self, f: FunctionId) -> MemoryEffects {
        self.effects[f.index()]
    }

    /// Memory effects of one operation, calls included transitively
    pub fn op_effects(&self, op: OpId) -> MemoryEffects {
        match &self.op(op).kind {
            OpKind::Load { .. } => MemoryEffects {
                reads: true,
                writes: false,
            },
            OpKind::Store { .. } => MemoryEffects {
                reads: false,
                writes: true,
            },
            OpKind::Call { callee } => match callee {
                Callee::Internal { function } => self.function_effects(*function),
                Callee::External { effect, .. } => MemoryEffects {
                    reads: effect.reads,
                    writes: effect.writes,
                },
                Callee::Indirect => MemoryEffects {
                    reads: true,
                    writes: true,
                },
            },
            _ => MemoryEffects::default(),
        }
    }

    pub fn may_read_memory(&self, op: OpId) -> bool {
        self.op_effects(op).reads
    }

    pub fn may_write_memory(&self, op: OpId) -> bool {
        self.op_effects(op).writes
    }

    pub fn touches_memory(&self, op: OpId) -> bool {
        let e = self.op_effects(op);
        e.reads || e.writes
    }

    // ═══════════════════════════════════════════════════════════════════
    // Call graph
    // ═══════════════════════════════════════════════════════════════════

    pub fn direct_callees(&self, f: FunctionId) -> &FxHashSet<FunctionId> {
        &self.direct_callees[f.index()]
    }

    /// Functions reachable from `f` through one or more calls
    pub fn transitive_callees(&self, f: FunctionId) -> FxHashSet<FunctionId> {
        let mut seen = FxHashSet::default();
        let mut queue: VecDeque<FunctionId> = self.direct_callees(f).iter().copied().collect();
        while let Some(g) = queue.pop_front() {
            if seen.insert(g) {
                queue.extend(self.direct_callees(g).iter().copied());
            }
        }
        seen
    }

    /// Whether some call inside the loop reaches `target` transitively
    pub fn loop_may_call(&self, loop_id: LoopId, target: FunctionId) -> bool {
        self.loop_ops(loop_id).any(|op| match self.op(op).callee() {
            Some(Callee::Internal { function }) => {
                *function == target || self.transitive_callees(*function).contains(&target)
            }
            _ => false,
        })
    }
}
