//! Lazy interprocedural footprint search
//!
//! Walks the call tree below one call site and yields every memory effect
//! that may escape it, tagged with its calling context. The walk is an
//! explicit-stack DFS so it can stop after any element; `restart` rewinds
//! it without discarding interned contexts.
//!
//! Pruned:
//! - accesses that only touch non-escaping objects owned by a function on
//!   the current call path (private allocations)
//! - calls whose callee (transitively) touches no memory
//! - anything the optional `KillOracle` rejects
//!
//! When the deadline passes the search stops and reports `truncated()`;
//! callers must then answer conservatively.

use crate::features::footprint::domain::{ContextArena, CtxId, FootprintEntry, SearchOrder};
use crate::features::footprint::ports::KillOracle;
use crate::shared::models::{Callee, FunctionId, OpId, OpKind, Program};
use std::time::Instant;

struct Frame {
    function: FunctionId,
    ctx: CtxId,
    ops: Vec<OpId>,
    next: usize,
}

pub struct FootprintSearch<'a> {
    program: &'a Program,
    root: OpId,
    order: SearchOrder,
    max_depth: u32,
    deadline: Option<Instant>,
    kill: Option<&'a dyn KillOracle>,
    arena: ContextArena,
    stack: Vec<Frame>,
    root_pending: bool,
    truncated: bool,
    pruned: u64,
}

impl<'a> FootprintSearch<'a> {
    pub fn new(program: &'a Program, root: OpId, order: SearchOrder) -> Self {
        let mut search = Self {
            program,
            root,
            order,
            max_depth: 8,
            deadline: None,
            kill: None,
            arena: ContextArena::new(),
            stack: Vec::new(),
            root_pending: false,
            truncated: false,
            pruned: 0,
        };
        search.restart();
        search
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn kill_oracle(mut self, kill: &'a dyn KillOracle) -> Self {
        self.kill = Some(kill);
        self
    }

    /// Rewind to the first element
    pub fn restart(&mut self) {
        self.stack.clear();
        self.truncated = false;
        self.pruned = 0;
        self.root_pending = false;
        let program = self.program;
        match program.op(self.root).callee() {
            Some(Callee::Internal { function }) => {
                let ctx = self.arena.push(CtxId::ROOT, self.root);
                let frame = self.frame(*function, ctx);
                self.stack.push(frame);
            }
            // not expandable: the operation is its own footprint
            _ => self.root_pending = program.touches_memory(self.root),
        }
    }

    /// The deadline cut the search short
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Elements dropped by the kill oracle since the last restart
    pub fn pruned(&self) -> u64 {
        self.pruned
    }

    pub fn arena(&self) -> &ContextArena {
        &self.arena
    }

    fn frame(&self, function: FunctionId, ctx: CtxId) -> Frame {
        let f = self.program.function(function);
        let mut ops: Vec<OpId> = f
            .blocks
            .iter()
            .flat_map(|b| self.program.block(*b).ops.iter().copied())
            .collect();
        if self.order == SearchOrder::Backward {
            ops.reverse();
        }
        Frame {
            function,
            ctx,
            ops,
            next: 0,
        }
    }

    fn on_path(&self, function: FunctionId) -> bool {
        self.stack.iter().any(|f| f.function == function)
    }

    fn is_private(&self, op: OpId) -> bool {
        let Some(access) = self.program.op(op).direct_access() else {
            return false;
        };
        let ptr = self.program.pointer(access.ptr);
        !ptr.is_unknown()
            && ptr.targets.iter().all(|obj| {
                self.program.object(*obj).is_some_and(|o| {
                    !o.escapes && o.owner.is_some_and(|owner| self.on_path(owner))
                })
            })
    }

    fn killed(&mut self, op: OpId, ctx: CtxId) -> bool {
        let killed = self
            .kill
            .is_some_and(|k| k.is_killed(op, ctx, &self.arena));
        if killed {
            self.pruned += 1;
        }
        killed
    }
}

impl Iterator for FootprintSearch<'_> {
    type Item = FootprintEntry;

    fn next(&mut self) -> Option<FootprintEntry> {
        let program = self.program;
        if self.root_pending {
            self.root_pending = false;
            return Some(FootprintEntry {
                op: self.root,
                ctx: CtxId::ROOT,
                opaque: true,
            });
        }
        loop {
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                if !self.stack.is_empty() {
                    self.truncated = true;
                    self.stack.clear();
                }
                return None;
            }
            let frame = self.stack.last_mut()?;
            if frame.next >= frame.ops.len() {
                self.stack.pop();
                continue;
            }
            let op = frame.ops[frame.next];
            frame.next += 1;
            let ctx = frame.ctx;

            match &program.op(op).kind {
                OpKind::Load { .. } | OpKind::Store { .. } => {
                    if self.is_private(op) || self.killed(op, ctx) {
                        continue;
                    }
                    return Some(FootprintEntry {
                        op,
                        ctx,
                        opaque: false,
                    });
                }
                OpKind::Call { callee } => {
                    if !program.touches_memory(op) || self.killed(op, ctx) {
                        continue;
                    }
                    match callee {
                        Callee::Internal { function }
                            if !self.on_path(*function)
                                && self.arena.depth(ctx) < self.max_depth =>
                        {
                            let function = *function;
                            let inner = self.arena.push(ctx, op);
                            let frame = self.frame(function, inner);
                            self.stack.push(frame);
                        }
                        _ => {
                            return Some(FootprintEntry {
                                op,
                                ctx,
                                opaque: true,
                            })
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::footprint::infrastructure::DeadBlockKill;
    use crate::shared::models::*;
    use std::time::Duration;

    /// main: call a
    /// a: store p_global; store p_local(private to a); call b
    /// b: load p_global; call printf
    fn call_tree() -> Program {
        let def = ProgramDef {
            functions: vec![
                Function {
                    id: FunctionId(0),
                    name: "main".into(),
                    blocks: vec![BlockId(0)],
                    arguments: vec![],
                },
                Function {
                    id: FunctionId(1),
                    name: "a".into(),
                    blocks: vec![BlockId(1)],
                    arguments: vec![],
                },
                Function {
                    id: FunctionId(2),
                    name: "b".into(),
                    blocks: vec![BlockId(2)],
                    arguments: vec![],
                },
            ],
            blocks: vec![
                Block {
                    id: BlockId(0),
                    function: FunctionId(0),
                    name: None,
                    ops: vec![OpId(0), OpId(1)],
                    succs: vec![],
                },
                Block {
                    id: BlockId(1),
                    function: FunctionId(1),
                    name: None,
                    ops: vec![OpId(2), OpId(3), OpId(4), OpId(5)],
                    succs: vec![],
                },
                Block {
                    id: BlockId(2),
                    function: FunctionId(2),
                    name: None,
                    ops: vec![OpId(6), OpId(7), OpId(8)],
                    succs: vec![],
                },
            ],
            operations: vec![
                Operation::new(
                    OpId(0),
                    BlockId(0),
                    OpKind::Call {
                        callee: Callee::Internal {
                            function: FunctionId(1),
                        },
                    },
                ),
                Operation::new(OpId(1), BlockId(0), OpKind::Return),
                Operation::new(
                    OpId(2),
                    BlockId(1),
                    OpKind::Store {
                        access: MemAccess::new(PtrId(0), 4),
                    },
                ),
                Operation::new(
                    OpId(3),
                    BlockId(1),
                    OpKind::Store {
                        access: MemAccess::new(PtrId(1), 4),
                    },
                ),
                Operation::new(
                    OpId(4),
                    BlockId(1),
                    OpKind::Call {
                        callee: Callee::Internal {
                            function: FunctionId(2),
                        },
                    },
                ),
                Operation::new(OpId(5), BlockId(1), OpKind::Return),
                Operation::new(
                    OpId(6),
                    BlockId(2),
                    OpKind::Load {
                        access: MemAccess::new(PtrId(0), 4),
                    },
                ),
                Operation::new(
                    OpId(7),
                    BlockId(2),
                    OpKind::Call {
                        callee: Callee::External {
                            name: "printf".into(),
                            effect: ExternalEffect::READ_WRITE,
                        },
                    },
                ),
                Operation::new(OpId(8), BlockId(2), OpKind::Return),
            ],
            loops: vec![],
            pointers: vec![
                PointerInfo {
                    id: PtrId(0),
                    name: Some("g".into()),
                    targets: vec![ObjectId(0)],
                    offset: Some(0),
                },
                PointerInfo {
                    id: PtrId(1),
                    name: Some("local".into()),
                    targets: vec![ObjectId(1)],
                    offset: Some(0),
                },
            ],
            objects: vec![
                AbstractObject {
                    id: ObjectId(0),
                    name: Some("g".into()),
                    kind: ObjectKind::Global,
                    owner: None,
                    escapes: true,
                },
                AbstractObject {
                    id: ObjectId(1),
                    name: Some("buf".into()),
                    kind: ObjectKind::Stack,
                    owner: Some(FunctionId(1)),
                    escapes: false,
                },
            ],
        };
        Program::new(def).unwrap()
    }

    #[test]
    fn test_forward_search_skips_private_and_tags_context() {
        let p = call_tree();
        let entries: Vec<_> = FootprintSearch::new(&p, OpId(0), SearchOrder::Forward).collect();
        let ops: Vec<OpId> = entries.iter().map(|e| e.op).collect();
        assert_eq!(ops, vec![OpId(2), OpId(6), OpId(7)]);
        assert!(entries[2].opaque);
        assert_ne!(entries[0].ctx, entries[1].ctx);
    }

    #[test]
    fn test_backward_order_and_restart() {
        let p = call_tree();
        let mut search = FootprintSearch::new(&p, OpId(0), SearchOrder::Backward);
        let first: Vec<OpId> = search.by_ref().map(|e| e.op).collect();
        assert_eq!(first, vec![OpId(7), OpId(6), OpId(2)]);
        search.restart();
        let again: Vec<OpId> = search.map(|e| e.op).collect();
        assert_eq!(again, first);
    }

    #[test]
    fn test_depth_limit_yields_opaque_call() {
        let p = call_tree();
        let entries: Vec<_> = FootprintSearch::new(&p, OpId(0), SearchOrder::Forward)
            .max_depth(1)
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].op, OpId(4));
        assert!(entries[1].opaque);
    }

    #[test]
    fn test_expired_deadline_truncates() {
        let p = call_tree();
        let mut search = FootprintSearch::new(&p, OpId(0), SearchOrder::Forward)
            .deadline(Some(Instant::now() - Duration::from_millis(1)));
        assert_eq!(search.next(), None);
        assert!(search.truncated());
    }

    #[test]
    fn test_dead_block_kill_prunes() {
        let p = call_tree();
        let mut profile = ExecutionProfile::new(10);
        profile.dead_blocks.insert(BlockId(2));
        let kill = DeadBlockKill::new(&p, &profile);
        let mut search =
            FootprintSearch::new(&p, OpId(0), SearchOrder::Forward).kill_oracle(&kill);
        let ops: Vec<OpId> = search.by_ref().map(|e| e.op).collect();
        assert_eq!(ops, vec![OpId(2)]);
        assert!(search.pruned() > 0);
    }

    #[test]
    fn test_non_call_root_is_its_own_footprint() {
        let p = call_tree();
        let entries: Vec<_> = FootprintSearch::new(&p, OpId(2), SearchOrder::Forward).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].op, OpId(2));
    }
}
