//! Call-site inlining on the host program model
//!
//! The call site's block is split right after the call. The callee's
//! blocks are cloned into the caller, its parameters are bound to the
//! call's operands, and every return branches to the split-off block. The
//! call itself becomes the branch into the cloned entry.
//!
//! Existing ids keep their meaning and new entities are appended, so the
//! caller's loop names (and the profile keyed by them) survive. Cloned
//! operations get the callee's execution counts scaled by the share of the
//! callee's entries that came through this call site, and clones of dead
//! callee blocks stay dead.

use crate::errors::{PlannerError, Result};
use crate::features::selection::domain::{InlinedProgram, InliningOpportunity};
use crate::features::selection::ports::LateInliner;
use crate::shared::models::{
    Block, BlockId, Callee, ExecutionProfile, InductionVariable, Loop, LoopId, OpId, OpKind,
    Operation, Program, ProgramDef, RegisterReduction,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct CallSiteInliner;

impl LateInliner for CallSiteInliner {
    fn inline(
        &self,
        program: &Program,
        profile: &ExecutionProfile,
        sites: &[InliningOpportunity],
    ) -> Result<Option<InlinedProgram>> {
        let mut def = program.definition().clone();
        let mut profile = profile.clone();
        let mut seen = FxHashSet::default();
        let mut inlined = 0usize;
        for site in sites {
            if seen.insert(site.call_site)
                && inline_call(program, &mut def, &mut profile, site.call_site)?
            {
                inlined += 1;
            }
        }
        if inlined == 0 {
            return Ok(None);
        }
        info!(inlined, "call sites inlined");
        Ok(Some(InlinedProgram {
            program: Program::new(def)?,
            profile,
        }))
    }
}

fn block_label(block: &Block) -> String {
    block.name.clone().unwrap_or_else(|| block.id.to_string())
}

/// Execution count of a clone: the callee's count times the share of the
/// callee's entries made from the call site
fn scaled_count(count: u64, call_count: u64, entry_count: u64) -> u64 {
    if entry_count == 0 {
        return call_count;
    }
    let scaled = u128::from(count) * u128::from(call_count) / u128::from(entry_count);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Inline one call site into `def`. `program` is the snapshot the round
/// started from and only answers call-graph questions.
fn inline_call(
    program: &Program,
    def: &mut ProgramDef,
    profile: &mut ExecutionProfile,
    site: OpId,
) -> Result<bool> {
    let call = def
        .operations
        .get(site.index())
        .cloned()
        .ok_or_else(|| PlannerError::malformed(format!("unknown call site {}", site)))?;
    let Some(Callee::Internal { function: callee }) = call.callee().cloned() else {
        return Ok(false);
    };
    let block = call.block;
    let caller = def.blocks[block.index()].function;
    if callee == caller || program.transitive_callees(callee).contains(&caller) {
        debug!(%site, %callee, "recursive call site left alone");
        return Ok(false);
    }
    let callee_blocks = def.functions[callee.index()].blocks.clone();
    let Some(callee_entry) = callee_blocks.first().copied() else {
        return Ok(false);
    };
    let pos = def.blocks[block.index()]
        .ops
        .iter()
        .position(|op| *op == site)
        .ok_or_else(|| {
            PlannerError::malformed(format!("{} is not listed in its block {}", site, block))
        })?;

    // Innermost caller loop around the call, before any block is added
    let enclosing: Vec<usize> = def
        .loops
        .iter()
        .enumerate()
        .filter(|(_, l)| l.blocks.contains(&block))
        .map(|(i, _)| i)
        .collect();
    let innermost = enclosing
        .iter()
        .copied()
        .min_by_key(|i| def.loops[*i].blocks.len())
        .map(|i| def.loops[i].id);

    // Split
    let cont = BlockId(def.blocks.len() as u32);
    let (tail, succs, label) = {
        let b = &mut def.blocks[block.index()];
        let tail = b.ops.split_off(pos + 1);
        let succs = std::mem::take(&mut b.succs);
        (tail, succs, block_label(b))
    };
    for op in &tail {
        def.operations[op.index()].block = cont;
    }
    for succ in &succs {
        for op in def.blocks[succ.index()].ops.clone() {
            if let OpKind::Phi { incoming } = &mut def.operations[op.index()].kind {
                for from in incoming.iter_mut().filter(|from| **from == block) {
                    *from = cont;
                }
            }
        }
    }
    def.blocks.push(Block {
        id: cont,
        function: caller,
        name: Some(format!("{}.split", label)),
        ops: tail,
        succs,
    });

    // Clone the callee
    let callee_name = def.functions[callee.index()].name.clone();
    let block_map: FxHashMap<BlockId, BlockId> = callee_blocks
        .iter()
        .enumerate()
        .map(|(i, b)| (*b, BlockId((def.blocks.len() + i) as u32)))
        .collect();
    let mut value_map: FxHashMap<OpId, OpId> = def.functions[callee.index()]
        .arguments
        .iter()
        .copied()
        .zip(call.operands.iter().copied())
        .collect();
    let bound: FxHashSet<OpId> = value_map.keys().copied().collect();
    let mut next_op = def.operations.len() as u32;
    for b in &callee_blocks {
        for op in &def.blocks[b.index()].ops {
            if !bound.contains(op) {
                value_map.insert(*op, OpId(next_op));
                next_op += 1;
            }
        }
    }
    let map_op = |op: OpId| value_map.get(&op).copied().unwrap_or(op);
    let map_block = |b: BlockId| block_map.get(&b).copied().unwrap_or(b);

    let mut new_ops = Vec::new();
    let mut new_blocks = Vec::with_capacity(callee_blocks.len());
    let mut returns: Vec<(BlockId, OpId)> = Vec::new();
    for b in &callee_blocks {
        let src = &def.blocks[b.index()];
        let id = map_block(*b);
        let mut succs: Vec<BlockId> = src.succs.iter().map(|s| map_block(*s)).collect();
        let mut ops = Vec::with_capacity(src.ops.len());
        for op in src.ops.iter().filter(|op| !bound.contains(op)) {
            let mut clone = def.operations[op.index()].clone();
            clone.id = map_op(*op);
            clone.block = id;
            clone.operands = clone.operands.iter().map(|o| map_op(*o)).collect();
            clone.name = clone.name.map(|n| format!("{}.{}", callee_name, n));
            if let OpKind::Phi { incoming } = &mut clone.kind {
                for from in incoming.iter_mut() {
                    *from = map_block(*from);
                }
            }
            if matches!(clone.kind, OpKind::Return) {
                if let Some(value) = clone.operands.first() {
                    returns.push((id, *value));
                }
                clone.kind = OpKind::Branch { conditional: false };
                clone.operands.clear();
                succs = vec![cont];
            }
            ops.push(clone.id);
            new_ops.push(clone);
        }
        new_blocks.push(Block {
            id,
            function: caller,
            name: Some(format!("{}.{}", callee_name, block_label(src))),
            ops,
            succs,
        });
    }
    if !profile.op_counts.is_empty() {
        let call_count = profile.op_count(site);
        let entry_count = def.blocks[callee_entry.index()]
            .ops
            .iter()
            .map(|op| profile.op_count(*op))
            .max()
            .unwrap_or(0);
        for (original, clone) in value_map.iter().filter(|(op, _)| !bound.contains(op)) {
            let count = scaled_count(profile.op_count(*original), call_count, entry_count);
            if count > 0 {
                profile.op_counts.insert(*clone, count);
            }
        }
    }
    for b in &callee_blocks {
        if profile.is_dead_block(*b) {
            profile.dead_blocks.insert(map_block(*b));
        }
    }
    new_ops.sort_by_key(|op| op.id);
    def.operations.extend(new_ops);
    let cloned_ids: Vec<BlockId> = new_blocks.iter().map(|b| b.id).collect();
    def.blocks.extend(new_blocks);

    // The call becomes the jump into the clone
    let entry = map_block(callee_entry);
    {
        let op = &mut def.operations[site.index()];
        op.kind = OpKind::Branch { conditional: false };
        op.operands.clear();
    }
    def.blocks[block.index()].succs = vec![entry];

    // Uses of the call's result read the returned value
    let result = match returns.as_slice() {
        [] => None,
        [(_, value)] => Some(*value),
        _ => {
            let phi = OpId(def.operations.len() as u32);
            let (incoming, operands): (Vec<BlockId>, Vec<OpId>) = returns.iter().copied().unzip();
            def.operations.push(
                Operation::new(phi, cont, OpKind::Phi { incoming })
                    .with_operands(operands),
            );
            def.blocks[cont.index()].ops.insert(0, phi);
            let call_count = profile.op_count(site);
            if call_count > 0 {
                profile.op_counts.insert(phi, call_count);
            }
            Some(phi)
        }
    };
    if let Some(result) = result {
        for op in def.operations.iter_mut().filter(|op| op.id != result) {
            for operand in op.operands.iter_mut().filter(|o| **o == site) {
                *operand = result;
            }
        }
    }

    let added: Vec<BlockId> = std::iter::once(cont).chain(cloned_ids.iter().copied()).collect();
    let caller_blocks = &mut def.functions[caller.index()].blocks;
    caller_blocks.extend(added.iter().copied());
    for i in enclosing {
        def.loops[i].blocks.extend(added.iter().copied());
    }

    // Callee loops nest under the innermost loop around the call
    let callee_loops: Vec<Loop> = def
        .loops
        .iter()
        .filter(|l| l.function == callee)
        .cloned()
        .collect();
    let loop_map: FxHashMap<LoopId, LoopId> = callee_loops
        .iter()
        .enumerate()
        .map(|(i, l)| (l.id, LoopId((def.loops.len() + i) as u32)))
        .collect();
    for l in callee_loops {
        def.loops.push(Loop {
            id: loop_map[&l.id],
            function: caller,
            header: map_block(l.header),
            blocks: l.blocks.iter().map(|b| map_block(*b)).collect(),
            parent: l
                .parent
                .and_then(|p| loop_map.get(&p).copied())
                .or(innermost),
            induction: l.induction.map(|iv| InductionVariable {
                phi: map_op(iv.phi),
                step: map_op(iv.step),
                exit_branch: iv.exit_branch.map(map_op),
            }),
            reductions: l
                .reductions
                .iter()
                .map(|r| RegisterReduction {
                    phi: map_op(r.phi),
                    update: map_op(r.update),
                    operator: r.operator,
                })
                .collect(),
        });
    }
    debug!(%site, callee = %callee_name, blocks = cloned_ids.len(), "inlined call site");
    Ok(true)
}
