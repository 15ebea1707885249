//! Calling contexts
//!
//! A context is a stack of call sites, innermost last. Contexts are
//! hash-consed in an arena: `(parent, callsite)` maps to exactly one
//! `CtxId`, so equal contexts compare by id and sharing a prefix costs
//! nothing. Each search owns its arena.

use crate::shared::models::OpId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Interned calling context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CtxId(pub u32);

impl CtxId {
    /// The empty context
    pub const ROOT: CtxId = CtxId(0);
}

#[derive(Debug, Clone, Copy)]
struct CtxNode {
    parent: Option<CtxId>,
    callsite: Option<OpId>,
    depth: u32,
}

#[derive(Debug, Clone)]
pub struct ContextArena {
    nodes: Vec<CtxNode>,
    index: FxHashMap<(CtxId, OpId), CtxId>,
}

impl Default for ContextArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextArena {
    pub fn new() -> Self {
        Self {
            nodes: vec![CtxNode {
                parent: None,
                callsite: None,
                depth: 0,
            }],
            index: FxHashMap::default(),
        }
    }

    /// Context `parent` extended by `callsite`
    pub fn push(&mut self, parent: CtxId, callsite: OpId) -> CtxId {
        if let Some(id) = self.index.get(&(parent, callsite)) {
            return *id;
        }
        let depth = self.nodes[parent.0 as usize].depth + 1;
        let id = CtxId(self.nodes.len() as u32);
        self.nodes.push(CtxNode {
            parent: Some(parent),
            callsite: Some(callsite),
            depth,
        });
        self.index.insert((parent, callsite), id);
        id
    }

    pub fn parent(&self, ctx: CtxId) -> Option<CtxId> {
        self.nodes[ctx.0 as usize].parent
    }

    pub fn callsite(&self, ctx: CtxId) -> Option<OpId> {
        self.nodes[ctx.0 as usize].callsite
    }

    pub fn depth(&self, ctx: CtxId) -> u32 {
        self.nodes[ctx.0 as usize].depth
    }

    /// Call sites from outermost to innermost
    pub fn callsites(&self, ctx: CtxId) -> Vec<OpId> {
        let mut out = Vec::with_capacity(self.depth(ctx) as usize);
        let mut cur = Some(ctx);
        while let Some(c) = cur {
            if let Some(site) = self.callsite(c) {
                out.push(site);
            }
            cur = self.parent(c);
        }
        out.reverse();
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consing() {
        let mut arena = ContextArena::new();
        let a = arena.push(CtxId::ROOT, OpId(4));
        let b = arena.push(a, OpId(9));
        assert_eq!(arena.push(CtxId::ROOT, OpId(4)), a);
        assert_eq!(arena.push(a, OpId(9)), b);
        assert_ne!(arena.push(CtxId::ROOT, OpId(9)), b);
        assert_eq!(arena.callsites(b), vec![OpId(4), OpId(9)]);
        assert_eq!(arena.depth(b), 2);
        assert_eq!(arena.depth(CtxId::ROOT), 0);
    }
}
