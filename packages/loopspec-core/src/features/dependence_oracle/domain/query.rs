//! Oracle queries
//!
//! Queries are plain values so they can key the per-module caches.

use super::relation::TemporalRelation;
use crate::shared::models::{LoopId, MemAccess, OpId};
use serde::{Deserialize, Serialize};

/// Second operand of a mod/ref query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModRefTarget {
    /// Memory accessed by another operation
    Op(OpId),
    /// A specific pointer footprint
    Access(MemAccess),
}

/// "How may `op` affect the memory of `target`, under `rel`, in `loop_id`?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModRefQuery {
    pub op: OpId,
    pub rel: TemporalRelation,
    pub target: ModRefTarget,
    /// `None` for loop-agnostic queries (then `rel` must be `Same`)
    pub loop_id: Option<LoopId>,
}

impl ModRefQuery {
    pub fn ops(op: OpId, rel: TemporalRelation, target: OpId, loop_id: Option<LoopId>) -> Self {
        Self {
            op,
            rel,
            target: ModRefTarget::Op(target),
            loop_id,
        }
    }

    pub fn access(
        op: OpId,
        rel: TemporalRelation,
        target: MemAccess,
        loop_id: Option<LoopId>,
    ) -> Self {
        Self {
            op,
            rel,
            target: ModRefTarget::Access(target),
            loop_id,
        }
    }

    pub fn target_op(&self) -> Option<OpId> {
        match self.target {
            ModRefTarget::Op(op) => Some(op),
            ModRefTarget::Access(_) => None,
        }
    }

    /// Intra-iteration queries and loop-free queries behave alike
    pub fn is_loop_carried(&self) -> bool {
        self.loop_id.is_some() && self.rel.is_loop_carried()
    }
}

/// "May these two footprints overlap, under `rel`, in `loop_id`?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasQuery {
    pub a: MemAccess,
    pub rel: TemporalRelation,
    pub b: MemAccess,
    pub loop_id: Option<LoopId>,
}

impl AliasQuery {
    pub fn new(a: MemAccess, rel: TemporalRelation, b: MemAccess, loop_id: Option<LoopId>) -> Self {
        Self { a, rel, b, loop_id }
    }
}
