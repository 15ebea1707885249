//! Heap assignment
//!
//! Per-loop classification of abstract heap objects, produced by an external
//! heap-classification analysis. The planner reads it to decide which memory
//! dependences are separable and whether two loops can be parallelized
//! together.

use super::ids::{LoopId, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Associative-commutative operator of a reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionOperator {
    Add,
    Mul,
    Min,
    Max,
    BitAnd,
    BitOr,
    BitXor,
}

/// Class of an object with respect to one loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeapClass {
    /// Never written inside the loop
    ReadOnly,
    /// Allocated and freed within a single iteration
    Local,
    /// Every read is preceded by a write in the same iteration
    Private,
    /// Only updated through one reduction operator
    Reduction(ReductionOperator),
    /// Anything else
    Shared,
}

impl HeapClass {
    /// Classes whose accesses can be separated from every other class
    pub fn is_separable(self) -> bool {
        !matches!(self, HeapClass::Shared)
    }
}

impl fmt::Display for HeapClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapClass::ReadOnly => write!(f, "read-only"),
            HeapClass::Local => write!(f, "local"),
            HeapClass::Private => write!(f, "private"),
            HeapClass::Reduction(op) => write!(f, "reduction({:?})", op),
            HeapClass::Shared => write!(f, "shared"),
        }
    }
}

/// Object classes keyed by loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeapAssignment {
    loops: BTreeMap<LoopId, BTreeMap<ObjectId, HeapClass>>,
}

impl HeapAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, loop_id: LoopId, object: ObjectId, class: HeapClass) {
        self.loops.entry(loop_id).or_default().insert(object, class);
    }

    pub fn with(mut self, loop_id: LoopId, object: ObjectId, class: HeapClass) -> Self {
        self.assign(loop_id, object, class);
        self
    }

    /// Class of `object` in `loop_id`; `None` means the loop was not classified
    pub fn class_of(&self, loop_id: LoopId, object: ObjectId) -> Option<HeapClass> {
        self.loops.get(&loop_id)?.get(&object).copied()
    }

    pub fn is_classified(&self, loop_id: LoopId) -> bool {
        self.loops.contains_key(&loop_id)
    }

    pub fn objects(&self, loop_id: LoopId) -> impl Iterator<Item = (ObjectId, HeapClass)> + '_ {
        self.loops
            .get(&loop_id)
            .into_iter()
            .flat_map(|m| m.iter().map(|(o, c)| (*o, *c)))
    }

    /// Two loops are compatible unless some object is assigned different
    /// classes by each of them
    pub fn compatible(&self, a: LoopId, b: LoopId) -> bool {
        let (Some(ma), Some(mb)) = (self.loops.get(&a), self.loops.get(&b)) else {
            return true;
        };
        ma.iter()
            .all(|(obj, class)| mb.get(obj).map_or(true, |other| other == class))
    }
}
