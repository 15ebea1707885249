//! Dependence edges
//!
//! Several kinds of dependence may exist between the same ordered pair of
//! operations. The graph keeps them as a `DepBits` set per pair; a single
//! `Dependence` names one (kind, loop-carried) member of such a set.

use crate::shared::models::OpId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepKind {
    Register,
    Control,
    /// Memory read-after-write
    Flow,
    /// Memory write-after-read
    Anti,
    /// Memory write-after-write
    Output,
}

impl DepKind {
    pub const ALL: [DepKind; 5] = [
        DepKind::Register,
        DepKind::Control,
        DepKind::Flow,
        DepKind::Anti,
        DepKind::Output,
    ];

    pub fn is_memory(self) -> bool {
        matches!(self, DepKind::Flow | DepKind::Anti | DepKind::Output)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DepKind::Register => "reg",
            DepKind::Control => "ctrl",
            DepKind::Flow => "raw",
            DepKind::Anti => "war",
            DepKind::Output => "waw",
        }
    }
}

/// One dependence between two operations of a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependence {
    pub src: OpId,
    pub dst: OpId,
    pub kind: DepKind,
    pub loop_carried: bool,
}

impl Dependence {
    pub fn new(src: OpId, dst: OpId, kind: DepKind, loop_carried: bool) -> Self {
        Self {
            src,
            dst,
            kind,
            loop_carried,
        }
    }

    pub fn is_memory(&self) -> bool {
        self.kind.is_memory()
    }
}

impl fmt::Display for Dependence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -{}{}-> {}",
            self.src,
            self.kind.as_str(),
            if self.loop_carried { "/lc" } else { "" },
            self.dst
        )
    }
}

/// Set of (kind, loop-carried) flavours between one ordered pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepBits(u16);

impl DepBits {
    pub const EMPTY: DepBits = DepBits(0);

    fn bit(kind: DepKind, loop_carried: bool) -> u16 {
        1 << (kind as u16 * 2 + loop_carried as u16)
    }

    pub fn single(kind: DepKind, loop_carried: bool) -> Self {
        DepBits(Self::bit(kind, loop_carried))
    }

    /// Returns `true` when the flavour was not present
    pub fn insert(&mut self, kind: DepKind, loop_carried: bool) -> bool {
        let before = self.0;
        self.0 |= Self::bit(kind, loop_carried);
        before != self.0
    }

    pub fn remove(&mut self, kind: DepKind, loop_carried: bool) -> bool {
        let before = self.0;
        self.0 &= !Self::bit(kind, loop_carried);
        before != self.0
    }

    pub fn contains(self, kind: DepKind, loop_carried: bool) -> bool {
        self.0 & Self::bit(kind, loop_carried) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn has_loop_carried(self) -> bool {
        self.iter().any(|(_, lc)| lc)
    }

    pub fn has_intra_iteration(self) -> bool {
        self.iter().any(|(_, lc)| !lc)
    }

    pub fn has_memory(self) -> bool {
        self.iter().any(|(k, _)| k.is_memory())
    }

    pub fn union(self, other: DepBits) -> DepBits {
        DepBits(self.0 | other.0)
    }

    pub fn difference(self, other: DepBits) -> DepBits {
        DepBits(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = (DepKind, bool)> {
        DepKind::ALL
            .into_iter()
            .flat_map(|k| [(k, false), (k, true)])
            .filter(move |(k, lc)| self.contains(*k, *lc))
    }

    /// The members as dependences from `src` to `dst`
    pub fn dependences(self, src: OpId, dst: OpId) -> impl Iterator<Item = Dependence> {
        self.iter()
            .map(move |(kind, lc)| Dependence::new(src, dst, kind, lc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bits_insert_remove() {
        let mut bits = DepBits::default();
        assert!(bits.insert(DepKind::Flow, true));
        assert!(!bits.insert(DepKind::Flow, true));
        assert!(bits.insert(DepKind::Register, false));
        assert_eq!(bits.len(), 2);
        assert!(bits.has_loop_carried());
        assert!(bits.has_memory());
        assert!(!bits.contains(DepKind::Flow, false));

        assert!(bits.remove(DepKind::Flow, true));
        assert!(!bits.has_loop_carried());
        assert_eq!(
            bits.iter().collect::<Vec<_>>(),
            vec![(DepKind::Register, false)]
        );
    }

    #[test]
    fn test_display() {
        let d = Dependence::new(OpId(1), OpId(2), DepKind::Anti, true);
        assert_eq!(d.to_string(), "op1 -war/lc-> op2");
    }
}
