//! Remedies
//!
//! A remedy is a priced speculative justification for removing one or more
//! criticisms. Remedies of the same remediator are told apart by their
//! payload; across remediators they order by cost, then by name. Two equal
//! remedies are one remedy resolving the union of their criticisms.

use crate::config::RemediatorKind;
use crate::features::pdg::{Criticism, Criticisms};
use crate::shared::models::{ObjectId, OpId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Reduction variable a reduction remedy privatizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReductionTarget {
    /// Header phi of a register reduction
    Register(OpId),
    /// Reduction-class memory object
    Object(ObjectId),
}

/// What the code generator has to materialize for a remedy
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "remedy", rename_all = "snake_case")]
pub enum RemedyPayload {
    /// Misspeculation check on a speculated branch; `None` for effects
    /// removed because an endpoint is speculatively dead or unordered
    ControlSpeculation { branch: Option<OpId> },
    /// Separate memory version per worker
    MemoryVersioning { src: OpId, dst: OpId },
    /// Value check replacing the carried value of a predictable operation
    ValuePrediction { predicted: OpId },
    /// Replicate the producing slice in a sequential prefix
    LoopFission {
        produce: OpId,
        replicated: BTreeSet<OpId>,
    },
    /// Separation checks on heap classes; private and local accesses need
    /// extra instrumentation
    HeapClassification {
        private: Option<OpId>,
        local: Option<OpId>,
    },
    /// Reorderable library calls
    CommutativeLibs { function: String },
    Reduction { target: ReductionTarget },
    CountedIv { phi: OpId },
    /// Full memory speculation with a runtime conflict check
    MemorySpeculation { src: OpId, dst: OpId },
}

/// One priced remedy
#[derive(Debug, Clone, Serialize)]
pub struct Remedy {
    pub remediator: RemediatorKind,
    pub cost: u64,
    pub payload: RemedyPayload,
    /// Criticisms this remedy removes
    pub resolved: Criticisms,
    /// Criticisms that must also be removed for this remedy to hold
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub requires: Criticisms,
}

impl Remedy {
    pub fn new(remediator: RemediatorKind, cost: u64, payload: RemedyPayload) -> Self {
        Self {
            remediator,
            cost,
            payload,
            resolved: Criticisms::new(),
            requires: Criticisms::new(),
        }
    }

    pub fn resolving(mut self, criticism: Criticism) -> Self {
        self.resolved.insert(criticism);
        self
    }

    pub fn requiring(mut self, criticisms: impl IntoIterator<Item = Criticism>) -> Self {
        self.requires.extend(criticisms);
        self
    }

    pub fn name(&self) -> &'static str {
        self.remediator.as_str()
    }

    pub fn resolves(&self, criticism: &Criticism) -> bool {
        self.resolved.contains(criticism)
    }
}

impl Ord for Remedy {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.remediator == other.remediator {
            return self.payload.cmp(&other.payload);
        }
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.name().cmp(other.name()))
    }
}

impl PartialOrd for Remedy {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Remedy {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Remedy {}

/// Ordered set of distinct remedies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Remedies {
    items: Vec<Remedy>,
}

impl Remedies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(remedy: Remedy) -> Self {
        Self { items: vec![remedy] }
    }

    /// Insert, merging resolved and required criticisms into an equal
    /// remedy already present. Returns `true` when the remedy is new.
    pub fn insert(&mut self, remedy: Remedy) -> bool {
        match self.items.binary_search(&remedy) {
            Ok(i) => {
                let existing = &mut self.items[i];
                existing.resolved.extend(remedy.resolved);
                existing.requires.extend(remedy.requires);
                false
            }
            Err(i) => {
                self.items.insert(i, remedy);
                true
            }
        }
    }

    pub fn extend(&mut self, other: Remedies) {
        for r in other.items {
            self.insert(r);
        }
    }

    pub fn contains(&self, remedy: &Remedy) -> bool {
        self.items.binary_search(remedy).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Remedy> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_cost(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.cost))
    }

    /// Every criticism some member resolves
    pub fn resolved(&self) -> Criticisms {
        self.items
            .iter()
            .flat_map(|r| r.resolved.iter().copied())
            .collect()
    }
}

impl IntoIterator for Remedies {
    type Item = Remedy;
    type IntoIter = std::vec::IntoIter<Remedy>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Remedy> for Remedies {
    fn from_iter<T: IntoIterator<Item = Remedy>>(iter: T) -> Self {
        let mut set = Remedies::new();
        for r in iter {
            set.insert(r);
        }
        set
    }
}

/// Alternative remedy sets for one criticism, cheapest first
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SetOfRemedies {
    alternatives: Vec<Remedies>,
}

impl SetOfRemedies {
    /// Add an alternative unless an identical one is present
    pub fn insert(&mut self, remedies: Remedies) {
        if self.alternatives.contains(&remedies) {
            return;
        }
        let key = (remedies.total_cost(), remedies.len());
        let at = self
            .alternatives
            .partition_point(|r| (r.total_cost(), r.len()) <= key);
        self.alternatives.insert(at, remedies);
    }

    pub fn cheapest(&self) -> Option<&Remedies> {
        self.alternatives.first()
    }

    pub fn min_cost(&self) -> Option<u64> {
        self.cheapest().map(Remedies::total_cost)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Remedies> {
        self.alternatives.iter()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pdg::{DepKind, Dependence};
    use pretty_assertions::assert_eq;

    fn crit(s: u32, d: u32) -> Criticism {
        Dependence::new(OpId(s), OpId(d), DepKind::Flow, true)
    }

    fn spec(branch: u32) -> Remedy {
        Remedy::new(
            RemediatorKind::ControlSpeculation,
            50,
            RemedyPayload::ControlSpeculation {
                branch: Some(OpId(branch)),
            },
        )
    }

    fn memver(s: u32, d: u32) -> Remedy {
        Remedy::new(
            RemediatorKind::MemoryVersioning,
            0,
            RemedyPayload::MemoryVersioning {
                src: OpId(s),
                dst: OpId(d),
            },
        )
    }

    #[test]
    fn test_same_remediator_orders_by_payload() {
        assert!(spec(1) < spec(2));
        assert_eq!(spec(3), spec(3).resolving(crit(0, 1)));
    }

    #[test]
    fn test_different_remediators_order_by_cost() {
        assert!(memver(9, 9) < spec(0));
        let fission = Remedy::new(
            RemediatorKind::LoopFission,
            50,
            RemedyPayload::LoopFission {
                produce: OpId(0),
                replicated: BTreeSet::new(),
            },
        );
        // equal cost: name decides
        assert!(spec(0) < fission);
    }

    #[test]
    fn test_insert_merges_resolved_criticisms() {
        let mut set = Remedies::new();
        assert!(set.insert(spec(4).resolving(crit(1, 2))));
        assert!(!set.insert(spec(4).resolving(crit(3, 2))));
        assert!(set.insert(memver(1, 2).resolving(crit(1, 2))));
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_cost(), 50);
        assert_eq!(set.resolved().len(), 2);
        let merged = set.iter().find(|r| r.cost == 50).unwrap();
        assert!(merged.resolves(&crit(3, 2)));
    }

    #[test]
    fn test_set_of_remedies_keeps_cheapest_first() {
        let mut alts = SetOfRemedies::default();
        alts.insert(Remedies::single(spec(1)));
        alts.insert(Remedies::single(memver(0, 1)));
        alts.insert(Remedies::single(spec(1)));
        assert_eq!(alts.len(), 2);
        assert_eq!(alts.min_cost(), Some(0));
    }
}
