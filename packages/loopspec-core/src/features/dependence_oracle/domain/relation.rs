//! Temporal relation between the two operands of a query

use serde::{Deserialize, Serialize};
use std::fmt;

/// Iteration of the first operand relative to the second
///
/// - `Before`: the first operand executes in an earlier iteration
/// - `Same`: both in one iteration (intra-iteration)
/// - `After`: the first operand executes in a later iteration
///
/// `Before` and `After` are the two directions of one loop-carried relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalRelation {
    Before,
    Same,
    After,
}

impl TemporalRelation {
    /// Relation seen from the other operand
    pub fn rev(self) -> Self {
        match self {
            TemporalRelation::Before => TemporalRelation::After,
            TemporalRelation::Same => TemporalRelation::Same,
            TemporalRelation::After => TemporalRelation::Before,
        }
    }

    pub fn is_loop_carried(self) -> bool {
        self != TemporalRelation::Same
    }
}

impl fmt::Display for TemporalRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalRelation::Before => write!(f, "before"),
            TemporalRelation::Same => write!(f, "same"),
            TemporalRelation::After => write!(f, "after"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rev_is_involution() {
        for rel in [
            TemporalRelation::Before,
            TemporalRelation::Same,
            TemporalRelation::After,
        ] {
            assert_eq!(rel.rev().rev(), rel);
        }
        assert_eq!(TemporalRelation::Before.rev(), TemporalRelation::After);
        assert!(!TemporalRelation::Same.is_loop_carried());
    }
}
