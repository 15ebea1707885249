//! Execution profile
//!
//! Runtime measurements the planner consumes: time per loop, execution count
//! per operation, speculation evidence (dead blocks and edges, predictable
//! values, observed dependences, pointer residues).

use super::ids::{BlockId, LoopId, OpId, PtrId};
use super::program::Program;
use crate::errors::{PlannerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One dependence seen during profiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObservedDependence {
    pub src: OpId,
    pub dst: OpId,
    pub loop_carried: bool,
    pub count: u64,
}

/// Profile of one program run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionProfile {
    /// Whole-program time in profile units
    pub total_time: u64,
    /// Time per loop keyed "function::header"
    #[serde(default)]
    pub loop_times: BTreeMap<String, u64>,
    #[serde(default)]
    pub op_counts: BTreeMap<OpId, u64>,
    #[serde(default)]
    pub dead_blocks: BTreeSet<BlockId>,
    #[serde(default)]
    pub dead_edges: BTreeSet<(BlockId, BlockId)>,
    #[serde(default)]
    pub predictable_loads: BTreeMap<LoopId, BTreeSet<OpId>>,
    #[serde(default)]
    pub predictable_phis: BTreeMap<LoopId, BTreeSet<OpId>>,
    /// Dependences observed per loop. A (src, dst, carried) triple that is
    /// absent was never seen.
    #[serde(default)]
    pub observed_dependences: BTreeMap<LoopId, Vec<ObservedDependence>>,
    /// Low address bits seen per pointer, as a 16-bit residue mask
    #[serde(default)]
    pub pointer_residues: BTreeMap<PtrId, u16>,
}

impl ExecutionProfile {
    pub fn new(total_time: u64) -> Self {
        Self {
            total_time,
            ..Self::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn loop_time(&self, loop_name: &str) -> Option<u64> {
        self.loop_times.get(loop_name).copied()
    }

    pub fn op_count(&self, op: OpId) -> u64 {
        self.op_counts.get(&op).copied().unwrap_or(0)
    }

    pub fn is_dead_block(&self, block: BlockId) -> bool {
        self.dead_blocks.contains(&block)
    }

    pub fn is_dead_edge(&self, from: BlockId, to: BlockId) -> bool {
        self.dead_edges.contains(&(from, to)) || self.is_dead_block(to)
    }

    pub fn is_predictable_load(&self, loop_id: LoopId, op: OpId) -> bool {
        self.predictable_loads
            .get(&loop_id)
            .is_some_and(|s| s.contains(&op))
    }

    pub fn is_predictable_phi(&self, loop_id: LoopId, op: OpId) -> bool {
        self.predictable_phis
            .get(&loop_id)
            .is_some_and(|s| s.contains(&op))
    }

    /// Observation count of a dependence, `None` if the loop was never
    /// dependence-profiled
    pub fn observed_count(
        &self,
        loop_id: LoopId,
        src: OpId,
        dst: OpId,
        loop_carried: bool,
    ) -> Option<u64> {
        let deps = self.observed_dependences.get(&loop_id)?;
        Some(
            deps.iter()
                .filter(|d| d.src == src && d.dst == dst && d.loop_carried == loop_carried)
                .map(|d| d.count)
                .sum(),
        )
    }

    pub fn residue(&self, ptr: PtrId) -> Option<u16> {
        self.pointer_residues.get(&ptr).copied()
    }

    /// Reject profiles that disagree with the program they claim to describe
    pub fn validate_against(&self, program: &Program) -> Result<()> {
        for op in self.op_counts.keys() {
            if op.index() >= program.operations().len() {
                return Err(PlannerError::profile(format!(
                    "execution count for unknown operation {}",
                    op
                )));
            }
        }
        for (name, time) in &self.loop_times {
            if *time > self.total_time {
                return Err(PlannerError::profile(format!(
                    "loop {} time {} exceeds total time {}",
                    name, time, self.total_time
                )));
            }
        }
        for block in &self.dead_blocks {
            if block.index() >= program.blocks().len() {
                return Err(PlannerError::profile(format!(
                    "dead block {} is not in the program",
                    block
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_count_absent_loop_is_none() {
        let profile = ExecutionProfile::new(100);
        assert_eq!(profile.observed_count(LoopId(0), OpId(1), OpId(2), true), None);
    }

    #[test]
    fn test_observed_count_sums_matching() {
        let mut profile = ExecutionProfile::new(100);
        profile.observed_dependences.insert(
            LoopId(0),
            vec![
                ObservedDependence {
                    src: OpId(1),
                    dst: OpId(2),
                    loop_carried: true,
                    count: 3,
                },
                ObservedDependence {
                    src: OpId(1),
                    dst: OpId(2),
                    loop_carried: false,
                    count: 9,
                },
            ],
        );
        assert_eq!(profile.observed_count(LoopId(0), OpId(1), OpId(2), true), Some(3));
        assert_eq!(profile.observed_count(LoopId(0), OpId(2), OpId(1), true), Some(0));
    }

    #[test]
    fn test_json_roundtrip_with_map_keys() {
        let mut profile = ExecutionProfile::new(1_000);
        profile.loop_times.insert("main::bb1".to_string(), 800);
        profile.op_counts.insert(OpId(4), 10);
        profile.dead_edges.insert((BlockId(1), BlockId(3)));
        let text = serde_json::to_string(&profile).unwrap();
        let back = ExecutionProfile::from_json_str(&text).unwrap();
        assert_eq!(back, profile);
        assert!(back.is_dead_edge(BlockId(1), BlockId(3)));
    }
}
