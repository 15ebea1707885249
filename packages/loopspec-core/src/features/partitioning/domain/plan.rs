//! Parallelization plans
//!
//! A plan is an ordered list of stages covering every loop operation exactly
//! once. Replicable prefixes stay in the plan as `Replicated` stages; the
//! later stages that consume them carry copies in `replicated`, which do not
//! count towards coverage.

use crate::config::CriticKind;
use crate::features::pdg::{Criticisms, DepKind, Dependence};
use crate::shared::models::OpId;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Sequential,
    Parallel,
    Replicated,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Sequential => write!(f, "sequential"),
            StageKind::Parallel => write!(f, "parallel"),
            StageKind::Replicated => write!(f, "replicated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub kind: StageKind,
    pub ops: BTreeSet<OpId>,
    /// Workers running this stage (1 unless parallel)
    pub parallel_factor: u32,
    /// Copies of replicable operations this stage recomputes
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub replicated: BTreeSet<OpId>,
}

impl Stage {
    pub fn sequential(ops: impl IntoIterator<Item = OpId>) -> Self {
        Self {
            kind: StageKind::Sequential,
            ops: ops.into_iter().collect(),
            parallel_factor: 1,
            replicated: BTreeSet::new(),
        }
    }

    pub fn parallel(ops: impl IntoIterator<Item = OpId>, parallel_factor: u32) -> Self {
        Self {
            kind: StageKind::Parallel,
            ops: ops.into_iter().collect(),
            parallel_factor: parallel_factor.max(1),
            replicated: BTreeSet::new(),
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.kind == StageKind::Parallel
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Ordered stages, the criticisms the plan relies on removing, and the
/// critic's expected saving in fixed-point profile units
#[derive(Debug, Clone, Serialize)]
pub struct ParallelizationPlan {
    pub critic: CriticKind,
    pub stages: Vec<Stage>,
    pub criticisms: Criticisms,
    /// Retained dependences the runtime forwards between stages
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cross_stage: Vec<Dependence>,
    pub expected_saving: u64,
    /// Estimated loop weight over estimated pipeline weight
    pub expected_speedup: f64,
}

impl ParallelizationPlan {
    pub fn new(critic: CriticKind, stages: Vec<Stage>, criticisms: Criticisms) -> Self {
        Self {
            critic,
            stages,
            criticisms,
            cross_stage: Vec::new(),
            expected_saving: 0,
            expected_speedup: 1.0,
        }
    }

    /// Stage index of every covered operation
    pub fn stage_index(&self) -> FxHashMap<OpId, usize> {
        index_stages(&self.stages)
    }

    /// Keep the register, control and flow dependences among `deps` that
    /// join two different stages and are not criticized
    pub fn record_cross_stage(&mut self, deps: impl IntoIterator<Item = Dependence>) {
        let index = self.stage_index();
        self.cross_stage = deps
            .into_iter()
            .filter(|d| matches!(d.kind, DepKind::Register | DepKind::Control | DepKind::Flow))
            .filter(|d| !self.criticisms.contains(d))
            .filter(|d| match (index.get(&d.src), index.get(&d.dst)) {
                (Some(s), Some(t)) => s != t,
                _ => false,
            })
            .collect();
        self.cross_stage.sort_unstable();
    }

    pub fn stage_of(&self, op: OpId) -> Option<usize> {
        self.stages.iter().position(|s| s.ops.contains(&op))
    }

    pub fn parallel_stage(&self) -> Option<&Stage> {
        self.stages.iter().find(|s| s.is_parallel())
    }

    pub fn has_parallel_stage(&self) -> bool {
        self.parallel_stage().is_some()
    }

    pub fn num_ops(&self) -> usize {
        self.stages.iter().map(Stage::len).sum()
    }

    /// Whether the stages hold exactly `ops`, each once
    pub fn covers_exactly(&self, ops: impl IntoIterator<Item = OpId>) -> bool {
        let expected: BTreeSet<OpId> = ops.into_iter().collect();
        let mut seen = BTreeSet::new();
        for stage in &self.stages {
            for op in &stage.ops {
                if !seen.insert(*op) {
                    return false;
                }
            }
        }
        seen == expected
    }

    /// A retained dependence respects the plan when it stays inside one
    /// stage or flows forward; a loop-carried one inside a parallel stage
    /// does not
    pub fn respects(&self, dep: &Dependence, index: &FxHashMap<OpId, usize>) -> bool {
        stages_respect(&self.stages, index, dep)
    }
}

pub fn index_stages(stages: &[Stage]) -> FxHashMap<OpId, usize> {
    let mut index = FxHashMap::default();
    for (i, stage) in stages.iter().enumerate() {
        for op in &stage.ops {
            index.insert(*op, i);
        }
    }
    index
}

/// See [`ParallelizationPlan::respects`]
pub fn stages_respect(stages: &[Stage], index: &FxHashMap<OpId, usize>, dep: &Dependence) -> bool {
    let (Some(&s), Some(&d)) = (index.get(&dep.src), index.get(&dep.dst)) else {
        return true;
    };
    if s > d {
        return false;
    }
    !(s == d && dep.loop_carried && stages[s].is_parallel())
}
