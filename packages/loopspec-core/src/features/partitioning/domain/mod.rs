//! Partitioning domain: stages and parallelization plans

pub mod plan;

pub use plan::{index_stages, stages_respect, ParallelizationPlan, Stage, StageKind};
