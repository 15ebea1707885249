//! Remediation domain: remedies, remedy sets and per-remediator counters

pub mod remedy;
pub mod stats;

pub use remedy::{ReductionTarget, Remedies, Remedy, RemedyPayload, SetOfRemedies};
pub use stats::RemediatorStats;
