//! Orchestration domain: planning phases and loop reports

pub mod phase;
pub mod report;

pub use phase::{PlanningPhase, RejectReason};
pub use report::{CandidateSummary, LoopOutcome, LoopReport, LoopStrategy};
