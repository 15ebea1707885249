//! Per-loop planning
//!
//! Drives one loop from PDG construction through critics and remedy
//! selection to an accepted strategy or a reject reason.

pub mod application;
pub mod domain;
pub mod ports;

pub use application::Orchestrator;
pub use domain::{
    CandidateSummary, LoopOutcome, LoopReport, LoopStrategy, PlanningPhase, RejectReason,
};
pub use ports::LoopPlanner;
