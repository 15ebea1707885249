//! Whole-program loop selection
//!
//! Plans every hot loop, then picks the heaviest set of loops that can be
//! parallelized together, optionally inlining heavy sequential call sites
//! between rounds.

pub mod application;
pub mod domain;
pub mod ports;
pub mod infrastructure;

pub use application::LoopSelector;
pub use domain::{
    max_weight_clique, Clique, CompatibilityGraph, Conflict, Incompatibility, InlinedProgram,
    InliningOpportunity, LoopSelection,
};
pub use infrastructure::{CallSiteInliner, NoInlining};
pub use ports::LateInliner;
