//! Loop selection domain: compatibility, cliques and the final selection

pub mod clique;
pub mod compatibility;
pub mod selection;

pub use clique::{is_clique, is_maximal, max_weight_clique, Clique};
pub use compatibility::{conflict, CompatibilityGraph, Conflict, Incompatibility};
pub use selection::{InlinedProgram, InliningOpportunity, LoopSelection};
