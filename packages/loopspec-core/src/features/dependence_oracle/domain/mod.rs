//! Oracle domain: relations, answer lattices, queries, outcomes

pub mod answers;
pub mod outcome;
pub mod query;
pub mod relation;

pub use answers::{AliasResult, ModRef, SchedulingPreference};
pub use outcome::{Assumption, ChainAnswer, ModuleAnswer};
pub use query::{AliasQuery, ModRefQuery, ModRefTarget};
pub use relation::TemporalRelation;
