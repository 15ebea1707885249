//! Dependence oracle chain
//!
//! Answers "may operation A's memory effect interact with B's, under a
//! temporal relation, inside a loop?" by asking an ordered list of modules
//! and intersecting their answers.
//!
//! ```text
//! let chain = build_chain(ctx, &config.oracle, false);
//! let answer = chain.modref(&ModRefQuery::ops(a, TemporalRelation::Before, b, Some(loop_id)));
//! if answer.result == ModRef::NoModRef { /* no memory edge */ }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{build_chain, ModuleStats, OracleChain, OracleChainBuilder};
pub use domain::{
    AliasQuery, AliasResult, Assumption, ChainAnswer, ModRef, ModRefQuery, ModRefTarget,
    ModuleAnswer, SchedulingPreference, TemporalRelation,
};
pub use infrastructure::speculative_loop_cfg;
pub use ports::{ChainHandle, OracleModule, QueryContext};
