//! Oracle application layer: chain, caches, statistics, composition

pub mod cache;
pub mod chain;
pub mod factory;
pub mod stats;

pub use cache::ResultCache;
pub use chain::{OracleChain, OracleChainBuilder};
pub use factory::{build_chain, create_module};
pub use stats::ModuleStats;
