//! PDG ports
//!
//! The builder asks memory questions through `MemoryDependenceOracle`; the
//! oracle chain implements it, tests substitute fixed answers.

use crate::features::dependence_oracle::{ChainAnswer, ModRef, ModRefQuery, OracleChain};

pub trait MemoryDependenceOracle {
    fn modref(&self, query: &ModRefQuery) -> ChainAnswer<ModRef>;
}

impl MemoryDependenceOracle for OracleChain<'_> {
    fn modref(&self, query: &ModRefQuery) -> ChainAnswer<ModRef> {
        OracleChain::modref(self, query)
    }
}
