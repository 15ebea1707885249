//! Oracle ports
//!
//! - `OracleModule`: one link of the chain
//! - `ChainHandle`: the top of the chain, for modules that decompose a query
//!   into sub-queries (footprint expansion)
//! - `QueryContext`: per-query inputs threaded through every module

use super::domain::{
    AliasQuery, AliasResult, ChainAnswer, ModRef, ModRefQuery, ModuleAnswer, SchedulingPreference,
};
use crate::shared::models::ProgramContext;
use std::time::Instant;

/// Re-entry point into the full chain
pub trait ChainHandle {
    fn modref_nested(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ChainAnswer<ModRef>;

    fn alias_nested(&self, query: &AliasQuery, cx: &QueryContext<'_>)
        -> ChainAnswer<AliasResult>;
}

/// Inputs of one (possibly nested) query
pub struct QueryContext<'a> {
    pub program: ProgramContext<'a>,
    pub chain: &'a dyn ChainHandle,
    /// Wall-clock watchdog; searches past it answer conservatively
    pub deadline: Option<Instant>,
    /// Nesting depth of sub-queries
    pub depth: u32,
}

impl<'a> QueryContext<'a> {
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Context for a sub-query one level deeper
    pub fn nested(&self) -> QueryContext<'a> {
        QueryContext {
            program: self.program,
            chain: self.chain,
            deadline: self.deadline,
            depth: self.depth + 1,
        }
    }
}

/// One dependence oracle module
///
/// Modules answer with an upper bound; `ModRef`/`MayAlias` means "cannot
/// tell, ask the next module". The defaults abstain.
pub trait OracleModule {
    fn name(&self) -> &'static str;

    fn preference(&self) -> SchedulingPreference {
        SchedulingPreference::NORMAL
    }

    fn modref(&self, _query: &ModRefQuery, _cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        ModuleAnswer::certain(ModRef::ModRef)
    }

    fn alias(&self, _query: &AliasQuery, _cx: &QueryContext<'_>) -> ModuleAnswer<AliasResult> {
        ModuleAnswer::certain(AliasResult::MayAlias)
    }
}
