//! Oracle statistics
//!
//! Diagnostics only; counters are additive and never influence answers.

use serde::Serialize;
use std::cell::Cell;

#[derive(Debug, Default)]
pub(crate) struct ModuleCounters {
    queries: Cell<u64>,
    cache_hits: Cell<u64>,
    conclusive: Cell<u64>,
    timeouts: Cell<u64>,
}

fn bump(c: &Cell<u64>) {
    c.set(c.get().saturating_add(1));
}

impl ModuleCounters {
    pub(crate) fn query(&self) {
        bump(&self.queries);
    }

    pub(crate) fn cache_hit(&self) {
        bump(&self.cache_hits);
    }

    pub(crate) fn conclusive(&self) {
        bump(&self.conclusive);
    }

    pub(crate) fn timeout(&self) {
        bump(&self.timeouts);
    }

    pub(crate) fn snapshot(&self, module: &'static str) -> ModuleStats {
        ModuleStats {
            module,
            queries: self.queries.get(),
            cache_hits: self.cache_hits.get(),
            conclusive: self.conclusive.get(),
            timeouts: self.timeouts.get(),
        }
    }
}

/// Counters of one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStats {
    pub module: &'static str,
    pub queries: u64,
    pub cache_hits: u64,
    /// Answers that tightened the running result
    pub conclusive: u64,
    pub timeouts: u64,
}
