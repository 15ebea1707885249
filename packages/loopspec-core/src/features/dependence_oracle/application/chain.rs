//! Oracle chain
//!
//! An immutable, preference-ordered list of modules. A query visits the
//! modules in order, intersecting their answers, and stops as soon as the
//! running answer is `NoModRef` (or a definite alias answer). Every module
//! keeps its own LRU of answers; a chain is never re-composed in place, so
//! the caches never outlive the composition they were computed under.
//!
//! Modules that decompose a query (footprint expansion) re-enter the chain
//! from the top through `ChainHandle`, sharing the caller's deadline.

use super::cache::ResultCache;
use super::stats::{ModuleCounters, ModuleStats};
use crate::features::dependence_oracle::domain::{
    AliasQuery, AliasResult, Assumption, ChainAnswer, ModRef, ModRefQuery, ModuleAnswer,
};
use crate::features::dependence_oracle::ports::{ChainHandle, OracleModule, QueryContext};
use crate::shared::models::ProgramContext;
use std::cell::RefCell;
use std::time::{Duration, Instant};

/// Nested sub-queries deeper than this answer conservatively
const DEFAULT_MAX_NESTING: u32 = 16;

struct ChainEntry {
    module: Box<dyn OracleModule>,
    modref_cache: RefCell<ResultCache<ModRefQuery, ModuleAnswer<ModRef>>>,
    alias_cache: RefCell<ResultCache<AliasQuery, ModuleAnswer<AliasResult>>>,
    counters: ModuleCounters,
}

/// Builder for `OracleChain`
pub struct OracleChainBuilder<'p> {
    program: ProgramContext<'p>,
    modules: Vec<Box<dyn OracleModule>>,
    timeout: Option<Duration>,
    cache_capacity: usize,
    max_nesting: u32,
}

impl<'p> OracleChainBuilder<'p> {
    pub fn module(mut self, module: Box<dyn OracleModule>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: impl IntoIterator<Item = Box<dyn OracleModule>>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// `None` or zero disables the watchdog
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn max_nesting(mut self, depth: u32) -> Self {
        self.max_nesting = depth;
        self
    }

    pub fn build(self) -> OracleChain<'p> {
        let mut modules = self.modules;
        // stable: equal preferences keep registration order
        modules.sort_by_key(|m| std::cmp::Reverse(m.preference()));
        let capacity = self.cache_capacity;
        let entries = modules
            .into_iter()
            .map(|module| ChainEntry {
                module,
                modref_cache: RefCell::new(ResultCache::new(capacity)),
                alias_cache: RefCell::new(ResultCache::new(capacity)),
                counters: ModuleCounters::default(),
            })
            .collect();
        OracleChain {
            program: self.program,
            entries,
            timeout: self.timeout,
            max_nesting: self.max_nesting,
        }
    }
}

/// Ordered dependence oracle chain over one program
pub struct OracleChain<'p> {
    program: ProgramContext<'p>,
    entries: Vec<ChainEntry>,
    timeout: Option<Duration>,
    max_nesting: u32,
}

impl<'p> OracleChain<'p> {
    pub fn builder(program: ProgramContext<'p>) -> OracleChainBuilder<'p> {
        OracleChainBuilder {
            program,
            modules: Vec::new(),
            timeout: None,
            cache_capacity: 4_096,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    pub fn program(&self) -> ProgramContext<'p> {
        self.program
    }

    /// Module names in query order
    pub fn module_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.module.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached answer (after the host program changed)
    pub fn invalidate(&self) {
        for e in &self.entries {
            e.modref_cache.borrow_mut().clear();
            e.alias_cache.borrow_mut().clear();
        }
    }

    pub fn stats(&self) -> Vec<ModuleStats> {
        self.entries
            .iter()
            .map(|e| e.counters.snapshot(e.module.name()))
            .collect()
    }

    fn root_context(&self) -> QueryContext<'_> {
        QueryContext {
            program: self.program,
            chain: self,
            deadline: self.timeout.map(|t| Instant::now() + t),
            depth: 0,
        }
    }

    /// Top-level mod/ref query with a fresh deadline
    pub fn modref(&self, query: &ModRefQuery) -> ChainAnswer<ModRef> {
        let cx = self.root_context();
        self.run_modref(query, &cx)
    }

    /// Top-level alias query with a fresh deadline
    pub fn alias(&self, query: &AliasQuery) -> ChainAnswer<AliasResult> {
        let cx = self.root_context();
        self.run_alias(query, &cx)
    }

    fn run_modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ChainAnswer<ModRef> {
        let mut answer = ChainAnswer::new(ModRef::ModRef);
        for entry in &self.entries {
            if cx.expired() {
                entry.counters.timeout();
                answer.timed_out = true;
                break;
            }
            entry.counters.query();

            let cached = entry.modref_cache.borrow_mut().get(query);
            let module_answer = match cached {
                Some(a) => {
                    entry.counters.cache_hit();
                    a
                }
                None => {
                    let a = entry.module.modref(query, cx);
                    if a.timed_out {
                        entry.counters.timeout();
                        answer.timed_out = true;
                    } else {
                        entry.modref_cache.borrow_mut().put(*query, a);
                    }
                    a
                }
            };

            let tightened = answer.result & module_answer.result;
            if tightened != answer.result {
                entry.counters.conclusive();
                if let Some(cost) = module_answer.cost {
                    answer.assumptions.push(Assumption {
                        module: entry.module.name(),
                        cost,
                    });
                }
                crate::oracle_trace!(
                    module = entry.module.name(),
                    op = %query.op,
                    rel = %query.rel,
                    result = %tightened,
                    "oracle tightened modref"
                );
                answer.result = tightened;
            }
            if answer.result == ModRef::NoModRef {
                break;
            }
        }
        answer
    }

    fn run_alias(&self, query: &AliasQuery, cx: &QueryContext<'_>) -> ChainAnswer<AliasResult> {
        let mut answer = ChainAnswer::new(AliasResult::MayAlias);
        for entry in &self.entries {
            if cx.expired() {
                entry.counters.timeout();
                answer.timed_out = true;
                break;
            }
            entry.counters.query();

            let cached = entry.alias_cache.borrow_mut().get(query);
            let module_answer = match cached {
                Some(a) => {
                    entry.counters.cache_hit();
                    a
                }
                None => {
                    let a = entry.module.alias(query, cx);
                    if a.timed_out {
                        entry.counters.timeout();
                        answer.timed_out = true;
                    } else {
                        entry.alias_cache.borrow_mut().put(*query, a);
                    }
                    a
                }
            };

            let tightened = answer.result.intersect(module_answer.result);
            if tightened != answer.result {
                entry.counters.conclusive();
                if let Some(cost) = module_answer.cost {
                    answer.assumptions.push(Assumption {
                        module: entry.module.name(),
                        cost,
                    });
                }
                answer.result = tightened;
            }
            if answer.result.is_definite() {
                break;
            }
        }
        answer
    }
}

impl ChainHandle for OracleChain<'_> {
    fn modref_nested(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ChainAnswer<ModRef> {
        if cx.depth >= self.max_nesting {
            let mut answer = ChainAnswer::new(ModRef::ModRef);
            answer.timed_out = true;
            return answer;
        }
        self.run_modref(query, &cx.nested())
    }

    fn alias_nested(&self, query: &AliasQuery, cx: &QueryContext<'_>) -> ChainAnswer<AliasResult> {
        if cx.depth >= self.max_nesting {
            let mut answer = ChainAnswer::new(AliasResult::MayAlias);
            answer.timed_out = true;
            return answer;
        }
        self.run_alias(query, &cx.nested())
    }
}
