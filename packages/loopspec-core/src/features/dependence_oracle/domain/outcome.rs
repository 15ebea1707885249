//! Module and chain answers
//!
//! A module answer optionally carries the cost of the speculative assumption
//! it rests on. The chain collects those costs as `Assumption`s whenever a
//! costed answer tightens the running result.

use serde::Serialize;

/// One module's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleAnswer<T> {
    pub result: T,
    /// Cost of the speculative assumption behind `result`, if any
    pub cost: Option<u64>,
    /// The module ran out of time and answered conservatively
    pub timed_out: bool,
}

impl<T> ModuleAnswer<T> {
    pub fn certain(result: T) -> Self {
        Self {
            result,
            cost: None,
            timed_out: false,
        }
    }

    pub fn speculative(result: T, cost: u64) -> Self {
        Self {
            result,
            cost: Some(cost),
            timed_out: false,
        }
    }

    pub fn timed_out(result: T) -> Self {
        Self {
            result,
            cost: None,
            timed_out: true,
        }
    }
}

/// A speculative assumption the chain's answer depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assumption {
    pub module: &'static str,
    pub cost: u64,
}

/// Answer of a whole chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainAnswer<T> {
    pub result: T,
    pub assumptions: Vec<Assumption>,
    pub timed_out: bool,
}

impl<T> ChainAnswer<T> {
    pub fn new(result: T) -> Self {
        Self {
            result,
            assumptions: Vec::new(),
            timed_out: false,
        }
    }

    pub fn is_speculative(&self) -> bool {
        !self.assumptions.is_empty()
    }

    pub fn speculative_cost(&self) -> u64 {
        self.assumptions
            .iter()
            .fold(0u64, |acc, a| acc.saturating_add(a.cost))
    }

    /// Name of every module whose assumption was used
    pub fn assumed_modules(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.assumptions.iter().map(|a| a.module).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
