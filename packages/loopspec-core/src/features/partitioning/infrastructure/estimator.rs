//! Performance estimators
//!
//! - `FlatEstimator`: every operation weighs 1
//! - `ProfileEstimator`: execution count times a per-kind weight
//!   (phi/branch/switch 1, memory 200, other 100); a call to a function with
//!   a body also pays for the estimated weight of that body

use crate::features::partitioning::ports::PerformanceEstimator;
use crate::shared::constants::cost_model;
use crate::shared::models::{Callee, ExecutionProfile, FunctionId, OpId, Program};
use rustc_hash::FxHashMap;
use std::cell::RefCell;

#[derive(Debug, Default, Clone, Copy)]
pub struct FlatEstimator;

impl PerformanceEstimator for FlatEstimator {
    fn op_weight(&self, _program: &Program, _op: OpId) -> u64 {
        1
    }
}

pub struct ProfileEstimator<'p> {
    profile: &'p ExecutionProfile,
    /// `None` marks a function whose weight is being computed (recursion)
    function_weights: RefCell<FxHashMap<FunctionId, Option<u64>>>,
}

impl<'p> ProfileEstimator<'p> {
    pub fn new(profile: &'p ExecutionProfile) -> Self {
        Self {
            profile,
            function_weights: RefCell::new(FxHashMap::default()),
        }
    }

    fn type_weight(program: &Program, op: OpId) -> u64 {
        let operation = program.op(op);
        if operation.is_lightweight() {
            cost_model::LIGHTWEIGHT_OP_WEIGHT
        } else if operation.direct_access().is_some() {
            cost_model::MEMORY_OP_WEIGHT
        } else {
            cost_model::DEFAULT_OP_WEIGHT
        }
    }

    fn function_weight(&self, program: &Program, f: FunctionId) -> u64 {
        if let Some(known) = self.function_weights.borrow().get(&f) {
            return known.unwrap_or(0);
        }
        self.function_weights.borrow_mut().insert(f, None);
        let mut total = 0u64;
        for block in &program.function(f).blocks {
            for op in &program.block(*block).ops {
                total = total.saturating_add(self.op_weight(program, *op));
            }
        }
        self.function_weights.borrow_mut().insert(f, Some(total));
        total
    }
}

impl PerformanceEstimator for ProfileEstimator<'_> {
    fn op_weight(&self, program: &Program, op: OpId) -> u64 {
        let own = Self::type_weight(program, op).saturating_mul(self.profile.op_count(op));
        match program.op(op).callee() {
            Some(Callee::Internal { function }) => {
                own.saturating_add(self.function_weight(program, *function))
            }
            _ => own,
        }
    }
}

/// Profile-driven when the profile carries execution counts, flat otherwise
pub fn estimator_for<'p>(profile: &'p ExecutionProfile) -> Box<dyn PerformanceEstimator + 'p> {
    if profile.op_counts.is_empty() {
        Box::new(FlatEstimator)
    } else {
        Box::new(ProfileEstimator::new(profile))
    }
}
