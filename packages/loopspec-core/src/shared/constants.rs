//! Centralized cost-model constants
//!
//! All magic numbers of the speedup model and the default remedy prices are
//! defined here so critics, remediators and the orchestrator agree on units.

/// Fixed-point speedup model
pub mod cost_model {
    /// Scale factor applied to estimator weights before subtraction
    pub const FIXED_POINT: u64 = 1000;

    /// Penalty per loop nesting level (breaks ties in favour of outer loops)
    pub const PENALIZE_LOOP_NEST: u64 = FIXED_POINT * 10;

    /// Profile estimator weight of phi/branch/switch operations
    pub const LIGHTWEIGHT_OP_WEIGHT: u64 = 1;

    /// Profile estimator weight of memory operations
    pub const MEMORY_OP_WEIGHT: u64 = 200;

    /// Profile estimator weight of every other operation
    pub const DEFAULT_OP_WEIGHT: u64 = 100;
}

/// Default remedy prices (abstract units, multiplied by `FIXED_POINT` when
/// compared against expected savings)
pub mod remedy_costs {
    pub const CONTROL_SPECULATION: u64 = 50;
    pub const MEMORY_VERSIONING: u64 = 0;
    pub const VALUE_PREDICTION: u64 = 58;
    pub const LOOP_FISSION: u64 = 60;
    pub const HEAP_SEPARATION: u64 = 40;
    pub const PRIVATE_ACCESS: u64 = 100;
    pub const LOCAL_ACCESS: u64 = 5;
    pub const COMMUTATIVE_LIBS: u64 = 15;
    pub const REDUCTION: u64 = 2;
    pub const COUNTED_IV: u64 = 0;
    pub const MEMORY_SPECULATION: u64 = 1500;
}

/// Prices attached to answers of speculative oracle modules
pub mod oracle_costs {
    pub const CONTROL_SPECULATION: u64 = 45;
    pub const OBSERVED_DEPENDENCE: u64 = 999;
    pub const POINTER_RESIDUE: u64 = 60;
    pub const HEAP_CLASSIFICATION: u64 = 50;
    pub const VALUE_PREDICTION: u64 = 58;
    pub const COMMUTATIVE_LIBS: u64 = 100;
}

/// Partitioning thresholds
pub mod partitioning {
    /// Default number of workers a critic may use
    pub const DEFAULT_THREAD_BUDGET: u32 = 25;

    /// Max percent of parallel-stage weight that may be moved off it to avoid
    /// eliminating an expensive dependence
    pub const OFF_PARALLEL_STAGE_PERCENT: u32 = 3;

    /// Dependences at most this expensive to remove are always removed
    pub const AVOID_ELIMINATION_COST_THRESHOLD: u64 = 5;

    /// Source/sink capacity multiplier in the non-mergeability network
    pub const FLOW_WEIGHT_SCALE: u64 = 100;
}

/// Loop fission eligibility
pub mod loop_fission {
    /// A sequential prefix heavier than this percent of the loop is rejected
    pub const MAX_WEIGHT_PERCENT: u32 = 5;

    /// Bound on the breadth-first closure over the SCC DAG
    pub const MAX_VISITED_SCCS: usize = 64;
}

/// Library calls whose invocations commute with each other
pub mod commutative {
    pub const FUNCTIONS: &[&str] = &[
        "malloc", "calloc", "realloc", "free", "xalloc", "rand", "random", "lrand48", "drand48",
    ];

    /// Allow-listed name, or an allocator/random-number wrapper by name
    pub fn is_commutative_name(name: &str) -> bool {
        FUNCTIONS.contains(&name) || name.contains("random") || name.contains("alloc")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_allow_list_and_substrings() {
            assert!(is_commutative_name("malloc"));
            assert!(is_commutative_name("my_xrandom_r"));
            assert!(is_commutative_name("pool_alloc"));
            assert!(!is_commutative_name("printf"));
        }
    }
}
