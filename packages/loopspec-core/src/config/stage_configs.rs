//! Planner section configurations
//!
//! One struct per planner section, each with range validation, builder
//! setters and preset defaults:
//! - `OracleConfig`: dependence oracle chain
//! - `RemediationConfig`: enabled remediators and loop-fission bounds
//! - `PartitioningConfig`: critics and stage-partitioning knobs
//! - `SelectionConfig`: cross-loop selection and late inlining

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use crate::shared::constants::{loop_fission, partitioning};
use serde::{Deserialize, Serialize};

// ============================================================================
// Named component kinds
// ============================================================================

macro_rules! component_kind {
    (
        $(#[$meta:meta])*
        $name:ident, $kind_label:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Parse a configuration name, suggesting the closest valid one
            pub fn parse(name: &str, section: &str) -> ConfigResult<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|k| k.as_str() == name)
                    .ok_or_else(|| {
                        ConfigError::unknown_name_with_suggestion(
                            $kind_label,
                            name,
                            section,
                            Self::ALL.iter().map(|k| k.as_str().to_string()).collect(),
                        )
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

component_kind!(
    /// Dependence oracle modules
    OracleModuleKind, "oracle module" {
        Conservative => "conservative",
        PointsTo => "points_to",
        FootprintAware => "footprint_aware",
        ControlSpeculation => "control_speculation",
        ObservedDependence => "observed_dependence",
        PointerResidue => "pointer_residue",
        HeapClassification => "heap_classification",
        CommutativeLibs => "commutative_libs",
        ValuePrediction => "value_prediction",
    }
);

component_kind!(
    /// Remediators
    RemediatorKind, "remediator" {
        ControlSpeculation => "control_speculation",
        MemoryVersioning => "memory_versioning",
        ValuePrediction => "value_prediction",
        LoopFission => "loop_fission",
        HeapClassification => "heap_classification",
        CommutativeLibs => "commutative_libs",
        Reduction => "reduction",
        CountedIv => "counted_iv",
        MemorySpeculation => "memory_speculation",
    }
);

component_kind!(
    /// Partitioning critics
    CriticKind, "critic" {
        PsDswp => "ps_dswp",
        Dswp => "dswp",
        Doall => "doall",
    }
);

impl OracleModuleKind {
    /// Modules that rely on profile evidence and therefore imply a cost
    pub fn is_speculative(self) -> bool {
        matches!(
            self,
            Self::ControlSpeculation
                | Self::ObservedDependence
                | Self::PointerResidue
                | Self::HeapClassification
                | Self::CommutativeLibs
                | Self::ValuePrediction
        )
    }
}

fn check_duplicates<T: PartialEq + std::fmt::Display>(
    items: &[T],
    field: &str,
) -> ConfigResult<()> {
    for (i, a) in items.iter().enumerate() {
        if items[..i].contains(a) {
            return Err(ConfigError::Custom(format!(
                "'{}' listed twice in {}",
                a, field
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Oracle chain
// ============================================================================

/// Dependence oracle chain configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleConfig {
    /// Static modules of the chain the dependence graph is built with
    pub modules: Vec<OracleModuleKind>,

    /// Profile-backed modules appended to the static ones in the chain the
    /// memory-speculation remediator asks
    pub speculative_modules: Vec<OracleModuleKind>,

    /// Per-query deadline in milliseconds, 0 = no deadline (0..=600000)
    pub query_timeout_ms: u64,

    /// Per-module LRU capacity (1..=10_000_000)
    pub cache_capacity: usize,

    /// Observed-dependence module answers NoModRef when the profiled count
    /// is at most this
    pub observed_dependence_threshold: u64,

    /// Maximum calling-context depth of footprint searches (1..=64)
    pub max_context_depth: usize,
}

impl OracleConfig {
    pub fn modules(mut self, v: Vec<OracleModuleKind>) -> Self {
        self.modules = v;
        self
    }

    pub fn speculative_modules(mut self, v: Vec<OracleModuleKind>) -> Self {
        self.speculative_modules = v;
        self
    }

    pub fn query_timeout_ms(mut self, v: u64) -> Self {
        self.query_timeout_ms = v;
        self
    }

    pub fn cache_capacity(mut self, v: usize) -> Self {
        self.cache_capacity = v;
        self
    }

    pub fn observed_dependence_threshold(mut self, v: u64) -> Self {
        self.observed_dependence_threshold = v;
        self
    }

    pub fn max_context_depth(mut self, v: usize) -> Self {
        self.max_context_depth = v;
        self
    }

    pub fn from_preset(preset: Preset) -> Self {
        use OracleModuleKind::*;
        let speculative_modules = OracleModuleKind::ALL
            .iter()
            .copied()
            .filter(|k| k.is_speculative())
            .collect();
        match preset {
            Preset::Fast => Self {
                modules: vec![Conservative, PointsTo],
                speculative_modules,
                query_timeout_ms: 100,
                cache_capacity: 4_096,
                observed_dependence_threshold: 0,
                max_context_depth: 4,
            },
            Preset::Balanced | Preset::Custom => Self {
                modules: vec![Conservative, PointsTo, FootprintAware],
                speculative_modules,
                query_timeout_ms: 1_000,
                cache_capacity: 65_536,
                observed_dependence_threshold: 0,
                max_context_depth: 8,
            },
            Preset::Thorough => Self {
                modules: vec![Conservative, PointsTo, FootprintAware],
                speculative_modules,
                query_timeout_ms: 10_000,
                cache_capacity: 1_048_576,
                observed_dependence_threshold: 0,
                max_context_depth: 16,
            },
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for OracleConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_duplicates(&self.modules, "oracle.modules")?;
        check_duplicates(&self.speculative_modules, "oracle.speculative_modules")?;
        if let Some(k) = self.modules.iter().find(|k| k.is_speculative()) {
            return Err(ConfigError::CrossSectionConflict {
                issue: format!("speculative module '{}' listed in oracle.modules", k),
                fix: "Move it to oracle.speculative_modules".to_string(),
            });
        }
        if let Some(k) = self.speculative_modules.iter().find(|k| !k.is_speculative()) {
            return Err(ConfigError::CrossSectionConflict {
                issue: format!("static module '{}' listed in oracle.speculative_modules", k),
                fix: "Move it to oracle.modules".to_string(),
            });
        }
        if self.query_timeout_ms > 600_000 {
            return Err(ConfigError::range_with_hint(
                "query_timeout_ms",
                self.query_timeout_ms,
                0,
                600_000,
                "Use 0 to disable the per-query deadline",
            ));
        }
        if self.cache_capacity == 0 || self.cache_capacity > 10_000_000 {
            return Err(ConfigError::range_with_hint(
                "cache_capacity",
                self.cache_capacity,
                1,
                10_000_000,
                "Each oracle module keeps its own LRU of this size",
            ));
        }
        if self.max_context_depth == 0 || self.max_context_depth > 64 {
            return Err(ConfigError::range_with_hint(
                "max_context_depth",
                self.max_context_depth,
                1,
                64,
                "Deeper call chains are answered conservatively",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "oracle"
    }
}

// ============================================================================
// Remediation
// ============================================================================

/// Remediator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemediationConfig {
    pub remediators: Vec<RemediatorKind>,

    /// Loop fission refuses to pull out more than this share of the loop
    /// weight (1..=100)
    pub loop_fission_max_weight_percent: u32,

    /// Bound on SCCs visited by one loop-fission closure (1..=65536)
    pub loop_fission_max_sccs: usize,
}

impl RemediationConfig {
    pub fn remediators(mut self, v: Vec<RemediatorKind>) -> Self {
        self.remediators = v;
        self
    }

    pub fn loop_fission_max_weight_percent(mut self, v: u32) -> Self {
        self.loop_fission_max_weight_percent = v;
        self
    }

    pub fn loop_fission_max_sccs(mut self, v: usize) -> Self {
        self.loop_fission_max_sccs = v;
        self
    }

    pub fn from_preset(preset: Preset) -> Self {
        use RemediatorKind::*;
        let remediators = match preset {
            Preset::Fast => vec![Reduction, CountedIv, MemoryVersioning],
            Preset::Balanced | Preset::Custom => vec![
                ControlSpeculation,
                MemoryVersioning,
                ValuePrediction,
                LoopFission,
                HeapClassification,
                CommutativeLibs,
                Reduction,
                CountedIv,
            ],
            Preset::Thorough => RemediatorKind::ALL.to_vec(),
        };
        Self {
            remediators,
            loop_fission_max_weight_percent: loop_fission::MAX_WEIGHT_PERCENT,
            loop_fission_max_sccs: loop_fission::MAX_VISITED_SCCS,
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for RemediationConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_duplicates(&self.remediators, "remediation.remediators")?;
        if self.loop_fission_max_weight_percent == 0 || self.loop_fission_max_weight_percent > 100
        {
            return Err(ConfigError::range_with_hint(
                "loop_fission_max_weight_percent",
                self.loop_fission_max_weight_percent,
                1,
                100,
                "Percentage of the loop weight",
            ));
        }
        if self.loop_fission_max_sccs == 0 || self.loop_fission_max_sccs > 65_536 {
            return Err(ConfigError::range_with_hint(
                "loop_fission_max_sccs",
                self.loop_fission_max_sccs,
                1,
                65_536,
                "Bounds the breadth-first closure over the SCC DAG",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "remediation"
    }
}

// ============================================================================
// Partitioning
// ============================================================================

/// Critic and stage-partitioning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartitioningConfig {
    /// Critics, tried in this order
    pub critics: Vec<CriticKind>,

    /// Worker threads a plan may use (1..=1024)
    pub thread_budget: u32,

    /// Treat anti and output memory dependences as absent
    pub ignore_anti_output: bool,

    /// Allow replicated (side-effect free) front stages
    pub include_replicable_stages: bool,

    /// Keep every operation of a sub-loop in one stage
    pub constrain_sub_loops: bool,

    /// Fail the pipeline critic when no parallel stage survives
    pub abort_if_no_parallel_stage: bool,

    /// Weight moved off the parallel stage to avoid a remedy, in percent
    /// of the parallel stage (0..=100)
    pub off_parallel_stage_percent: u32,

    /// Only criticisms costlier than this are worth avoiding by moving
    /// operations off the parallel stage
    pub avoid_elimination_cost_threshold: u64,
}

impl PartitioningConfig {
    pub fn critics(mut self, v: Vec<CriticKind>) -> Self {
        self.critics = v;
        self
    }

    pub fn thread_budget(mut self, v: u32) -> Self {
        self.thread_budget = v;
        self
    }

    pub fn ignore_anti_output(mut self, v: bool) -> Self {
        self.ignore_anti_output = v;
        self
    }

    pub fn include_replicable_stages(mut self, v: bool) -> Self {
        self.include_replicable_stages = v;
        self
    }

    pub fn constrain_sub_loops(mut self, v: bool) -> Self {
        self.constrain_sub_loops = v;
        self
    }

    pub fn abort_if_no_parallel_stage(mut self, v: bool) -> Self {
        self.abort_if_no_parallel_stage = v;
        self
    }

    pub fn off_parallel_stage_percent(mut self, v: u32) -> Self {
        self.off_parallel_stage_percent = v;
        self
    }

    pub fn avoid_elimination_cost_threshold(mut self, v: u64) -> Self {
        self.avoid_elimination_cost_threshold = v;
        self
    }

    pub fn from_preset(preset: Preset) -> Self {
        use CriticKind::*;
        let critics = match preset {
            Preset::Fast => vec![Doall],
            _ => vec![PsDswp, Dswp, Doall],
        };
        Self {
            critics,
            thread_budget: partitioning::DEFAULT_THREAD_BUDGET,
            ignore_anti_output: false,
            include_replicable_stages: !matches!(preset, Preset::Fast),
            constrain_sub_loops: false,
            abort_if_no_parallel_stage: true,
            off_parallel_stage_percent: partitioning::OFF_PARALLEL_STAGE_PERCENT,
            avoid_elimination_cost_threshold: partitioning::AVOID_ELIMINATION_COST_THRESHOLD,
        }
    }
}

impl Default for PartitioningConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for PartitioningConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_duplicates(&self.critics, "partitioning.critics")?;
        if self.thread_budget == 0 || self.thread_budget > 1024 {
            return Err(ConfigError::range_with_hint(
                "thread_budget",
                self.thread_budget,
                1,
                1024,
                "At least one worker thread is required",
            ));
        }
        if self.off_parallel_stage_percent > 100 {
            return Err(ConfigError::range_with_hint(
                "off_parallel_stage_percent",
                self.off_parallel_stage_percent,
                0,
                100,
                "Percentage of the parallel stage weight",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "partitioning"
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Orchestrator acceptance and cross-loop selection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Selection rounds; every round past the first first inlines heavy
    /// calls (1 = no late inlining, 1..=16)
    pub late_inline_max_rounds: u32,

    /// A call site is an inlining opportunity when its weight is at least
    /// this share of its stage (0..=100)
    pub late_inline_min_coverage_percent: u32,

    /// Accept plans that do not improve on sequential execution
    pub ignore_expected_speedup: bool,

    /// Price every remedy at zero
    pub ignore_remedy_cost: bool,

    pub parallelize_at_most_one_loop: bool,

    /// Loops below this share of total program time are not candidates
    /// (0..=100)
    pub min_loop_coverage_percent: u32,
}

impl SelectionConfig {
    pub fn late_inline_max_rounds(mut self, v: u32) -> Self {
        self.late_inline_max_rounds = v;
        self
    }

    pub fn late_inline_min_coverage_percent(mut self, v: u32) -> Self {
        self.late_inline_min_coverage_percent = v;
        self
    }

    pub fn ignore_expected_speedup(mut self, v: bool) -> Self {
        self.ignore_expected_speedup = v;
        self
    }

    pub fn ignore_remedy_cost(mut self, v: bool) -> Self {
        self.ignore_remedy_cost = v;
        self
    }

    pub fn parallelize_at_most_one_loop(mut self, v: bool) -> Self {
        self.parallelize_at_most_one_loop = v;
        self
    }

    pub fn min_loop_coverage_percent(mut self, v: u32) -> Self {
        self.min_loop_coverage_percent = v;
        self
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self {
            late_inline_max_rounds: match preset {
                Preset::Thorough => 3,
                _ => 1,
            },
            late_inline_min_coverage_percent: 10,
            ignore_expected_speedup: false,
            ignore_remedy_cost: false,
            parallelize_at_most_one_loop: false,
            min_loop_coverage_percent: match preset {
                Preset::Fast => 10,
                Preset::Balanced | Preset::Custom => 1,
                Preset::Thorough => 0,
            },
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for SelectionConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.late_inline_max_rounds == 0 || self.late_inline_max_rounds > 16 {
            return Err(ConfigError::range_with_hint(
                "late_inline_max_rounds",
                self.late_inline_max_rounds,
                1,
                16,
                "1 disables late inlining",
            ));
        }
        if self.late_inline_min_coverage_percent > 100 {
            return Err(ConfigError::range_with_hint(
                "late_inline_min_coverage_percent",
                self.late_inline_min_coverage_percent,
                0,
                100,
                "Percentage of the enclosing stage weight",
            ));
        }
        if self.min_loop_coverage_percent > 100 {
            return Err(ConfigError::range_with_hint(
                "min_loop_coverage_percent",
                self.min_loop_coverage_percent,
                0,
                100,
                "Percentage of total program time",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "selection"
    }
}
