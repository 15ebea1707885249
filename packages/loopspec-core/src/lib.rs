/*
 * Loopspec Core - Speculative Loop Parallelization Planner
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Host program model, profile, heap classes, constants
 * - features/    : Vertical slices (footprint → oracle → pdg → remediation
 *                  / partitioning → orchestration → selection)
 * - config/      : Presets, section overrides, YAML v1
 *
 * Planning:
 * - Dependence graph per hot loop, priced by speculative remedies
 * - DOALL / DSWP / PS-DSWP partitions with expected speedup
 * - Heaviest compatible set of loops across the program
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Planning passes thread several inputs
#![allow(clippy::type_complexity)] // Nested maps keyed by ids
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::upper_case_acronyms)] // PDG, DSWP naming

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Host program model and shared constants
pub mod shared;

/// Feature modules (oracle chain up to loop selection)
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{PlannerConfig, Preset, ValidatedConfig};
pub use errors::{PlannerError, Result};
pub use features::orchestration::{LoopPlanner, LoopReport, Orchestrator};
pub use features::selection::{LoopSelection, LoopSelector};

/// Everything a caller needs to plan loops
pub mod prelude {
    pub use crate::config::{
        CriticKind, OracleModuleKind, PlannerConfig, Preset, RemediatorKind, ValidatedConfig,
    };
    pub use crate::errors::{PlannerError, Result};
    pub use crate::features::orchestration::{
        LoopOutcome, LoopPlanner, LoopReport, LoopStrategy, Orchestrator, PlanningPhase,
        RejectReason,
    };
    pub use crate::features::partitioning::{ParallelizationPlan, Stage, StageKind};
    pub use crate::features::selection::{LateInliner, LoopSelection, LoopSelector};
    pub use crate::shared::models::{
        ExecutionProfile, HeapAssignment, HeapClass, LoopId, OpId, Program, ProgramContext,
        ProgramDef,
    };
}
