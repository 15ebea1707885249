//! Planner configuration
//!
//! Three tiers, from simplest to most explicit:
//! - Preset: `PlannerConfig::preset(Preset::Fast)`
//! - Section override: `.partitioning(|c| c.thread_budget(8))`
//! - YAML v1 file: `PlannerConfig::from_yaml(path)`
//!
//! Every path ends in `validate()`; the orchestrator only ever sees a
//! validated, immutable configuration.

pub mod error;
pub mod planner_config;
pub mod preset;
pub mod stage_configs;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use planner_config::{ConfigExportV1, ConfigOverrides, PlannerConfig, ValidatedConfig};
pub use preset::Preset;
pub use stage_configs::{
    CriticKind, OracleConfig, OracleModuleKind, PartitioningConfig, RemediationConfig,
    RemediatorKind, SelectionConfig,
};
pub use validation::{Validatable, ValidatableCollection};
