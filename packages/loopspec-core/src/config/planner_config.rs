//! Planner configuration
//!
//! `PlannerConfig` bundles every section and is handed, immutable, to the
//! orchestrator and the loop selector. It is built from a preset, optionally
//! adjusted through closures, and validated once:
//!
//! ```rust,ignore
//! let config = PlannerConfig::preset(Preset::Balanced)
//!     .partitioning(|c| c.thread_budget(8))
//!     .selection(|c| c.ignore_remedy_cost(true))
//!     .build()?;
//! ```
//!
//! YAML files use schema v1:
//!
//! ```yaml
//! version: 1
//! preset: balanced
//! overrides:
//!   partitioning:
//!     thread_budget: 8
//! ```

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::stage_configs::{
    OracleConfig, PartitioningConfig, RemediationConfig, RemediatorKind, SelectionConfig,
};
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete planner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub preset: Preset,
    pub oracle: OracleConfig,
    pub remediation: RemediationConfig,
    pub partitioning: PartitioningConfig,
    pub selection: SelectionConfig,
}

/// Configuration that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig(PlannerConfig);

impl ValidatedConfig {
    pub fn into_inner(self) -> PlannerConfig {
        self.0
    }
}

impl std::ops::Deref for ValidatedConfig {
    type Target = PlannerConfig;

    fn deref(&self) -> &PlannerConfig {
        &self.0
    }
}

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Whole-section overrides; omitted fields of a present section fall back
/// to that section's balanced defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle: Option<OracleConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<RemediationConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitioning: Option<PartitioningConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionConfig>,
}

impl PlannerConfig {
    /// Start from a preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            oracle: OracleConfig::from_preset(preset),
            remediation: RemediationConfig::from_preset(preset),
            partitioning: PartitioningConfig::from_preset(preset),
            selection: SelectionConfig::from_preset(preset),
        }
    }

    pub fn oracle(mut self, f: impl FnOnce(OracleConfig) -> OracleConfig) -> Self {
        self.oracle = f(self.oracle);
        self
    }

    pub fn remediation(mut self, f: impl FnOnce(RemediationConfig) -> RemediationConfig) -> Self {
        self.remediation = f(self.remediation);
        self
    }

    pub fn partitioning(
        mut self,
        f: impl FnOnce(PartitioningConfig) -> PartitioningConfig,
    ) -> Self {
        self.partitioning = f(self.partitioning);
        self
    }

    pub fn selection(mut self, f: impl FnOnce(SelectionConfig) -> SelectionConfig) -> Self {
        self.selection = f(self.selection);
        self
    }

    /// Validate every section, then cross-section consistency
    pub fn validate(&self) -> ConfigResult<()> {
        let sections: [&dyn Validatable; 4] = [
            &self.oracle,
            &self.remediation,
            &self.partitioning,
            &self.selection,
        ];
        for section in sections {
            section.validate().map_err(|e| {
                tracing::debug!(section = section.config_name(), error = %e, "invalid config section");
                e
            })?;
        }

        if self.partitioning.critics.is_empty() {
            return Err(ConfigError::CrossSectionConflict {
                issue: "no critic enabled".to_string(),
                fix: "Enable at least one of ps_dswp, dswp, doall".to_string(),
            });
        }
        if self
            .remediation
            .remediators
            .contains(&RemediatorKind::MemorySpeculation)
            && self.oracle.speculative_modules.is_empty()
        {
            return Err(ConfigError::CrossSectionConflict {
                issue: "memory_speculation remediator enabled without speculative oracle modules"
                    .to_string(),
                fix: "List modules in oracle.speculative_modules or drop memory_speculation"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Validate and freeze
    pub fn build(self) -> ConfigResult<ValidatedConfig> {
        self.validate()?;
        Ok(ValidatedConfig(self))
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<ValidatedConfig> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        // Version check
        match export.version {
            None => return Err(ConfigError::MissingVersion),
            Some(1) => {}
            Some(found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: vec![1],
                })
            }
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;

        let mut config = Self::preset(preset);
        if let Some(overrides) = export.overrides {
            if let Some(oracle) = overrides.oracle {
                config.oracle = oracle;
            }
            if let Some(remediation) = overrides.remediation {
                config.remediation = remediation;
            }
            if let Some(partitioning) = overrides.partitioning {
                config.partitioning = partitioning;
            }
            if let Some(selection) = overrides.selection {
                config.selection = selection;
            }
        }
        config.build()
    }

    /// Load from YAML file (v1 schema)
    pub fn from_yaml(path: &Path) -> ConfigResult<ValidatedConfig> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export as YAML v1 with every section spelled out
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.preset.as_str().to_string(),
            overrides: Some(ConfigOverrides {
                oracle: Some(self.oracle.clone()),
                remediation: Some(self.remediation.clone()),
                partitioning: Some(self.partitioning.clone()),
                selection: Some(self.selection.clone()),
            }),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}
