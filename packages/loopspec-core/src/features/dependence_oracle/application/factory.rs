//! Chain composition from configuration

use super::chain::OracleChain;
use crate::config::{OracleConfig, OracleModuleKind};
use crate::features::dependence_oracle::infrastructure::{
    CommutativeLibsModule, ConservativeModule, ControlSpeculationModule, FootprintAwareModule,
    HeapClassificationModule, ObservedDependenceModule, PointerResidueModule, PointsToModule,
    ValuePredictionModule,
};
use crate::features::dependence_oracle::ports::OracleModule;
use crate::shared::models::ProgramContext;
use rustc_hash::FxHashSet;
use std::time::Duration;

/// Instantiate one module. In a speculative chain the footprint module also
/// prunes profile-dead effects.
pub fn create_module(
    kind: OracleModuleKind,
    config: &OracleConfig,
    speculative: bool,
) -> Box<dyn OracleModule> {
    let depth = u32::try_from(config.max_context_depth).unwrap_or(u32::MAX);
    match kind {
        OracleModuleKind::Conservative => Box::new(ConservativeModule),
        OracleModuleKind::PointsTo => Box::new(PointsToModule),
        OracleModuleKind::FootprintAware if speculative => {
            Box::new(FootprintAwareModule::speculative(depth))
        }
        OracleModuleKind::FootprintAware => Box::new(FootprintAwareModule::new(depth)),
        OracleModuleKind::ControlSpeculation => Box::new(ControlSpeculationModule::new()),
        OracleModuleKind::ObservedDependence => Box::new(ObservedDependenceModule::new(
            config.observed_dependence_threshold,
        )),
        OracleModuleKind::PointerResidue => Box::new(PointerResidueModule),
        OracleModuleKind::HeapClassification => Box::new(HeapClassificationModule),
        OracleModuleKind::CommutativeLibs => Box::new(CommutativeLibsModule),
        OracleModuleKind::ValuePrediction => Box::new(ValuePredictionModule),
    }
}

/// Build the static chain, or with `speculative` the static modules plus the
/// configured speculative ones
pub fn build_chain<'p>(
    program: ProgramContext<'p>,
    config: &OracleConfig,
    speculative: bool,
) -> OracleChain<'p> {
    let mut kinds = config.modules.clone();
    if speculative {
        kinds.extend(config.speculative_modules.iter().copied());
    }
    let mut seen = FxHashSet::default();
    kinds.retain(|k| seen.insert(*k));
    let timeout = (config.query_timeout_ms > 0)
        .then(|| Duration::from_millis(config.query_timeout_ms));
    OracleChain::builder(program)
        .modules(kinds.into_iter().map(|k| create_module(k, config, speculative)))
        .timeout(timeout)
        .cache_capacity(config.cache_capacity)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use crate::shared::models::*;

    #[test]
    fn test_static_and_speculative_chains() {
        let p = Program::new(ProgramDef::default()).unwrap();
        let prof = ExecutionProfile::default();
        let heap = HeapAssignment::default();
        let ctx = ProgramContext::new(&p, &prof, &heap);
        let config = OracleConfig::from_preset(Preset::Thorough);

        let plain = build_chain(ctx, &config, false);
        assert_eq!(plain.module_names(), vec!["points_to", "footprint_aware", "conservative"]);

        let spec = build_chain(ctx, &config, true);
        let names = spec.module_names();
        assert_eq!(names.first(), Some(&"points_to"));
        assert_eq!(names.last(), Some(&"conservative"));
        assert!(names.contains(&"speculative_footprint"));
        assert!(names.len() > plain.len());
    }
}
