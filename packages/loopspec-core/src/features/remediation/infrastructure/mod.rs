//! Concrete remediators
//!
//! | remediator            | removes                                   | cost      |
//! |-----------------------|-------------------------------------------|-----------|
//! | `control_speculation` | edges through profile-dead control flow   | 50        |
//! | `memory_versioning`   | loop-carried write-after-read             | 0         |
//! | `value_prediction`    | carried values of predictable phis/loads  | 58        |
//! | `loop_fission`        | carried edges out of a replayable prefix  | 60        |
//! | `heap_classification` | edges between separable heap classes      | 40 + 100/5|
//! | `commutative_libs`    | edges between reorderable library calls   | 15        |
//! | `reduction`           | carried reduction updates                 | 2         |
//! | `counted_iv`          | induction cycle and exit control          | 0         |
//! | `memory_speculation`  | carried memory edges the profile refutes  | 1500      |

pub mod commutative_libs;
pub mod control_speculation;
pub mod counted_iv;
pub mod heap_classification;
pub mod loop_fission;
pub mod memory_speculation;
pub mod memory_versioning;
pub mod reduction;
pub mod value_prediction;

pub use commutative_libs::CommutativeLibsRemediator;
pub use control_speculation::ControlSpeculationRemediator;
pub use counted_iv::CountedIvRemediator;
pub use heap_classification::HeapClassificationRemediator;
pub use loop_fission::LoopFissionRemediator;
pub use memory_speculation::MemorySpeculationRemediator;
pub use memory_versioning::MemoryVersioningRemediator;
pub use reduction::ReductionRemediator;
pub use value_prediction::ValuePredictionRemediator;

use crate::config::{OracleConfig, RemediatorKind};
use crate::features::remediation::ports::Remediator;
use crate::shared::models::ProgramContext;

/// Instantiate one remediator
pub fn create_remediator<'p>(
    kind: RemediatorKind,
    ctx: ProgramContext<'p>,
    oracle: &OracleConfig,
) -> Box<dyn Remediator + 'p> {
    match kind {
        RemediatorKind::ControlSpeculation => Box::new(ControlSpeculationRemediator::new()),
        RemediatorKind::MemoryVersioning => Box::new(MemoryVersioningRemediator),
        RemediatorKind::ValuePrediction => Box::new(ValuePredictionRemediator),
        RemediatorKind::LoopFission => Box::new(LoopFissionRemediator),
        RemediatorKind::HeapClassification => Box::new(HeapClassificationRemediator),
        RemediatorKind::CommutativeLibs => Box::new(CommutativeLibsRemediator),
        RemediatorKind::Reduction => Box::new(ReductionRemediator),
        RemediatorKind::CountedIv => Box::new(CountedIvRemediator),
        RemediatorKind::MemorySpeculation => {
            Box::new(MemorySpeculationRemediator::new(ctx, oracle))
        }
    }
}

/// Remediators in configuration order
pub fn create_remediators<'p>(
    kinds: &[RemediatorKind],
    ctx: ProgramContext<'p>,
    oracle: &OracleConfig,
) -> Vec<Box<dyn Remediator + 'p>> {
    kinds
        .iter()
        .map(|kind| create_remediator(*kind, ctx, oracle))
        .collect()
}
