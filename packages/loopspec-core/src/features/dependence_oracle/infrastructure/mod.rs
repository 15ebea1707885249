//! Concrete oracle modules
//!
//! Static modules (always sound):
//! - `conservative`: effect-only answers, last in every chain
//! - `points_to`: underlying-object and constant-offset disjointness
//! - `footprint_aware`: expands calls into their interprocedural footprint
//!
//! Speculative modules (answers carry the price of their assumption):
//! - `control_speculation`, `observed_dependence`, `pointer_residue`,
//!   `heap_classification`, `commutative_libs`, `value_prediction`

pub mod commutative_libs;
pub mod conservative;
pub mod control_speculation;
pub mod footprint_aware;
pub mod heap_classification;
pub mod observed_dependence;
pub mod pointer_residue;
pub mod points_to;
pub mod value_prediction;

pub use commutative_libs::CommutativeLibsModule;
pub use conservative::ConservativeModule;
pub use control_speculation::{speculative_loop_cfg, ControlSpeculationModule};
pub use footprint_aware::FootprintAwareModule;
pub use heap_classification::HeapClassificationModule;
pub use observed_dependence::ObservedDependenceModule;
pub use pointer_residue::PointerResidueModule;
pub use points_to::PointsToModule;
pub use value_prediction::ValuePredictionModule;

use super::domain::ModRefTarget;
use crate::shared::models::{MemAccess, ObjectId, Program};

/// Direct pointer access named by a query target
pub(crate) fn target_access(program: &Program, target: ModRefTarget) -> Option<MemAccess> {
    match target {
        ModRefTarget::Op(op) => program.op(op).direct_access(),
        ModRefTarget::Access(access) => Some(access),
    }
}

/// Objects a pointer may address; `None` when unknown
pub(crate) fn known_targets(program: &Program, access: MemAccess) -> Option<&[ObjectId]> {
    let ptr = program.pointer(access.ptr);
    (!ptr.is_unknown()).then_some(ptr.targets.as_slice())
}
