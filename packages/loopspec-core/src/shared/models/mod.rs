//! Host program model consumed by the planner

pub mod context;
pub mod heap;
pub mod ids;
pub mod operation;
pub mod profile;
pub mod program;

pub use context::ProgramContext;
pub use heap::{HeapAssignment, HeapClass, ReductionOperator};
pub use ids::{BlockId, FunctionId, LoopId, ObjectId, OpId, PtrId};
pub use operation::{Callee, ExternalEffect, MemAccess, OpKind, Operation};
pub use profile::{ExecutionProfile, ObservedDependence};
pub use program::{
    AbstractObject, Block, Function, InductionVariable, Loop, MemoryEffects, ObjectKind,
    PointerInfo, Program, ProgramDef, RegisterReduction,
};
