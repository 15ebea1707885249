//! Typed indices into the host program model
//!
//! Every id is the position of its entity in the owning `Program` vector,
//! which `Program::try_from` checks on load.

define_id!(
    /// Operation (instruction-equivalent) id
    OpId,
    "op"
);
define_id!(
    /// Basic block id
    BlockId,
    "bb"
);
define_id!(
    /// Natural loop id
    LoopId,
    "loop"
);
define_id!(
    /// Function id
    FunctionId,
    "fn"
);
define_id!(
    /// Pointer value id (operand of loads/stores)
    PtrId,
    "ptr"
);
define_id!(
    /// Abstract heap object id
    ObjectId,
    "obj"
);
