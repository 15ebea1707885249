//! Interprocedural footprint search
//!
//! Lazily enumerates the escaping memory effects below a call site, each
//! tagged with a hash-consed calling context.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{ContextArena, CtxId, FootprintEntry, SearchOrder};
pub use infrastructure::{DeadBlockKill, FootprintSearch};
pub use ports::KillOracle;
