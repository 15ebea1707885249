//! Footprint ports

use super::domain::{ContextArena, CtxId};
use crate::shared::models::OpId;

/// Prunes operations whose effect cannot be observed at the point of
/// interest
pub trait KillOracle {
    fn is_killed(&self, op: OpId, ctx: CtxId, arena: &ContextArena) -> bool;
}
