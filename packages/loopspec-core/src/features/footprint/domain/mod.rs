//! Footprint domain

pub mod context;

pub use context::{ContextArena, CtxId};

use crate::shared::models::OpId;
use serde::Serialize;

/// Enumeration order of a footprint search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchOrder {
    /// Program order, callers before callees' bodies (dominator order)
    Forward,
    /// Reverse program order (post-dominator order)
    Backward,
}

/// One memory effect reached by a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FootprintEntry {
    pub op: OpId,
    pub ctx: CtxId,
    /// The effect could not be expanded further (external, indirect or
    /// recursive call, or context depth exhausted); only its declared
    /// effects are known
    pub opaque: bool,
}
