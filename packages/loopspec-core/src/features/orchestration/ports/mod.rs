//! Orchestration ports
//!
//! `LoopPlanner` is what the loop selector asks for one loop's report; the
//! orchestrator is the production implementation.

use crate::errors::Result;
use crate::features::orchestration::domain::LoopReport;
use crate::shared::models::{LoopId, ProgramContext};

pub trait LoopPlanner {
    /// Best strategy for `loop_id`, or why there is none. `Err` only for
    /// malformed inputs.
    fn plan_loop(&self, ctx: ProgramContext<'_>, loop_id: LoopId) -> Result<LoopReport>;
}
