use crate::errors::Result;
use crate::features::selection::domain::{InlinedProgram, InliningOpportunity};
use crate::features::selection::ports::LateInliner;
use crate::shared::models::{ExecutionProfile, Program};

/// Inliner that never changes the program
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInlining;

impl LateInliner for NoInlining {
    fn inline(
        &self,
        _program: &Program,
        _profile: &ExecutionProfile,
        _sites: &[InliningOpportunity],
    ) -> Result<Option<InlinedProgram>> {
        Ok(None)
    }
}
