//! Loop selection ports

use crate::errors::Result;
use crate::features::selection::domain::{InlinedProgram, InliningOpportunity};
use crate::shared::models::{ExecutionProfile, Program};

/// Rewrites a program by inlining call sites between selection rounds
pub trait LateInliner {
    /// The rewritten program and its profile, or `None` when no call site
    /// was inlined. Operation, block and loop ids of the input stay valid
    /// in the output.
    fn inline(
        &self,
        program: &Program,
        profile: &ExecutionProfile,
        sites: &[InliningOpportunity],
    ) -> Result<Option<InlinedProgram>>;
}
