//! Read-only bundle of the planner inputs for one program

use super::heap::HeapAssignment;
use super::profile::ExecutionProfile;
use super::program::Program;

/// Program, profile and heap assignment, shared by reference everywhere
#[derive(Debug, Clone, Copy)]
pub struct ProgramContext<'p> {
    pub program: &'p Program,
    pub profile: &'p ExecutionProfile,
    pub heap: &'p HeapAssignment,
}

impl<'p> ProgramContext<'p> {
    pub fn new(
        program: &'p Program,
        profile: &'p ExecutionProfile,
        heap: &'p HeapAssignment,
    ) -> Self {
        Self {
            program,
            profile,
            heap,
        }
    }
}
