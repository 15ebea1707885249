//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains:
//! - domain/     - Pure planning logic
//! - ports/      - Interface definitions (traits)
//! - application/ - Use cases
//! - infrastructure/ - Concrete implementations of the ports
//!
//! Bottom-up: footprint -> dependence_oracle -> pdg -> remediation /
//! partitioning -> orchestration -> selection.

// Interprocedural memory footprints of call sites
pub mod footprint;

// Chain of memory-dependence oracle modules
pub mod dependence_oracle;

// Per-loop program dependence graph and condensation
pub mod pdg;

// Priced removal of dependences
pub mod remediation;

// Critics: DOALL, DSWP, PS-DSWP
pub mod partitioning;

// Per-loop strategy search
pub mod orchestration;

// Cross-loop selection and late inlining
pub mod selection;
