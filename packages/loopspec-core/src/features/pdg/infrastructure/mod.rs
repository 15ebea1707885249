pub mod condensation;
pub mod pdg;

pub use condensation::{Condensation, Scc, SccId};
pub use pdg::{PdgDto, PdgNode, PdgStats, ProgramDependenceGraph};
