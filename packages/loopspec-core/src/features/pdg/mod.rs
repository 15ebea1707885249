//! Loop program dependence graph
//!
//! - `domain`: dependence kinds, per-pair flavour sets, criticisms
//! - `infrastructure`: the petgraph-backed graph and its SCC condensation
//! - `application`: construction from the host program and an oracle

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{PdgBuildStats, PdgBuilder};
pub use domain::{Criticism, Criticisms, DepBits, DepKind, Dependence};
pub use infrastructure::{Condensation, Scc, SccId, ProgramDependenceGraph};
pub use ports::MemoryDependenceOracle;
