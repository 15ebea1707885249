//! PDG application layer
//!
//! Main entry point: `PdgBuilder::build()`

pub mod builder;

pub use builder::{PdgBuildStats, PdgBuilder};
