//! Common test utilities
//!
//! Shared fixtures, builders and assertions for the integration suites.
//! Crate-internal fixtures are `cfg(test)` only, so programs are rebuilt
//! here through the public model types.

#![allow(dead_code)]

mod assertions;
mod builders;
mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
