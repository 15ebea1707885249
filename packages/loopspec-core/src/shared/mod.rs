//! Shared module - host program model, constants, analyses
//!
//! Types here are used by every feature; nothing in `shared` depends on a
//! feature module.

#[macro_use]
pub mod macros;
pub mod analysis;
pub mod constants;
pub mod models;

#[cfg(test)]
pub mod fixtures;

pub use models::*;
