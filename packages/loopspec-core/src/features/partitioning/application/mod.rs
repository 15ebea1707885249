//! Partitioning application layer
//!
//! - `run_critics`: every enabled critic over one loop
//! - `estimate` / `evaluate`: the expected-saving model

pub mod critique;
pub mod speedup;

pub use critique::run_critics;
pub use speedup::{estimate, evaluate, SpeedupEstimate};
