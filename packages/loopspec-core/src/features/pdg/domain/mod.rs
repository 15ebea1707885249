//! Dependence graph domain
//!
//! A criticism is a dependence a candidate plan cannot honor without
//! removing it; remediators bid on criticisms.

pub mod dependence;

pub use dependence::{DepBits, DepKind, Dependence};

use std::collections::BTreeSet;

pub type Criticism = Dependence;

/// Deterministically ordered set of criticisms
pub type Criticisms = BTreeSet<Criticism>;
