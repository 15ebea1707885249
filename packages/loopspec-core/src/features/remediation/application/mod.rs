//! Remediation application layer
//!
//! - `RemovabilityPass`: marks removable dependences and fills the catalog
//! - `select_cover`: picks the remedies one plan needs

pub mod catalog;
pub mod cover;

pub use catalog::{CatalogEntry, RemedyCatalog, RemovabilityPass};
pub use cover::{select_cover, RemedySelection};
