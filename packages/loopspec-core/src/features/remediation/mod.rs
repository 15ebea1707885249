//! Remediation
//!
//! Remediators bid on disputed dependences with priced remedies. The
//! removability pass asks them about every dependence of a loop up front;
//! once a critic has chosen a plan, the cheapest cover of its criticisms is
//! selected from the resulting catalog.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{select_cover, CatalogEntry, RemedyCatalog, RemedySelection, RemovabilityPass};
pub use domain::{ReductionTarget, RemediatorStats, Remedies, Remedy, RemedyPayload, SetOfRemedies};
pub use infrastructure::{create_remediator, create_remediators};
pub use ports::{RemediationContext, Remediator, RemedyResponse};
