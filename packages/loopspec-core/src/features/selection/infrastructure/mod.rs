//! Late inliners

pub mod call_site_inliner;
pub mod no_inlining;

pub use call_site_inliner::CallSiteInliner;
pub use no_inlining::NoInlining;
