pub mod opportunities;
pub mod selector;

pub use opportunities::find_opportunities;
pub use selector::LoopSelector;
