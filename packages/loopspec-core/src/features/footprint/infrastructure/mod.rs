pub mod dead_block_kill;
pub mod search;

pub use dead_block_kill::DeadBlockKill;
pub use search::FootprintSearch;
