//! Derived control-flow analyses over the host program

pub mod loop_cfg;

pub use loop_cfg::LoopCfg;
