//! Partitioning
//!
//! Critics split a loop into pipeline stages over the optimistic dependence
//! graph, where every removable dependence is assumed gone, and report back
//! the removed dependences their stages rely on as criticisms.
//!
//! - DOALL: one parallel stage, valid when nothing carried survives
//! - DSWP: balanced sequential pipeline over the component DAG
//! - PS-DSWP: sequential stages around a maximal parallel stage

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{estimate, evaluate, run_critics, SpeedupEstimate};
pub use domain::{ParallelizationPlan, Stage, StageKind};
pub use infrastructure::{
    create_critic, estimator_for, DoallCritic, DswpCritic, FlatEstimator, FlowNetwork,
    ProfileEstimator, PsDswpCritic,
};
pub use ports::{Critic, CriticInput, PerformanceEstimator};
