//! Partitioning infrastructure
//!
//! - `estimator`: flat and profile-driven operation weights
//! - `min_cut`: Edmonds-Karp max-flow with an infinite-capacity sentinel
//! - `doall`, `dswp`, `ps_dswp`: the three critics

pub mod doall;
pub mod dswp;
pub mod estimator;
pub mod min_cut;
pub mod ps_dswp;

pub use doall::DoallCritic;
pub use dswp::DswpCritic;
pub use estimator::{estimator_for, FlatEstimator, ProfileEstimator};
pub use min_cut::{FlowNetwork, Vertex, INFINITY, MAX_FINITE, SINK, SOURCE};
pub use ps_dswp::PsDswpCritic;

use crate::config::CriticKind;
use crate::features::partitioning::ports::Critic;

pub fn create_critic(kind: CriticKind) -> Box<dyn Critic> {
    match kind {
        CriticKind::PsDswp => Box::new(PsDswpCritic),
        CriticKind::Dswp => Box::new(DswpCritic),
        CriticKind::Doall => Box::new(DoallCritic),
    }
}
