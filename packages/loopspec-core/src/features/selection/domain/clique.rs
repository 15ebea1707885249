//! Maximum-weight clique
//!
//! Bron–Kerbosch with pivoting, extended with a weight bound: a branch is
//! abandoned once the clique so far plus every remaining candidate cannot
//! beat the best clique found. Only maximal cliques are recorded, so the
//! result cannot be grown by any vertex.

use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Clique {
    /// Vertex indices, ascending
    pub members: Vec<usize>,
    pub weight: u64,
}

struct Search<'g> {
    adjacency: &'g [BTreeSet<usize>],
    weights: &'g [u64],
    best: Option<Clique>,
}

impl Search<'_> {
    fn weight_of<'a>(&self, vertices: impl Iterator<Item = &'a usize>) -> u64 {
        vertices.fold(0u64, |acc, v| acc.saturating_add(self.weights[*v]))
    }

    fn hopeless(&self, clique_weight: u64, candidates: &BTreeSet<usize>) -> bool {
        match &self.best {
            Some(best) => {
                clique_weight.saturating_add(self.weight_of(candidates.iter())) <= best.weight
            }
            None => false,
        }
    }

    fn expand(
        &mut self,
        clique: &mut Vec<usize>,
        clique_weight: u64,
        mut candidates: BTreeSet<usize>,
        mut excluded: BTreeSet<usize>,
    ) {
        if candidates.is_empty() {
            let improves = self.best.as_ref().map_or(true, |b| clique_weight > b.weight);
            if excluded.is_empty() && improves {
                let mut members = clique.clone();
                members.sort_unstable();
                self.best = Some(Clique {
                    members,
                    weight: clique_weight,
                });
            }
            return;
        }
        if self.hopeless(clique_weight, &candidates) {
            return;
        }

        let adjacency = self.adjacency;
        let pivot = candidates
            .union(&excluded)
            .max_by_key(|u| candidates.intersection(&adjacency[**u]).count())
            .copied();
        let branches: Vec<usize> = match pivot {
            Some(u) => candidates.difference(&adjacency[u]).copied().collect(),
            None => candidates.iter().copied().collect(),
        };

        for v in branches {
            let neighbors = &adjacency[v];
            clique.push(v);
            self.expand(
                clique,
                clique_weight.saturating_add(self.weights[v]),
                candidates.intersection(neighbors).copied().collect(),
                excluded.intersection(neighbors).copied().collect(),
            );
            clique.pop();
            candidates.remove(&v);
            excluded.insert(v);
            if self.hopeless(clique_weight, &candidates) {
                return;
            }
        }
    }
}

/// Heaviest maximal clique of the undirected graph given by `adjacency`
/// (symmetric, no self loops). Ties keep the first clique found.
pub fn max_weight_clique(adjacency: &[BTreeSet<usize>], weights: &[u64]) -> Clique {
    debug_assert_eq!(adjacency.len(), weights.len());
    let mut search = Search {
        adjacency,
        weights,
        best: None,
    };
    search.expand(
        &mut Vec::new(),
        0,
        (0..adjacency.len()).collect(),
        BTreeSet::new(),
    );
    search.best.unwrap_or_default()
}

/// Whether `members` are pairwise adjacent
pub fn is_clique(adjacency: &[BTreeSet<usize>], members: &[usize]) -> bool {
    members.iter().enumerate().all(|(i, u)| {
        members[i + 1..]
            .iter()
            .all(|v| adjacency[*u].contains(v))
    })
}

/// Whether no vertex outside `members` is adjacent to all of them
pub fn is_maximal(adjacency: &[BTreeSet<usize>], members: &[usize]) -> bool {
    (0..adjacency.len())
        .filter(|v| !members.contains(v))
        .all(|v| members.iter().any(|m| !adjacency[v].contains(m)))
}
