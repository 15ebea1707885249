//! Remedy catalog and the removability pass
//!
//! Every dependence of the loop is offered to every enabled remediator
//! before any critic runs. A dependence with at least one remedy is marked
//! removable in the PDG with the cost of its cheapest alternative; the
//! catalog keeps every alternative for pricing and diagnostics.
//!
//! Remediators that reason about removability (loop fission) run in a
//! second round, after the first round's marks are in place. An
//! alternative of a remedy that requires other dependences removed as well
//! includes the cheapest remedy of each of them.

use crate::config::RemediationConfig;
use crate::features::partitioning::ports::PerformanceEstimator;
use crate::features::pdg::{Criticism, Criticisms, Dependence, ProgramDependenceGraph};
use crate::features::remediation::domain::{RemediatorStats, Remedies, Remedy, SetOfRemedies};
use crate::features::remediation::ports::{RemediationContext, Remediator};
use crate::shared::models::ProgramContext;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Remedy alternatives per removable dependence
#[derive(Debug, Clone, Default)]
pub struct RemedyCatalog {
    alternatives: BTreeMap<Criticism, SetOfRemedies>,
}

/// One catalog row, as reported
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub dependence: Dependence,
    pub min_cost: u64,
    pub alternatives: SetOfRemedies,
}

impl RemedyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `remedy` as an alternative for each criticism it resolves
    pub fn offer(&mut self, remedy: Remedy) {
        let mut alternative = Remedies::new();
        for required in &remedy.requires {
            match self.cheapest(required) {
                Some(best) => alternative.extend(best.clone()),
                None => {
                    trace!(dep = %required, remedy = remedy.name(), "requirement has no remedy");
                    return;
                }
            }
        }
        let resolved: Vec<Criticism> = remedy.resolved.iter().copied().collect();
        alternative.insert(remedy);
        for c in resolved {
            self.alternatives
                .entry(c)
                .or_default()
                .insert(alternative.clone());
        }
    }

    pub fn alternatives(&self, dep: &Criticism) -> Option<&SetOfRemedies> {
        self.alternatives.get(dep)
    }

    pub fn cheapest(&self, dep: &Criticism) -> Option<&Remedies> {
        self.alternatives.get(dep)?.cheapest()
    }

    pub fn min_cost(&self, dep: &Criticism) -> Option<u64> {
        self.alternatives.get(dep)?.min_cost()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.alternatives
            .iter()
            .filter_map(|(dep, set)| {
                Some(CatalogEntry {
                    dependence: *dep,
                    min_cost: set.min_cost()?,
                    alternatives: set.clone(),
                })
            })
            .collect()
    }

    fn mark(&self, pdg: &mut ProgramDependenceGraph) {
        for (dep, set) in &self.alternatives {
            if let Some(cost) = set.min_cost() {
                pdg.mark_removable(*dep, cost);
            }
        }
    }
}

/// Offers every loop dependence to the remediators and records removability
pub struct RemovabilityPass<'r, 'p> {
    remediators: &'r [Box<dyn Remediator + 'p>],
}

impl<'r, 'p> RemovabilityPass<'r, 'p> {
    pub fn new(remediators: &'r [Box<dyn Remediator + 'p>]) -> Self {
        Self { remediators }
    }

    /// Clears previous marks, then marks every dependence some remediator
    /// removes. Statistics come back in configuration order.
    pub fn run(
        &self,
        program: ProgramContext<'_>,
        pdg: &mut ProgramDependenceGraph,
        estimator: &dyn PerformanceEstimator,
        config: &RemediationConfig,
    ) -> (RemedyCatalog, Vec<RemediatorStats>) {
        pdg.clear_removability();
        let candidates: Criticisms = pdg.internal_dependences().collect();
        let mut catalog = RemedyCatalog::new();
        let mut stats: Vec<RemediatorStats> = self
            .remediators
            .iter()
            .map(|r| RemediatorStats::new(r.kind()))
            .collect();

        for second_round in [false, true] {
            {
                let cx = RemediationContext {
                    program,
                    loop_id: pdg.loop_id(),
                    pdg,
                    estimator,
                    config,
                };
                for (i, remediator) in self.remediators.iter().enumerate() {
                    if remediator.needs_removability() != second_round {
                        continue;
                    }
                    let remedies = remediator.satisfy(&cx, &candidates);
                    stats[i].queries += candidates.len() as u64;
                    for remedy in remedies {
                        stats[i].removed += remedy.resolved.len() as u64;
                        catalog.offer(remedy);
                    }
                }
            }
            catalog.mark(pdg);
        }

        debug!(
            loop_id = %pdg.loop_id(),
            dependences = candidates.len(),
            removable = catalog.len(),
            "removability marked"
        );
        (catalog, stats)
    }
}
