//! Remedy selection for the criticisms of one plan
//!
//! Criticisms are covered in order with the cheapest alternative of each.
//! A remedy only keeps the criticisms it is the first to cover, so every
//! criticism ends up targeted by exactly one selected remedy.

use super::catalog::RemedyCatalog;
use crate::config::RemediatorKind;
use crate::features::pdg::Criticisms;
use crate::features::remediation::domain::Remedies;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Remedies chosen for one plan
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemedySelection {
    pub remedies: Remedies,
    pub cost: u64,
    /// Selected remedies per remediator
    pub per_remediator: BTreeMap<RemediatorKind, u64>,
}

/// `None` when some criticism has no remedy at all
pub fn select_cover(catalog: &RemedyCatalog, criticisms: &Criticisms) -> Option<RemedySelection> {
    let mut covered = Criticisms::new();
    let mut wanted = criticisms.clone();
    let mut remedies = Remedies::new();

    for criticism in criticisms {
        if covered.contains(criticism) {
            continue;
        }
        let Some(best) = catalog.cheapest(criticism) else {
            debug!(dep = %criticism, "criticism has no remedy");
            return None;
        };
        for remedy in best.iter() {
            wanted.extend(remedy.requires.iter().copied());
        }
        for remedy in best.iter() {
            let mut remedy = remedy.clone();
            remedy
                .resolved
                .retain(|c| wanted.contains(c) && !covered.contains(c));
            if remedy.resolved.is_empty() {
                continue;
            }
            covered.extend(remedy.resolved.iter().copied());
            remedies.insert(remedy);
        }
    }

    let mut per_remediator = BTreeMap::new();
    for remedy in remedies.iter() {
        *per_remediator.entry(remedy.remediator).or_insert(0) += 1;
    }
    Some(RemedySelection {
        cost: remedies.total_cost(),
        remedies,
        per_remediator,
    })
}
