use crate::config::RemediatorKind;
use serde::Serialize;

/// Diagnostics of one remediator over one loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemediatorStats {
    pub remediator: RemediatorKind,
    /// Criticisms offered
    pub queries: u64,
    /// Criticisms for which a remedy was returned
    pub removed: u64,
}

impl RemediatorStats {
    pub fn new(remediator: RemediatorKind) -> Self {
        Self {
            remediator,
            queries: 0,
            removed: 0,
        }
    }

    pub fn removal_rate(&self) -> f64 {
        if self.queries == 0 {
            0.0
        } else {
            self.removed as f64 / self.queries as f64
        }
    }
}
