use serde::Serialize;

use crate::zone::Zone;

/// Cross-zone consistency check of the live shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TriageReport {
    /// Registry holds content but the zone's bridge is not mounted.
    pub orphan_slots: Vec<Zone>,
    /// The bridge is showing something other than the registry's latest content.
    pub broken_projections: Vec<Zone>,
    /// Ready bridges whose renderer missed the handoff deadline.
    pub orphaned_bridges: Vec<Zone>,
    /// Warnings from the latest validation result.
    pub hydration_warnings: Vec<String>,
    pub is_clean: bool,
}

impl TriageReport {
    pub(crate) fn finish(mut self) -> Self {
        self.is_clean = self.orphan_slots.is_empty()
            && self.broken_projections.is_empty()
            && self.orphaned_bridges.is_empty()
            && self.hydration_warnings.is_empty();
        self
    }
}
