//! Next-hop selection
//!
//! Score every neighbor as `trust × residual_energy`, drop the ones that are
//! not trusted enough or too drained, and forward through the best of the
//! rest. Selection keeps no memory between calls: a route is stable only as
//! long as the scores behind it are.

use super::neighbor::{NeighborRecord, NeighborTable, NodeAddress};

/// Admission thresholds. Both comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionThresholds {
    /// Minimum trust (exclusive)
    pub trust: f32,
    /// Minimum residual energy (exclusive)
    pub energy: u16,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            trust: 0.5,
            energy: 10,
        }
    }
}

/// Combined trust/energy score of a neighbor
pub fn score(record: &NeighborRecord) -> f32 {
    record.trust * f32::from(record.residual_energy)
}

pub fn is_eligible(record: &NeighborRecord, thresholds: &SelectionThresholds) -> bool {
    record.trust > thresholds.trust && record.residual_energy > thresholds.energy
}

/// Pick the best eligible neighbor.
///
/// Ties go to the neighbor inserted first. None means there is currently no
/// trusted, energetic neighbor to forward through.
pub fn select(table: &NeighborTable, thresholds: &SelectionThresholds) -> Option<NodeAddress> {
    let mut best_score = -1.0_f32;
    let mut best = None;

    for record in table.iter() {
        let candidate = score(record);
        if candidate > best_score && is_eligible(record, thresholds) {
            best_score = candidate;
            best = Some(record.address);
        }
    }

    best
}

/// Every eligible neighbor with its score, best first (insertion order on ties)
pub fn rank(table: &NeighborTable, thresholds: &SelectionThresholds) -> Vec<(NodeAddress, f32)> {
    let mut ranked: Vec<(NodeAddress, f32)> = table
        .iter()
        .filter(|r| is_eligible(r, thresholds))
        .map(|r| (r.address, score(r)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
