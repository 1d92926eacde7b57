//! Trust model — bounded reinforcement of neighbor confidence
//!
//! Every processed hello nudges the sender's trust up by a small fixed delta.
//! Nothing in this model ever lowers trust on its own; missed hellos simply
//! stop the reinforcement.

use super::neighbor::{NeighborTable, NodeAddress};

/// Clamp a trust value into [0.0, 1.0]; NaN counts as no trust
pub(crate) fn clamp_trust(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Add `delta` to a neighbor's trust, keeping it within [0.0, 1.0].
///
/// Returns the new trust, or None when the neighbor is not in the table
/// (it must be inserted by an upsert first). Non-finite deltas are ignored.
pub fn adjust(table: &mut NeighborTable, address: &NodeAddress, delta: f32) -> Option<f32> {
    let record = table.get_mut(address)?;
    if delta.is_finite() {
        record.trust = clamp_trust(record.trust + delta);
    }
    Some(record.trust)
}
