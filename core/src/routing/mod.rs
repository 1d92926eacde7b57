//! D-SERAN routing — energy- and trust-aware next-hop selection
//!
//! Single-hop decision logic only: there is no route discovery and no routing
//! table beyond the one neighbor a node currently forwards through.
//! - Neighbor table: bounded record of every neighbor heard
//! - Trust: slow, bounded reinforcement on every hello
//! - Selector: best trust × energy among admissible neighbors
//! - Engine: per-node orchestrator driven by host events

pub mod engine;
pub mod neighbor;
pub mod selector;
pub mod trust;

pub use engine::{DecisionEngine, EngineState, EventOutcome, NodeEvent};
pub use neighbor::{
    AddressParseError, NeighborRecord, NeighborTable, NodeAddress, RejectReason, UpsertOutcome,
};
pub use selector::{rank, select, SelectionThresholds};
pub use trust::adjust;
