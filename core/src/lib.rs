// D-SERAN Core — Distributed Self-healing Energy-aware Routing for Ad hoc Networks
//
// Every node advertises its residual energy in periodic hellos, keeps a small
// table of the neighbors it hears, and forwards through whichever neighbor
// scores best on trust × energy. Nothing here knows about sockets or clocks;
// the host feeds events in and reads the current next hop out.

pub mod config;
pub mod energy;
pub mod hello;
pub mod mobility;
pub mod routing;
pub mod stats;
pub mod transport;

use parking_lot::Mutex;
use std::sync::Arc;

pub use config::{ConfigError, DseranConfig, TrustSource, MAX_INTERVAL_MS};
pub use energy::EnergyModel;
pub use hello::{HelloError, HelloMessage, HELLO_LEN, HELLO_MIN_LEN};
pub use mobility::{MobilityConfig, MobilityModel, Position};
pub use routing::{
    AddressParseError, DecisionEngine, EngineState, EventOutcome, NeighborRecord, NeighborTable,
    NodeAddress, NodeEvent, RejectReason, SelectionThresholds, UpsertOutcome,
};
pub use stats::NodeStats;
pub use transport::HelloTransport;

/// One engine behind one lock, for hosts that drive a node from several tasks.
///
/// Table mutation and next-hop selection must not interleave: take the lock
/// for every event.
pub type SharedEngine = Arc<Mutex<DecisionEngine>>;

/// Wrap an engine for use from a multi-threaded host
pub fn share(engine: DecisionEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// Target for metric trace events (SEND_UDP, RECV, ENERGY, HOP, MOVE, LIFETIME)
pub const METRICS_TARGET: &str = "dseran::metrics";
