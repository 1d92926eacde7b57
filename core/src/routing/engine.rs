//! Routing Decision Engine — one D-SERAN node
//!
//! Ties the energy budget, neighbor table, trust model and next-hop selector
//! together behind a single event-driven API. The host turns timers, sockets
//! and mobility callbacks into [`NodeEvent`]s and feeds them in one at a time;
//! the engine never blocks and never schedules anything itself.
//!
//! Lifecycle:
//! 1. **Active**: hellos are sent and received, energy is harvested, the next
//!    hop is re-evaluated on route-eval ticks and movement notifications.
//! 2. **Exhausted**: the last hello drained the battery. Terminal; every
//!    further event is ignored.

use super::neighbor::{NeighborTable, NodeAddress, UpsertOutcome};
use super::selector::{self, SelectionThresholds};
use super::trust::adjust as adjust_trust;
use crate::config::{ConfigError, DseranConfig, TrustSource};
use crate::energy::EnergyModel;
use crate::hello::{encode_hello, HelloMessage};
use crate::stats::NodeStats;
use crate::transport::HelloTransport;
use crate::METRICS_TARGET;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Lifecycle state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Active,
    /// Out of energy. Terminal.
    Exhausted,
}

/// Everything that can happen to a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// Time to broadcast a hello
    HelloTick,
    /// Time to harvest energy
    HarvestTick,
    /// Time to re-evaluate the next hop
    RouteEvalTick,
    /// A hello arrived from `sender`
    HelloReceived { payload: Vec<u8>, sender: NodeAddress },
    /// The node may have moved; topology may have changed
    MovementNotified,
}

/// What handling an event did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    /// A hello advertising `advertised` was broadcast; `residual` is what is left
    HelloSent { advertised: u16, residual: u16 },
    /// A hello was broadcast and it drained the battery
    EnergyExhausted,
    Harvested { residual: u16 },
    /// The hello was decoded and applied (or turned away by a full table)
    HelloProcessed {
        sender: NodeAddress,
        upsert: UpsertOutcome,
        trust: Option<f32>,
    },
    /// The hello was too short to decode and was dropped
    HelloDropped { len: usize },
    RouteEvaluated {
        next_hop: Option<NodeAddress>,
        changed: bool,
    },
    /// The node is exhausted; nothing happened
    Ignored,
}

/// The D-SERAN decision engine for one node
pub struct DecisionEngine {
    address: NodeAddress,
    config: DseranConfig,
    thresholds: SelectionThresholds,
    energy: EnergyModel,
    neighbors: NeighborTable,
    next_hop: Option<NodeAddress>,
    state: EngineState,
    stats: NodeStats,
    /// Hello nonces
    rng: StdRng,
}

impl DecisionEngine {
    /// Create a node. Fails if the configuration is invalid.
    pub fn new(address: NodeAddress, config: DseranConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.nonce_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "D-SERAN node {} initialized, energy {} mJ, table capacity {}",
            address, config.initial_energy, config.max_neighbors
        );

        Ok(Self {
            address,
            thresholds: config.thresholds(),
            energy: EnergyModel::new(&config),
            neighbors: NeighborTable::new(config.max_neighbors),
            next_hop: None,
            state: EngineState::Active,
            stats: NodeStats::default(),
            rng,
            config,
        })
    }

    /// Dispatch one event. `now` is the host clock in milliseconds.
    pub fn handle(
        &mut self,
        event: NodeEvent,
        now: u64,
        transport: &mut impl HelloTransport,
    ) -> EventOutcome {
        match event {
            NodeEvent::HelloTick => self.on_tick_hello(now, transport),
            NodeEvent::HarvestTick => self.on_tick_harvest(),
            NodeEvent::RouteEvalTick => self.on_tick_route_eval(),
            NodeEvent::HelloReceived { payload, sender } => {
                self.on_hello_received(&payload, sender, now)
            }
            NodeEvent::MovementNotified => self.on_movement_notified(),
        }
    }

    /// Broadcast a hello, then pay for it.
    ///
    /// The hello advertises the energy we had before sending it. If paying
    /// drains the battery the node becomes exhausted.
    pub fn on_tick_hello(&mut self, now: u64, transport: &mut impl HelloTransport) -> EventOutcome {
        if self.is_exhausted() {
            return EventOutcome::Ignored;
        }

        let advertised = self.energy.residual();
        let nonce: u16 = self.rng.gen();
        let payload = encode_hello(advertised, self.config.self_trust, nonce);
        transport.send_broadcast(&payload);
        self.stats.hellos_sent += 1;

        info!(target: METRICS_TARGET, node = %self.address, energy = advertised, at = now, "SEND_UDP");

        let residual = self.energy.consume_for_send();
        if self.energy.is_exhausted() {
            self.state = EngineState::Exhausted;
            self.stats.lifetime_end = Some(now);
            info!(target: METRICS_TARGET, node = %self.address, at = now, "LIFETIME");
            info!("D-SERAN node {} out of energy, leaving the network", self.address);
            return EventOutcome::EnergyExhausted;
        }

        EventOutcome::HelloSent {
            advertised,
            residual,
        }
    }

    pub fn on_tick_harvest(&mut self) -> EventOutcome {
        if self.is_exhausted() {
            return EventOutcome::Ignored;
        }

        self.energy.harvest();
        self.stats.harvest_ticks += 1;

        info!(
            target: METRICS_TARGET,
            node = %self.address,
            residual = self.energy.residual(),
            harvested = self.energy.harvested_total(),
            "ENERGY"
        );

        EventOutcome::Harvested {
            residual: self.energy.residual(),
        }
    }

    /// Apply a received hello: refresh the sender's record, then reinforce its trust.
    ///
    /// Undecodable payloads are dropped without touching any state. A sender
    /// that does not fit in a full table still counts as processed.
    pub fn on_hello_received(&mut self, payload: &[u8], sender: NodeAddress, now: u64) -> EventOutcome {
        if self.is_exhausted() {
            return EventOutcome::Ignored;
        }

        let hello = match HelloMessage::from_bytes(payload) {
            Ok(hello) => hello,
            Err(e) => {
                self.stats.hellos_malformed += 1;
                debug!("Dropping hello from {}: {}", sender, e);
                return EventOutcome::HelloDropped { len: payload.len() };
            }
        };

        let trust = match self.config.trust_source {
            TrustSource::SenderReported => hello.sanitized_trust(),
            TrustSource::Local => self
                .neighbors
                .get(&sender)
                .map(|r| r.trust())
                .unwrap_or(self.config.initial_trust),
        };

        let upsert = self
            .neighbors
            .upsert(sender, hello.residual_energy, trust, now);
        self.stats.hellos_received += 1;

        match upsert {
            UpsertOutcome::Inserted => debug!(
                "New neighbor {} (energy {}, trust {:.2}, total {})",
                sender,
                hello.residual_energy,
                trust,
                self.neighbors.len()
            ),
            UpsertOutcome::Updated => debug!(
                "Neighbor {} updated (energy {}, trust {:.2})",
                sender, hello.residual_energy, trust
            ),
            UpsertOutcome::Rejected(reason) => {
                self.stats.neighbors_rejected += 1;
                warn!("Cannot add neighbor {}: {:?}", sender, reason);
            }
        }

        let trust = adjust_trust(&mut self.neighbors, &sender, self.config.trust_reinforcement);

        if hello.residual_energy < self.config.energy_threshold {
            warn!(
                "Neighbor {} is low on energy: {} mJ",
                sender, hello.residual_energy
            );
        }

        info!(
            target: METRICS_TARGET,
            node = %self.address,
            from = %sender,
            energy = hello.residual_energy,
            at = now,
            "RECV"
        );

        EventOutcome::HelloProcessed {
            sender,
            upsert,
            trust,
        }
    }

    /// Topology may have changed: re-run selection
    pub fn on_movement_notified(&mut self) -> EventOutcome {
        if self.is_exhausted() {
            return EventOutcome::Ignored;
        }
        debug!("Node {} moved, re-evaluating next hop", self.address);
        self.reselect()
    }

    pub fn on_tick_route_eval(&mut self) -> EventOutcome {
        if self.is_exhausted() {
            return EventOutcome::Ignored;
        }
        self.reselect()
    }

    fn reselect(&mut self) -> EventOutcome {
        let next_hop = selector::select(&self.neighbors, &self.thresholds);
        let changed = next_hop != self.next_hop;
        let previous = std::mem::replace(&mut self.next_hop, next_hop);

        self.stats.route_evaluations += 1;
        if changed {
            self.stats.route_changes += 1;
        }

        match next_hop {
            Some(hop) => {
                info!(target: METRICS_TARGET, node = %self.address, next_hop = %hop, "HOP");
            }
            None if previous.is_some() => {
                warn!("Node {} lost its route: no trusted neighbor left", self.address);
            }
            None => debug!("Node {} has no trusted neighbor yet", self.address),
        }

        EventOutcome::RouteEvaluated { next_hop, changed }
    }

    pub fn address(&self) -> NodeAddress {
        self.address
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == EngineState::Exhausted
    }

    /// Result of the most recent selection
    pub fn next_hop(&self) -> Option<NodeAddress> {
        self.next_hop
    }

    pub fn energy(&self) -> &EnergyModel {
        &self.energy
    }

    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    /// Neighbors not heard from within the configured route timeout
    pub fn stale_neighbor_count(&self, now: u64) -> usize {
        self.neighbors
            .stale(now, self.config.route_timeout_ms)
            .count()
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub fn config(&self) -> &DseranConfig {
        &self.config
    }
}
