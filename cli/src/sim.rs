// Virtual-time simulator — many nodes, one process, no sockets
//
// A discrete-event loop pops the earliest pending timer, fires it on the
// owning node and reschedules it one period later. Hellos are delivered to
// every other live node within radio range of the sender's current position.
// All randomness comes from one seeded StdRng, so a run is fully reproducible.

use crate::config::Config;
use crate::report::NodeSummary;
use anyhow::{Context, Result};
use dseran_core::{DecisionEngine, DseranConfig, MobilityModel, NodeAddress, METRICS_TARGET};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Timer {
    Hello,
    Harvest,
    RouteEval,
    Move,
}

struct SimNode {
    engine: DecisionEngine,
    mobility: MobilityModel,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub duration_ms: u64,
    /// First time any node ran dry
    pub first_exhausted_ms: Option<u64>,
    pub exhausted: usize,
    pub hellos_delivered: u64,
    pub nodes: Vec<NodeSummary>,
}

pub struct Simulation {
    nodes: Vec<SimNode>,
    /// (fire time, node index, timer); ties break on index then timer
    queue: BinaryHeap<Reverse<(u64, usize, Timer)>>,
    rng: StdRng,
    engine_config: DseranConfig,
    step_interval_ms: u64,
    radio_range: f32,
    harvest: bool,
    seed: u64,
    hellos_delivered: u64,
}

impl Simulation {
    pub fn new(config: &Config) -> Result<Self> {
        let sim = &config.simulation;
        let mut rng = StdRng::seed_from_u64(sim.seed);
        let mut nodes = Vec::with_capacity(usize::from(sim.nodes));
        let mut queue = BinaryHeap::new();

        for index in 0..usize::from(sim.nodes) {
            let address = NodeAddress::new(((index + 1) as u16).to_be_bytes());
            let engine_config = DseranConfig {
                nonce_seed: Some(sim.seed ^ index as u64),
                ..config.engine.clone()
            };
            let engine = DecisionEngine::new(address, engine_config)
                .with_context(|| format!("Failed to create node {}", address))?;
            let mobility = MobilityModel::random(&config.mobility, &mut rng);

            // Stagger start times so hellos do not all collide on the first tick
            let offset = rng.gen_range(0..config.engine.hello_interval_ms);
            let after = |period: u64| offset.saturating_add(period);
            queue.push(Reverse((offset, index, Timer::Hello)));
            if sim.harvest {
                queue.push(Reverse((after(config.engine.harvest_interval_ms), index, Timer::Harvest)));
            }
            queue.push(Reverse((after(config.engine.route_eval_interval_ms), index, Timer::RouteEval)));
            queue.push(Reverse((after(config.mobility.step_interval_ms), index, Timer::Move)));

            nodes.push(SimNode { engine, mobility });
        }

        info!(
            "Simulation: {} nodes, radio range {}, seed {}",
            nodes.len(),
            sim.radio_range,
            sim.seed
        );

        Ok(Self {
            nodes,
            queue,
            rng,
            engine_config: config.engine.clone(),
            step_interval_ms: config.mobility.step_interval_ms,
            radio_range: sim.radio_range,
            harvest: sim.harvest,
            seed: sim.seed,
            hellos_delivered: 0,
        })
    }

    /// Run until `duration_ms` of virtual time has passed or every node is exhausted
    pub fn run(&mut self, duration_ms: u64) -> SimulationReport {
        while let Some(&Reverse((at, index, timer))) = self.queue.peek() {
            if at > duration_ms {
                break;
            }
            self.queue.pop();
            self.fire(at, index, timer);
        }
        self.report(duration_ms)
    }

    fn period(&self, timer: Timer) -> u64 {
        match timer {
            Timer::Hello => self.engine_config.hello_interval_ms,
            Timer::Harvest => self.engine_config.harvest_interval_ms,
            Timer::RouteEval => self.engine_config.route_eval_interval_ms,
            Timer::Move => self.step_interval_ms,
        }
    }

    fn fire(&mut self, now: u64, index: usize, timer: Timer) {
        // Exhausted nodes drop out of the schedule
        if self.nodes[index].engine.is_exhausted() {
            return;
        }

        match timer {
            Timer::Hello => {
                let mut outbox: Vec<Vec<u8>> = Vec::new();
                self.nodes[index].engine.on_tick_hello(now, &mut outbox);
                for payload in outbox {
                    self.broadcast(index, &payload, now);
                }
            }
            Timer::Harvest => {
                self.nodes[index].engine.on_tick_harvest();
            }
            Timer::RouteEval => {
                self.nodes[index].engine.on_tick_route_eval();
            }
            Timer::Move => {
                let node = &mut self.nodes[index];
                node.mobility.step(&mut self.rng);
                let position = node.mobility.position();
                info!(
                    target: METRICS_TARGET,
                    node = %node.engine.address(),
                    x = position.x,
                    y = position.y,
                    "MOVE"
                );
                node.engine.on_movement_notified();
            }
        }

        // Periods that overflow the virtual clock are not rescheduled
        if !self.nodes[index].engine.is_exhausted() {
            if let Some(next) = now.checked_add(self.period(timer)) {
                self.queue.push(Reverse((next, index, timer)));
            }
        }
    }

    /// Radio medium: hand `payload` to every live node in range of `from`
    fn broadcast(&mut self, from: usize, payload: &[u8], now: u64) {
        let origin = self.nodes[from].mobility.position();
        let sender = self.nodes[from].engine.address();
        let range = self.radio_range;

        for (index, node) in self.nodes.iter_mut().enumerate() {
            if index == from || node.engine.is_exhausted() {
                continue;
            }
            // Strictly inside the range; a range of 0 isolates every node
            if node.mobility.position().distance_to(&origin) < range {
                node.engine.on_hello_received(payload, sender, now);
                self.hellos_delivered += 1;
            } else {
                debug!("{} out of range of {}", node.engine.address(), sender);
            }
        }
    }

    pub fn report(&self, duration_ms: u64) -> SimulationReport {
        let nodes: Vec<NodeSummary> = self
            .nodes
            .iter()
            .map(|node| NodeSummary::from_engine(&node.engine, duration_ms))
            .collect();

        SimulationReport {
            seed: self.seed,
            duration_ms,
            first_exhausted_ms: nodes.iter().filter_map(|n| n.stats.lifetime_end).min(),
            exhausted: nodes.iter().filter(|n| n.exhausted).count(),
            hellos_delivered: self.hellos_delivered,
            nodes,
        }
    }

    pub fn harvesting(&self) -> bool {
        self.harvest
    }
}
