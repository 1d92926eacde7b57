// Per-node summaries printed by `run` and `simulate`

use colored::*;
use dseran_core::{DecisionEngine, EngineState, NodeStats};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub address: String,
    pub exhausted: bool,
    pub residual_energy: u16,
    pub harvested_total: u32,
    pub neighbors: usize,
    /// Neighbors not heard from within the route timeout
    pub stale_neighbors: usize,
    /// Share of received hellos that decoded
    pub hello_acceptance: f64,
    pub next_hop: Option<String>,
    pub stats: NodeStats,
}

impl NodeSummary {
    /// Snapshot of `engine` as of host time `now` (ms)
    pub fn from_engine(engine: &DecisionEngine, now: u64) -> Self {
        Self {
            address: engine.address().to_string(),
            exhausted: engine.state() == EngineState::Exhausted,
            residual_energy: engine.energy().residual(),
            harvested_total: engine.energy().harvested_total(),
            neighbors: engine.neighbors().len(),
            stale_neighbors: engine.stale_neighbor_count(now),
            hello_acceptance: engine.stats().hello_acceptance_ratio(),
            next_hop: engine.next_hop().map(|hop| hop.to_string()),
            stats: engine.stats().clone(),
        }
    }
}

fn format_lifetime(lifetime_end: Option<u64>) -> String {
    match lifetime_end {
        Some(ms) => format!("{:.1}s", ms as f64 / 1000.0),
        None => "alive".to_string(),
    }
}

pub fn print_table(nodes: &[NodeSummary]) {
    println!(
        "  {:<7} {:>9} {:>7} {:>9} {:>6} {:>6} {:>7} {:>10} {:>7} {:>8}",
        "node".bold(),
        "lifetime".bold(),
        "energy".bold(),
        "harvested".bold(),
        "sent".bold(),
        "recv".bold(),
        "changes".bold(),
        "neighbors".bold(),
        "accept".bold(),
        "next hop".bold(),
    );

    for node in nodes {
        let lifetime = format_lifetime(node.stats.lifetime_end);
        let lifetime = if node.exhausted {
            lifetime.bright_red()
        } else {
            lifetime.green()
        };
        let next_hop = match &node.next_hop {
            Some(hop) => hop.bright_cyan(),
            None => "-".dimmed(),
        };

        println!(
            "  {:<7} {:>9} {:>7} {:>9} {:>6} {:>6} {:>7} {:>10} {:>7} {:>8}",
            node.address,
            lifetime,
            node.residual_energy,
            node.harvested_total,
            node.stats.hellos_sent,
            node.stats.hellos_received,
            node.stats.route_changes,
            format!("{} ({} stale)", node.neighbors, node.stale_neighbors),
            format!("{:.0}%", node.hello_acceptance * 100.0),
            next_hop,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dseran_core::hello::encode_hello;
    use dseran_core::{DseranConfig, NodeAddress};

    #[test]
    fn test_summary_from_engine() {
        let mut engine = DecisionEngine::new(NodeAddress::new([0, 1]), DseranConfig::default()).unwrap();
        engine.on_hello_received(&encode_hello(80, 1.0, 0), NodeAddress::new([0, 2]), 0);
        engine.on_hello_received(&encode_hello(60, 1.0, 0), NodeAddress::new([0, 3]), 20_000);
        engine.on_hello_received(&[1, 2], NodeAddress::new([0, 4]), 20_000);
        engine.on_tick_route_eval();

        // 00:02 was last heard 40 s ago, past the 30 s route timeout
        let summary = NodeSummary::from_engine(&engine, 40_000);
        assert_eq!(summary.address, "00:01");
        assert!(!summary.exhausted);
        assert_eq!(summary.residual_energy, 100);
        assert_eq!(summary.neighbors, 2);
        assert_eq!(summary.stale_neighbors, 1);
        assert!((summary.hello_acceptance - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.next_hop.as_deref(), Some("00:02"));
        assert_eq!(summary.stats.hellos_received, 2);
    }

    #[test]
    fn test_format_lifetime() {
        assert_eq!(format_lifetime(None), "alive");
        assert_eq!(format_lifetime(Some(990_000)), "990.0s");
    }
}
