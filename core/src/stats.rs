//! Per-node counters
//!
//! The same quantities the simulation log analysis extracts (hellos sent and
//! received, route hops, lifetime), kept as plain counters so hosts can report
//! them without scraping logs.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub hellos_sent: u64,
    pub hellos_received: u64,
    /// Hellos dropped for being too short to decode
    pub hellos_malformed: u64,
    /// Hellos from new neighbors that did not fit in the table
    pub neighbors_rejected: u64,
    pub harvest_ticks: u64,
    /// Selector runs (movement notifications + route-eval ticks)
    pub route_evaluations: u64,
    /// Selector runs whose result differed from the previous next hop
    pub route_changes: u64,
    /// Host clock (ms) at which the node ran out of energy
    pub lifetime_end: Option<u64>,
}

impl NodeStats {
    /// Fraction of received hellos that were usable
    pub fn hello_acceptance_ratio(&self) -> f64 {
        let total = self.hellos_received + self.hellos_malformed;
        if total == 0 {
            return 1.0;
        }
        self.hellos_received as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stats_zeroed() {
        let stats = NodeStats::default();
        assert_eq!(stats.hellos_sent, 0);
        assert_eq!(stats.lifetime_end, None);
        assert_eq!(stats.hello_acceptance_ratio(), 1.0);
    }

    #[test]
    fn test_acceptance_ratio() {
        let stats = NodeStats {
            hellos_received: 3,
            hellos_malformed: 1,
            ..Default::default()
        };
        assert_eq!(stats.hello_acceptance_ratio(), 0.75);
    }
}
