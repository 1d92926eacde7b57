//! Node energy budget
//!
//! Sending a hello costs one unit; a harvest tick refunds `harvest_step`
//! units up to the battery ceiling. A node at zero is exhausted and leaves
//! the network.

use crate::config::DseranConfig;

/// Residual and harvested energy of this node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyModel {
    residual: u16,
    harvested_total: u32,
    max_energy: u16,
    harvest_step: u16,
}

impl EnergyModel {
    /// Create an energy model at the configured boot level
    pub fn new(config: &DseranConfig) -> Self {
        Self::with_residual(config.initial_energy, config.max_energy, config.harvest_step)
    }

    /// Create an energy model at an arbitrary level (clamped to `max_energy`)
    pub fn with_residual(residual: u16, max_energy: u16, harvest_step: u16) -> Self {
        Self {
            residual: residual.min(max_energy),
            harvested_total: 0,
            max_energy,
            harvest_step,
        }
    }

    /// Pay for one hello. Saturates at zero; returns the new residual.
    pub fn consume_for_send(&mut self) -> u16 {
        self.residual = self.residual.saturating_sub(1);
        self.residual
    }

    /// Add one harvest step.
    ///
    /// The residual is capped at the battery ceiling but the harvested total
    /// always records the full step, so it can outgrow what was actually stored.
    pub fn harvest(&mut self) {
        self.harvested_total = self
            .harvested_total
            .saturating_add(u32::from(self.harvest_step));
        self.residual = self
            .residual
            .saturating_add(self.harvest_step)
            .min(self.max_energy);
    }

    pub fn is_exhausted(&self) -> bool {
        self.residual == 0
    }

    pub fn residual(&self) -> u16 {
        self.residual
    }

    pub fn harvested_total(&self) -> u32 {
        self.harvested_total
    }

    pub fn max_energy(&self) -> u16 {
        self.max_energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_initial_energy() {
        let energy = EnergyModel::new(&DseranConfig::default());
        assert_eq!(energy.residual(), 100);
        assert_eq!(energy.harvested_total(), 0);
        assert!(!energy.is_exhausted());
    }

    #[test]
    fn test_consume_decrements_by_one() {
        let mut energy = EnergyModel::with_residual(50, 100, 2);
        assert_eq!(energy.consume_for_send(), 49);
        assert_eq!(energy.residual(), 49);
    }

    #[test]
    fn test_consume_floors_at_zero() {
        let mut energy = EnergyModel::with_residual(1, 100, 2);

        assert_eq!(energy.consume_for_send(), 0);
        assert!(energy.is_exhausted());

        // No wraparound
        assert_eq!(energy.consume_for_send(), 0);
        assert_eq!(energy.consume_for_send(), 0);
        assert_eq!(energy.residual(), 0);
    }

    #[test]
    fn test_harvest_clamps_at_ceiling() {
        let mut energy = EnergyModel::with_residual(99, 100, 2);
        energy.harvest();

        assert_eq!(energy.residual(), 100);
        // Full step recorded even though only 1 unit was stored
        assert_eq!(energy.harvested_total(), 2);
    }

    #[test]
    fn test_harvest_accumulates() {
        let mut energy = EnergyModel::with_residual(10, 100, 2);
        for _ in 0..5 {
            energy.harvest();
        }
        assert_eq!(energy.residual(), 20);
        assert_eq!(energy.harvested_total(), 10);
    }

    #[test]
    fn test_harvest_revives_exhausted_counter() {
        let mut energy = EnergyModel::with_residual(0, 100, 2);
        assert!(energy.is_exhausted());
        energy.harvest();
        assert_eq!(energy.residual(), 2);
    }

    #[test]
    fn test_with_residual_clamps_to_max() {
        let energy = EnergyModel::with_residual(500, 100, 2);
        assert_eq!(energy.residual(), 100);
        assert_eq!(energy.max_energy(), 100);
    }
}
