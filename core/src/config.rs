//! Per-node engine configuration
//!
//! Every constant the decision logic depends on lives here so that several
//! nodes with different tunings can run side by side in one process. The
//! defaults are the deployed protocol values.

use crate::routing::SelectionThresholds;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors raised by [`DseranConfig::validate`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid neighbor capacity: must be at least 1")]
    ZeroCapacity,

    #[error("Invalid max energy: must be at least 1")]
    ZeroMaxEnergy,

    #[error("Invalid initial energy: must be 1-{max}, got {initial}")]
    InvalidInitialEnergy { initial: u16, max: u16 },

    #[error("Invalid energy threshold: must be below max energy {max}, got {threshold}")]
    InvalidEnergyThreshold { threshold: u16, max: u16 },

    #[error("Invalid {field}: must be a finite value in [0.0, 1.0], got {value}")]
    InvalidTrustValue { field: &'static str, value: f32 },

    #[error("Invalid {0}: interval must be > 0")]
    ZeroInterval(&'static str),

    #[error("Invalid {field}: interval must be at most {max} ms, got {value}")]
    IntervalTooLong {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

/// Longest accepted timer period or route timeout (one day, in ms)
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

// ============================================================================
// ENUMS
// ============================================================================

/// Where a neighbor's stored trust comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrustSource {
    /// Overwrite with the trust the neighbor advertises, then reinforce.
    ///
    /// The deployed protocol behaves this way: since every encoder advertises 1.0, a
    /// neighbor's trust is effectively pinned at 1.0.
    #[default]
    SenderReported,

    /// Ignore the advertised value. New neighbors start at `initial_trust`
    /// and only the local reinforcement moves it afterwards.
    Local,
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Tunables injected into every [`crate::DecisionEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DseranConfig {
    /// Neighbor table capacity
    pub max_neighbors: usize,

    /// Battery ceiling (mJ)
    pub max_energy: u16,

    /// Residual energy at boot (mJ)
    pub initial_energy: u16,

    /// Energy added per harvest tick (mJ)
    pub harvest_step: u16,

    /// Neighbors must report strictly more energy than this to be selected
    pub energy_threshold: u16,

    /// Neighbors must hold strictly more trust than this to be selected
    pub trust_threshold: f32,

    /// Trust this node advertises about itself in every hello
    pub self_trust: f32,

    /// Added to a neighbor's trust on every processed hello
    pub trust_reinforcement: f32,

    /// Starting trust for new neighbors under [`TrustSource::Local`]
    pub initial_trust: f32,

    /// How received trust values are treated
    pub trust_source: TrustSource,

    /// Hello broadcast period (milliseconds)
    pub hello_interval_ms: u64,

    /// Harvest period (milliseconds)
    pub harvest_interval_ms: u64,

    /// Scheduled next-hop re-evaluation period (milliseconds)
    pub route_eval_interval_ms: u64,

    /// A neighbor not heard from for this long is reported as stale (milliseconds)
    pub route_timeout_ms: u64,

    /// Seed for the hello nonce generator; None seeds from entropy
    pub nonce_seed: Option<u64>,
}

impl DseranConfig {
    /// Validate config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_neighbors == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        if self.max_energy == 0 {
            return Err(ConfigError::ZeroMaxEnergy);
        }

        // A node booting with no energy would be exhausted before its first hello
        if self.initial_energy == 0 || self.initial_energy > self.max_energy {
            return Err(ConfigError::InvalidInitialEnergy {
                initial: self.initial_energy,
                max: self.max_energy,
            });
        }

        if self.energy_threshold >= self.max_energy {
            return Err(ConfigError::InvalidEnergyThreshold {
                threshold: self.energy_threshold,
                max: self.max_energy,
            });
        }

        for (field, value) in [
            ("trust_threshold", self.trust_threshold),
            ("self_trust", self.self_trust),
            ("trust_reinforcement", self.trust_reinforcement),
            ("initial_trust", self.initial_trust),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidTrustValue { field, value });
            }
        }

        for (field, value) in [
            ("hello_interval_ms", self.hello_interval_ms),
            ("harvest_interval_ms", self.harvest_interval_ms),
            ("route_eval_interval_ms", self.route_eval_interval_ms),
            ("route_timeout_ms", self.route_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval(field));
            }
            if value > MAX_INTERVAL_MS {
                return Err(ConfigError::IntervalTooLong {
                    field,
                    value,
                    max: MAX_INTERVAL_MS,
                });
            }
        }

        Ok(())
    }

    /// Admission thresholds for the next-hop selector
    pub fn thresholds(&self) -> SelectionThresholds {
        SelectionThresholds {
            trust: self.trust_threshold,
            energy: self.energy_threshold,
        }
    }
}

impl Default for DseranConfig {
    fn default() -> Self {
        Self {
            max_neighbors: 16,
            max_energy: 100,
            initial_energy: 100,
            harvest_step: 2,
            energy_threshold: 10,
            trust_threshold: 0.5,
            self_trust: 1.0,
            trust_reinforcement: 0.01,
            initial_trust: 0.7,
            trust_source: TrustSource::SenderReported,
            hello_interval_ms: 10_000,
            harvest_interval_ms: 5_000,
            route_eval_interval_ms: 10_000,
            route_timeout_ms: 30_000,
            nonce_seed: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
