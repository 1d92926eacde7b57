// Configuration management for the D-SERAN host
//
// Stored as JSON in:
// - macOS: ~/Library/Application Support/dseran/config.json
// - Linux: ~/.config/dseran/config.json
// - Windows: %APPDATA%\dseran\config.json

use anyhow::{Context, Result};
use dseran_core::{DseranConfig, MobilityConfig, MAX_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decision engine tunables (thresholds, energy, intervals)
    pub engine: DseranConfig,

    /// Mobility model used by both hosts
    pub mobility: MobilityConfig,

    /// UDP host settings
    pub network: NetworkConfig,

    /// Virtual-time simulator settings
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// UDP port hellos are sent to and received on
    pub port: u16,

    /// Local address to bind
    pub bind_address: IpAddr,

    /// Destination of hello broadcasts
    pub broadcast_address: IpAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of nodes
    pub nodes: u16,

    /// Hellos reach every node within this distance (area units)
    pub radio_range: f32,

    /// Simulated time (seconds)
    pub duration_secs: u64,

    /// Seed for placement, mobility and nonces
    pub seed: u64,

    /// Run harvest ticks; disable to measure raw battery lifetime
    pub harvest: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: 1234,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            broadcast_address: IpAddr::V4(Ipv4Addr::BROADCAST),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nodes: 10,
            radio_range: 40.0,
            duration_secs: 3_600,
            seed: 1,
            harvest: true,
        }
    }
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("dseran");

        std::fs::create_dir_all(&config_dir)
            .context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the default config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load from `path`, or from the default location when None.
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_file = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file()?,
        };

        let config = if config_file.exists() {
            let contents = std::fs::read_to_string(&config_file)
                .with_context(|| format!("Failed to read config file {}", config_file.display()))?;
            serde_json::from_str::<Config>(&contents)
                .with_context(|| format!("Failed to parse config file {}", config_file.display()))?
        } else {
            let config = Config::default();
            config.save(&config_file)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate().context("Invalid engine config")?;

        if self.mobility.step_interval_ms == 0 || self.mobility.step_interval_ms > MAX_INTERVAL_MS {
            anyhow::bail!(
                "Invalid mobility config: step_interval_ms must be 1-{}, got {}",
                MAX_INTERVAL_MS,
                self.mobility.step_interval_ms
            );
        }
        if !self.mobility.area.is_finite() || self.mobility.area <= 0.0 {
            anyhow::bail!("Invalid mobility config: area must be > 0, got {}", self.mobility.area);
        }
        if self.simulation.nodes == 0 || self.simulation.nodes == u16::MAX {
            anyhow::bail!("Invalid simulation config: nodes must be 1-{}", u16::MAX - 1);
        }
        if !self.simulation.radio_range.is_finite() || self.simulation.radio_range < 0.0 {
            anyhow::bail!(
                "Invalid simulation config: radio_range must be >= 0, got {}",
                self.simulation.radio_range
            );
        }
        Ok(())
    }

    /// List the most commonly tuned values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            ("engine.max_neighbors".to_string(), self.engine.max_neighbors.to_string()),
            ("engine.initial_energy".to_string(), self.engine.initial_energy.to_string()),
            ("engine.harvest_step".to_string(), self.engine.harvest_step.to_string()),
            ("engine.energy_threshold".to_string(), self.engine.energy_threshold.to_string()),
            ("engine.trust_threshold".to_string(), self.engine.trust_threshold.to_string()),
            ("engine.trust_source".to_string(), format!("{:?}", self.engine.trust_source)),
            ("engine.hello_interval".to_string(), format!("{}ms", self.engine.hello_interval_ms)),
            ("engine.harvest_interval".to_string(), format!("{}ms", self.engine.harvest_interval_ms)),
            ("network.port".to_string(), self.network.port.to_string()),
            ("network.broadcast_address".to_string(), self.network.broadcast_address.to_string()),
            ("simulation.nodes".to_string(), self.simulation.nodes.to_string()),
            ("simulation.radio_range".to_string(), self.simulation.radio_range.to_string()),
        ]
    }
}
