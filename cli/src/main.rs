// dseran — D-SERAN node host and simulator
//
// `run` drives one node over UDP broadcast, `simulate` runs many nodes in
// virtual time, `config` inspects the JSON configuration.

mod config;
mod node;
mod report;
mod sim;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use config::Config;
use dseran_core::NodeAddress;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dseran")]
#[command(about = "D-SERAN — energy and trust aware next-hop selection for ad hoc networks", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/dseran/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a node over UDP broadcast
    Run {
        /// Node address as aa:bb (default: last two octets of the local IP)
        #[arg(short, long)]
        address: Option<NodeAddress>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Simulate a network of nodes in virtual time
    Simulate {
        #[arg(short, long)]
        nodes: Option<u16>,
        /// Simulated seconds
        #[arg(short, long)]
        duration: Option<u64>,
        #[arg(short, long)]
        seed: Option<u64>,
        /// Disable energy harvesting
        #[arg(long)]
        no_harvest: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show effective configuration
    Show {
        /// Print the full JSON document
        #[arg(long)]
        json: bool,
    },
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Run { address, port } => cmd_run(cli.config, address, port).await,
        Commands::Simulate {
            nodes,
            duration,
            seed,
            no_harvest,
            json,
        } => cmd_simulate(cli.config, nodes, duration, seed, no_harvest, json),
        Commands::Config { action } => cmd_config(cli.config, action),
    }
}

async fn cmd_run(config_path: Option<PathBuf>, address: Option<NodeAddress>, port: Option<u16>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;

    println!("{}", "D-SERAN — Starting node...".bold());
    println!(
        "  {} Hello every {}ms, harvest every {}ms",
        "✓".green(),
        config.engine.hello_interval_ms,
        config.engine.harvest_interval_ms
    );
    println!("  Press {} to stop", "Ctrl+C".bright_cyan());
    println!();

    let summary = node::run(&config, address, port).await?;

    println!();
    println!("{}", "Node Summary".bold());
    report::print_table(std::slice::from_ref(&summary));
    Ok(())
}

fn cmd_simulate(
    config_path: Option<PathBuf>,
    nodes: Option<u16>,
    duration: Option<u64>,
    seed: Option<u64>,
    no_harvest: bool,
    json: bool,
) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(nodes) = nodes {
        config.simulation.nodes = nodes;
    }
    if let Some(duration) = duration {
        config.simulation.duration_secs = duration;
    }
    if let Some(seed) = seed {
        config.simulation.seed = seed;
    }
    if no_harvest {
        config.simulation.harvest = false;
    }
    config.validate()?;

    let duration_ms = config.simulation.duration_secs.saturating_mul(1000);
    let mut simulation = sim::Simulation::new(&config)?;
    let result = simulation.run(duration_ms);

    if json {
        let out = serde_json::to_string_pretty(&result).context("Failed to serialize report")?;
        println!("{}", out);
        return Ok(());
    }

    println!(
        "{} ({} nodes, {}s, seed {}, harvesting {})",
        "Simulation Report".bold(),
        result.nodes.len(),
        config.simulation.duration_secs,
        result.seed,
        if simulation.harvesting() { "on" } else { "off" }
    );
    report::print_table(&result.nodes);
    println!();
    println!("  Hellos delivered: {}", result.hellos_delivered);
    match result.first_exhausted_ms {
        Some(ms) => println!(
            "  Network lifetime: {} ({} of {} nodes exhausted)",
            format!("{:.1}s", ms as f64 / 1000.0).bright_red(),
            result.exhausted,
            result.nodes.len()
        ),
        None => println!("  Network lifetime: {}", "all nodes alive".green()),
    }
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => Config::config_file()?,
    };

    match action {
        ConfigAction::Show { json } => {
            let config = Config::load(Some(&path))?;
            if json {
                let out = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
                println!("{}", out);
                return Ok(());
            }

            println!("{}", "Configuration".bold());
            println!("  {}", path.display().to_string().dimmed());
            println!();
            for (key, value) in config.list() {
                println!("  {} = {}", key.bright_cyan(), value);
            }
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                println!(
                    "{} Config already exists at {} (use --force to overwrite)",
                    "⚠️".yellow(),
                    path.display()
                );
                return Ok(());
            }
            Config::default().save(&path)?;
            println!("{} Wrote default config to {}", "✓".green(), path.display());
        }
    }
    Ok(())
}
