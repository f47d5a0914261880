//! CHAMELEON CLI - boots and inspects the moving-target defense gateway

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chameleon_core::{Chameleon, ChameleonConfig};
use chameleon_mutator::{ArtifactPublisher, StatePaths};

#[derive(Parser)]
#[command(name = "chameleon")]
#[command(about = "CHAMELEON - Moving-Target Defense Gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start the gateway, backend nodes, and the mutation engine
    Start {
        /// Configuration file path
        #[arg(short, long, default_value = "config/chameleon.toml")]
        config: String,
    },
    /// Check configuration validity
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/chameleon.toml")]
        config: String,
    },
    /// Show the currently published mutation state
    Status {
        /// Configuration file path
        #[arg(short, long, default_value = "config/chameleon.toml")]
        config: String,
    },
}

/// Loads the config file, falling back to defaults if it is absent.
fn load_config(path: &str) -> anyhow::Result<ChameleonConfig> {
    if Path::new(path).exists() {
        Ok(ChameleonConfig::load_file(path)?)
    } else {
        tracing::info!(path, "no config file, using defaults");
        Ok(ChameleonConfig::default())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Some(Commands::Start { config }) => {
            let config = load_config(&config)?;
            let engine = Chameleon::new(config).context("invalid configuration")?;
            engine.start().await.context("engine exited")?;
        }
        Some(Commands::Check { config }) => {
            let loaded = ChameleonConfig::load_file(&config)?;
            loaded.validate().context("configuration is invalid")?;
            println!(
                "OK: {} nodes, {} routes, {}s mutation interval",
                loaded.nodes.len(),
                loaded.routes.len(),
                loaded.scheduler.interval_secs
            );
        }
        Some(Commands::Status { config }) => {
            let loaded = load_config(&config)?;
            let publisher = ArtifactPublisher::new(StatePaths::in_dir(&loaded.state.dir));
            match publisher.load_mapping() {
                Ok(mapping) => {
                    println!("cycle {}", mapping.cycle_id);
                    for (canonical, route) in &mapping.routes {
                        println!("  {canonical} -> {}", route.public_path);
                    }
                }
                Err(_) => println!("no published mutation state (engine not running?)"),
            }
        }
        None => {
            println!("CHAMELEON v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}
