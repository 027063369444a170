use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;

use tracehop_config::NodeConfig;
use tracehop_engine::run_node;
use tracehop_telemetry::{MetricsRecorder, NodeLogger};

#[derive(Parser, Debug)]
#[command(name = "tracehop", version, about)]
pub struct Cli {
    /// YAML configuration file; defaults to config/tracehop.yaml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve requests (the default)
    Serve,
    /// Print the effective configuration as YAML and exit
    Config,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<NodeConfig> {
    match path {
        Some(path) => NodeConfig::load_from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => NodeConfig::load().context("loading configuration"),
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

async fn serve(config: NodeConfig) -> anyhow::Result<()> {
    NodeLogger::init(&config.telemetry)
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing log subscriber")?;
    NodeLogger::log_startup(&config.server);

    let metrics = MetricsRecorder::new().context("registering metrics")?;
    run_node(config, metrics).await.map_err(|e| {
        error!(error = %e, "Node stopped with an error");
        anyhow::Error::from(e)
    })
}
