//! ## tracehop-cli
//! **Synthetic service node for tracing and load-testing topologies**
//!
//! Each node sleeps, maybe fails, then calls its configured peers with the
//! caller's trace context. Chain a few of them to get a realistic-looking
//! distributed trace.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
