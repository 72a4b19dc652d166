//! portainer-deploy - update a Docker Swarm stack through Portainer
//!
//! This is the CLI entry point.

use anyhow::Context;
use clap::Parser;
use portainer_deploy::config::{Config, ConfigArgs};
use portainer_deploy::deploy::StackUpdater;
use portainer_deploy::workflow::Workflow;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Update a Portainer swarm stack
#[derive(Parser)]
#[command(name = "portainer-deploy")]
#[command(version)]
#[command(about = "Update a Docker Swarm stack through the Portainer API", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let workflow = Workflow::from_env();

    match run(cli.config, workflow.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            workflow.set_failed(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ConfigArgs, workflow: Workflow) -> anyhow::Result<()> {
    let config = Config::load(args).context("Failed to load configuration")?;
    debug!("Parsed config: {:?}", config);

    let mut updater = StackUpdater::new(config, workflow.clone())?;

    let stack_id = updater.run().await.publish(&workflow)?;
    info!("Stack {} updated", stack_id);

    Ok(())
}
